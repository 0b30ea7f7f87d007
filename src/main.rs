// src/main.rs

use tracing::error;

use cicd_pipes::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("update-docker-hub-readme error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        error!(context = err.log_context(), "{}", err);
        std::process::exit(1);
    }
}
