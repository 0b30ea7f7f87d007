pub use cicd_pipes_test_utils::{builders, init_tracing, with_timeout};
