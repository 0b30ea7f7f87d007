use std::sync::Mutex;

use cicd_pipes::exec::OutputSink;
use tracing::Level;

/// One line captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLine {
    pub context: String,
    pub level: Level,
    pub text: String,
}

/// Output sink that keeps every forwarded line in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<RecordedLine>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<RecordedLine> {
        self.lines.lock().unwrap().clone()
    }

    /// Texts of the lines recorded at `level`, in arrival order.
    pub fn texts_at(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.level == level)
            .map(|l| l.text.clone())
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn line(&self, context: &str, level: Level, line: &str) {
        self.lines.lock().unwrap().push(RecordedLine {
            context: context.to_string(),
            level,
            text: line.to_string(),
        });
    }
}
