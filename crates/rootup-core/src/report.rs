use std::cell::RefCell;

/// Sink for human-readable progress messages.
pub trait Reporter {
    fn log(&self, message: &str);

    /// Verbose detail, optionally prefixed with the target label.
    fn labeled_verbose(&self, label: Option<&str>, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn log(&self, _message: &str) {}

    fn labeled_verbose(&self, _label: Option<&str>, _message: &str) {}
}

/// Keeps every message in memory, rendered as a single line each.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|line| line.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn log(&self, message: &str) {
        self.lines.borrow_mut().push(message.to_string());
    }

    fn labeled_verbose(&self, label: Option<&str>, message: &str) {
        let line = match label {
            Some(label) => format!("[{label}] {message}"),
            None => message.to_string(),
        };
        self.lines.borrow_mut().push(line);
    }
}
