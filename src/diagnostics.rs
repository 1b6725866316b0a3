//! Diagnostic sink passed into discovery
//!
//! Parsers report skipped entries and malformed fields here instead of
//! writing to a global logger, so tests can inspect what was reported.

use std::cell::RefCell;

use log::Level;

pub trait Diagnostics {
    fn emit(&self, level: Level, message: &str);

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }
}

/// Forwards to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn emit(&self, level: Level, message: &str) {
        log::log!(level, "{}", message);
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    records: RefCell<Vec<(Level, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.borrow().clone()
    }

    /// Messages emitted at exactly `level`
    pub fn at(&self, level: Level) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, level: Level, message: &str) {
        self.records.borrow_mut().push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_by_level() {
        let sink = RecordingDiagnostics::new();
        sink.error("boom");
        sink.warn("careful");
        sink.debug("details");
        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.at(Level::Error), vec!["boom"]);
        assert!(sink.at(Level::Info).is_empty());
    }
}
