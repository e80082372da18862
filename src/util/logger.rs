//! Injected logging for documents, readers and writers.
//!
//! A [`Logger`] travels with a [`Document`](crate::document::Document)
//! configuration and is handed to the reader, writer and transforms.
//! The default [`TracingLogger`] forwards to `tracing`.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Message verbosity, ordered from quietest to loudest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    Silent,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
}

impl Verbosity {
    /// Short label used in formatted output.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Silent => "SILENT",
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sink for diagnostics emitted by the core.
pub trait Logger: Send + Sync {
    /// Current verbosity; messages louder than this are dropped.
    fn verbosity(&self) -> Verbosity;

    /// Record one message that already passed the verbosity check.
    fn log(&self, level: Verbosity, message: &str);

    fn debug(&self, message: &str) {
        if self.verbosity() >= Verbosity::Debug {
            self.log(Verbosity::Debug, message);
        }
    }

    fn info(&self, message: &str) {
        if self.verbosity() >= Verbosity::Info {
            self.log(Verbosity::Info, message);
        }
    }

    fn warn(&self, message: &str) {
        if self.verbosity() >= Verbosity::Warn {
            self.log(Verbosity::Warn, message);
        }
    }

    fn error(&self, message: &str) {
        if self.verbosity() >= Verbosity::Error {
            self.log(Verbosity::Error, message);
        }
    }
}

/// Shared logger handle.
pub type SharedLogger = Arc<dyn Logger>;

/// Logger forwarding to the `tracing` macros.
#[derive(Clone, Debug, Default)]
pub struct TracingLogger {
    verbosity: Verbosity,
}

impl TracingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Wrap in a shared handle.
    pub fn shared(verbosity: Verbosity) -> SharedLogger {
        Arc::new(Self::new(verbosity))
    }
}

impl Logger for TracingLogger {
    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn log(&self, level: Verbosity, message: &str) {
        match level {
            Verbosity::Silent => {}
            Verbosity::Error => tracing::error!(target: "gltf_graph", "{message}"),
            Verbosity::Warn => tracing::warn!(target: "gltf_graph", "{message}"),
            Verbosity::Info => tracing::info!(target: "gltf_graph", "{message}"),
            Verbosity::Debug => tracing::debug!(target: "gltf_graph", "{message}"),
        }
    }
}

/// Logger that keeps every message in memory.
///
/// Useful for asserting on warnings in tests and for front ends that
/// want to present diagnostics after an operation completes.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    verbosity: Verbosity,
    lines: Mutex<Vec<(Verbosity, String)>>,
}

impl MemoryLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of recorded messages.
    pub fn lines(&self) -> Vec<(Verbosity, String)> {
        self.lines.lock().clone()
    }

    /// Messages recorded at exactly `level`.
    pub fn messages(&self, level: Verbosity) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn log(&self, level: Verbosity, message: &str) {
        self.lines.lock().push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_filter() {
        let logger = MemoryLogger::new(Verbosity::Warn);
        logger.debug("hidden");
        logger.info("hidden");
        logger.warn("shown");
        logger.error("also shown");

        let lines = logger.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (Verbosity::Warn, "shown".to_string()));
        assert_eq!(logger.messages(Verbosity::Error), vec!["also shown".to_string()]);
    }

    #[test]
    fn test_silent() {
        let logger = MemoryLogger::new(Verbosity::Silent);
        logger.error("nothing");
        assert!(logger.lines().is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        let logger = Arc::new(MemoryLogger::new(Verbosity::Info));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let logger = logger.clone();
                std::thread::spawn(move || logger.info(&format!("worker {i}")))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(logger.messages(Verbosity::Info).len(), 4);
    }
}
