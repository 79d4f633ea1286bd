//! Centralized logger for game events
//!
//! Lives inside the game state so replays and clones carry their own log.
//! Output can go to stdout, an in-memory buffer (for tests), or both.

use serde::{Deserialize, Serialize};

/// Verbosity level for game output
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
)]
pub enum VerbosityLevel {
    /// Silent - no output during game
    Silent = 0,
    /// Minimal - only game outcome
    Minimal = 1,
    /// Normal - turns, seasons, and key actions (default)
    #[default]
    Normal = 2,
    /// Verbose - all actions and state changes
    Verbose = 3,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// A log entry with owned strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
}

/// Game event logger with verbosity filtering and optional capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    entries: Vec<LogEntry>,
}

impl GameLogger {
    pub fn new() -> Self {
        GameLogger {
            verbosity: VerbosityLevel::Normal,
            output_mode: OutputMode::Stdout,
            entries: Vec::new(),
        }
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            output_mode: OutputMode::Stdout,
            entries: Vec::new(),
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    /// Log a message at the given level
    pub fn log(&mut self, level: VerbosityLevel, message: &str) {
        if level > self.verbosity {
            return;
        }
        match self.output_mode {
            OutputMode::Stdout => println!("{message}"),
            OutputMode::Memory => self.entries.push(LogEntry {
                level,
                message: message.to_string(),
            }),
            OutputMode::Both => {
                println!("{message}");
                self.entries.push(LogEntry {
                    level,
                    message: message.to_string(),
                });
            }
        }
    }

    pub fn log_minimal(&mut self, message: &str) {
        self.log(VerbosityLevel::Minimal, message);
    }

    pub fn log_normal(&mut self, message: &str) {
        self.log(VerbosityLevel::Normal, message);
    }

    pub fn log_verbose(&mut self, message: &str) {
        self.log(VerbosityLevel::Verbose, message);
    }

    /// Captured entries (Memory/Both modes)
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Conditional logging that avoids allocation when the feature is disabled
///
/// With `verbose-logging` off this is a no-op at compile time, eliminating
/// the format! allocations on the hot search path.
#[macro_export]
macro_rules! log_if_verbose {
    ($state:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $state.logger.log_verbose(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$state; // Suppress unused variable warning
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_capture_respects_verbosity() {
        let mut logger = GameLogger::with_verbosity(VerbosityLevel::Normal);
        logger.set_output_mode(OutputMode::Memory);

        logger.log_normal("kept");
        logger.log_verbose("dropped");

        assert_eq!(logger.entries().len(), 1);
        assert_eq!(logger.entries()[0].message, "kept");
    }
}
