//! User-facing output for the command runners.
//!
//! Informational lines go to stdout, warnings and errors to stderr with
//! fixed prefixes; debug output goes through the `log` facade so that
//! `--log-level`/`RUST_LOG` control it.

use std::fmt::Display;

#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    terminal: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            terminal: terminal_size::terminal_size().is_some(),
        }
    }

    /// Whether stdout is a terminal. Progress chatter is suppressed when it
    /// is not, so scripted callers see only results.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn info(&self, message: impl Display) {
        println!("INFO: {}", message);
    }

    pub fn warn(&self, message: impl Display) {
        eprintln!("WARN: {}", message);
    }

    pub fn error(&self, message: impl Display) {
        eprintln!("ERROR: {}", message);
    }

    pub fn debug(&self, message: impl Display) {
        log::debug!("{}", message);
    }
}
