//! Diagnostic sink shared by every phase of a run.
//!
//! Static errors (lex, parse, resolve) and runtime faults are written to the
//! same sink but raise two independent sticky flags; the driver reads them to
//! decide whether to keep going and which exit code to use.

use std::io::{self, Write};

use log::{debug, warn};

use crate::error::{LoxError, RuntimeError};

pub struct Diagnostics {
    sink: Box<dyn Write>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    /// Diagnostics written to standard error.
    pub fn new() -> Self {
        Self::with_sink(Box::new(io::stderr()))
    }

    pub fn with_sink(sink: Box<dyn Write>) -> Self {
        Self {
            sink,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Report a static error at `line`.  `location` is either empty or a
    /// fragment such as `" at 'foo'"`.
    pub fn report(&mut self, line: usize, location: &str, message: &str) {
        debug!("Reporting error: line={}, msg={}", line, message);

        self.had_error = true;
        self.emit(format_args!("[line {}] Error{}: {}", line, location, message));
    }

    /// Route any [`LoxError`] to the right flag.
    pub fn error(&mut self, error: &LoxError) {
        match error {
            LoxError::Lex { message, line } => self.report(*line, "", message),

            LoxError::Parse {
                message,
                line,
                location,
            }
            | LoxError::Resolve {
                message,
                line,
                location,
            } => self.report(*line, location, message),

            LoxError::Runtime(e) => self.runtime_error(e),
        }
    }

    pub fn runtime_error(&mut self, error: &RuntimeError) {
        debug!("Reporting runtime error: {}", error.message);

        self.had_runtime_error = true;
        self.emit(format_args!("{}", error));
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clear both flags (the REPL does this between lines).
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    fn emit(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.sink, "{}", args) {
            warn!("Failed to write diagnostic: {}", e);
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
