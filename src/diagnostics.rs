//! Error sink shared by every pass.
//!
//! Reporting never aborts the pass that reports; the driver polls
//! [`Diagnostics::had_error`] / [`Diagnostics::had_runtime_error`] between
//! passes and drains the collected errors for display.

use log::debug;

use crate::error::{LoxError, RuntimeError};
use crate::token::Token;

#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_error<S: Into<String>>(&mut self, line: usize, column: usize, message: S) {
        self.report(LoxError::lex(line, column, message));
    }

    pub fn parse_error<S: Into<String>>(&mut self, token: &Token, message: S) {
        self.report(LoxError::parse(token, message));
    }

    pub fn resolve_error<S: Into<String>>(&mut self, token: &Token, message: S) {
        self.report(LoxError::resolve(token, message));
    }

    pub fn runtime_error(&mut self, error: RuntimeError) {
        self.report(LoxError::Runtime(error));
    }

    /// Record an already‑built error, setting the flag matching its kind.
    pub fn report(&mut self, error: LoxError) {
        debug!("Reporting: {}", error);

        if error.is_static() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }

        self.errors.push(error);
    }

    /// A scan, parse or resolve error has been reported.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clear both flags and drop any undrained errors.
    pub fn reset(&mut self) {
        self.errors.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// Take the errors reported so far; the flags are left as they are.
    pub fn drain(&mut self) -> Vec<LoxError> {
        std::mem::take(&mut self.errors)
    }
}
