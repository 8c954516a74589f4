//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Non‑local exits (`return`, `break`, `continue`) are *not* errors and never
//! travel through these types; see [`crate::interpreter::Signal`].
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source position.
    #[error("[{line}:{column}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,

        /// Column of the offending character.
        column: usize,
    },

    /// Syntactic (parser) error. `location` is `" at 'lexeme'"` or `" at end"`.
    #[error("[{line}:{column}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
        column: usize,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[{line}:{column}] Error at '{lexeme}': {message}")]
    Resolve {
        message: String,
        lexeme: String,
        line: usize,
        column: usize,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        let location: String = match token.token_type {
            crate::token::TokenType::EOF => " at end".to_string(),
            _ => format!(" at '{}'", token.lexeme),
        };

        LoxError::Parse {
            message,
            location,
            line: token.line,
            column: token.column,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            lexeme: token.lexeme.clone(),
            line: token.line,
            column: token.column,
        }
    }

    /// Is this a static (scan/parse/resolve) error?
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// Errors raised while executing a program. Each one aborts the current
/// top‑level statement and is reported by the driver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// An operand or callee had the wrong type.
    #[error("{message} [{line}:{column}]")]
    Type {
        message: String,
        line: usize,
        column: usize,
    },

    /// Division with a right operand of exactly zero.
    #[error("Division by zero. [{line}:{column}]")]
    DivisionByZero { line: usize, column: usize },

    #[error("Undefined variable '{name}'. [{line}:{column}]")]
    UndefinedVariable {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("Undefined property '{name}'. [{line}:{column}]")]
    UndefinedProperty {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("Expected {expected} arguments, got {got}. [{line}:{column}]")]
    Arity {
        expected: usize,
        got: usize,
        line: usize,
        column: usize,
    },

    /// Failure reported by a native function (I/O, bad argument).
    #[error("{message} [{line}:{column}]")]
    Native {
        message: String,
        line: usize,
        column: usize,
    },
}

impl RuntimeError {
    pub fn type_error<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::Type {
            message: msg.into(),
            line: token.line,
            column: token.column,
        }
    }

    pub fn division_by_zero(token: &Token) -> Self {
        RuntimeError::DivisionByZero {
            line: token.line,
            column: token.column,
        }
    }

    pub fn undefined_variable(token: &Token) -> Self {
        RuntimeError::UndefinedVariable {
            name: token.lexeme.clone(),
            line: token.line,
            column: token.column,
        }
    }

    pub fn undefined_property(token: &Token) -> Self {
        RuntimeError::UndefinedProperty {
            name: token.lexeme.clone(),
            line: token.line,
            column: token.column,
        }
    }

    pub fn arity(token: &Token, expected: usize, got: usize) -> Self {
        RuntimeError::Arity {
            expected,
            got,
            line: token.line,
            column: token.column,
        }
    }

    pub fn native<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::Native {
            message: msg.into(),
            line: token.line,
            column: token.column,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Result of evaluating code at runtime.
pub type RResult<T> = std::result::Result<T, RuntimeError>;
