//! Centralised error hierarchy for the interpreter.
//!
//! All pipeline stages (scanner, parser, resolver, runtime) convert their
//! internal failure modes into one of the variants defined here.  Static
//! errors never abort a stage: they are pushed into a [`Diagnostics`]
//! collector which the caller polls between stages.
//!
//! The module **does not** print diagnostics itself.

use thiserror::Error;

use log::{debug, info};

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[Line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[Line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        /// Either `" at end"` or `" at '<lexeme>'"`.
        location: String,
        line: usize,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[Line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error("[Line {}] {}", .0.line(), .0)]
    Runtime(#[from] RuntimeError),
}

/// `" at end"` for the end-of-input token, `" at '<lexeme>'"` otherwise.
fn location_of(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_owned()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, msg={}",
            token.line, message
        );

        LoxError::Resolve {
            message,
            location: location_of(token),
            line: token.line,
        }
    }
}

/// Failures raised while evaluating a resolved program.  Every variant keeps
/// the source line of the token that triggered it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("{message}")]
    TypeMismatch { message: &'static str, line: usize },

    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: usize },

    #[error("Variable '{name}' was read before being assigned.")]
    UnassignedVariable { name: String, line: usize },

    #[error("Undefined property '{name}'.")]
    UndefinedProperty { name: String, line: usize },

    #[error("Only instances have {what}.")]
    NotAnInstance { what: &'static str, line: usize },

    #[error("Can only call functions and classes.")]
    NotCallable { line: usize },

    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("Division by zero.")]
    DivisionByZero { line: usize },

    #[error("Superclass must be a class.")]
    InvalidSuperclass { line: usize },

    /// Failure inside a host-provided function (I/O, clock).
    #[error("{message}")]
    Native { message: String, line: usize },
}

impl RuntimeError {
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::TypeMismatch { line, .. }
            | RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::UnassignedVariable { line, .. }
            | RuntimeError::UndefinedProperty { line, .. }
            | RuntimeError::NotAnInstance { line, .. }
            | RuntimeError::NotCallable { line }
            | RuntimeError::ArityMismatch { line, .. }
            | RuntimeError::DivisionByZero { line }
            | RuntimeError::InvalidSuperclass { line }
            | RuntimeError::Native { line, .. } => *line,
        }
    }
}

/// Accumulates every error reported by one run of the pipeline.
///
/// The two flags are what the caller polls between stages: `had_error`
/// suppresses later stages, `had_runtime_error` picks the exit status.
#[derive(Debug, Default)]
pub struct Diagnostics {
    reports: Vec<LoxError>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.  Static errors and runtime errors set different flags.
    pub fn report(&mut self, error: LoxError) {
        debug!("Reporting: {}", error);

        if let LoxError::Runtime(_) = error {
            self.had_runtime_error = true;
        } else {
            self.had_error = true;
        }

        self.reports.push(error);
    }

    /// Report a syntax error located at `token`.
    pub fn error_at<S: Into<String>>(&mut self, token: &Token, message: S) {
        self.report(LoxError::parse(token, message));
    }

    pub fn report_runtime(&mut self, error: RuntimeError) {
        self.report(LoxError::Runtime(error));
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reports(&self) -> &[LoxError] {
        &self.reports
    }

    /// Hand the accumulated reports to the caller, leaving the flags intact.
    pub fn drain(&mut self) -> Vec<LoxError> {
        std::mem::take(&mut self.reports)
    }

    /// Forget everything; [`Session::run`](crate::session::Session::run) starts with this.
    pub fn reset(&mut self) {
        self.reports.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
