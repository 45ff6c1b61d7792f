//! Error types shared by the SQL bridge, the planner and the engines.
//!
//! Four classes are kept apart so callers can react differently:
//! syntax errors from clause parsing, validation errors raised before any
//! backend call, backend-unavailable errors for missing push-down clients,
//! and errors reported by a backend while it ran a statement.

use thiserror::Error;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// A tokenizer or parser failure in a WHERE/HAVING clause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at {offset}")]
pub struct SyntaxError {
    /// Human readable description.
    pub message: String,
    /// Byte offset into the clause text.
    pub offset: usize,
    /// The offending character or token text, when there is one.
    pub found: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
            found: None,
        }
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }

    /// Shift the offset, used when a prefix was stripped before lexing.
    pub(crate) fn shifted(mut self, by: usize) -> Self {
        self.offset += by;
        self
    }
}

/// A report that cannot run as specified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("unsupported time_grain: {0}")]
    UnknownTimeGrain(String),

    #[error("duplicate dimension or measure name: {0}")]
    DuplicateName(String),

    #[error("unsupported aggregation: {0}")]
    UnknownAggregation(String),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("unsupported regex flag '{flag}' (allowed: i, m, s)")]
    UnsupportedRegexFlag { flag: char },

    #[error("invalid regex pattern {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("cannot render non-finite number {0} as SQL")]
    NonFiniteLiteral(f64),

    #[error("expression cannot be evaluated in-process: {0}")]
    NotEvaluable(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("column {name} has {actual} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid report spec: {0}")]
    InvalidSpec(String),

    #[error("result has {0} slices; select one by key")]
    MultipleSlices(usize),
}

/// A failure reported by a push-down backend while executing SQL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{backend} backend error: {message}")]
pub struct BackendError {
    pub backend: String,
    pub message: String,
}

impl BackendError {
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while planning or executing a report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    /// A WHERE/HAVING clause failed to tokenize or parse.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// The spec or an expression is invalid for this run.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The push-down client is missing or misconfigured.
    #[error("{engine} backend unavailable: {reason}")]
    BackendUnavailable { engine: String, reason: String },

    /// The backend rejected or failed the statement.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ReportError {
    pub fn backend_unavailable(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            engine: engine.into(),
            reason: reason.into(),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, ReportError::Syntax(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ReportError::Validation(_))
    }

    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, ReportError::BackendUnavailable { .. })
    }
}
