//! Error types for the wrangling engine.
//!
//! Each layer owns its error type:
//!
//! - [`TokenizeError`] - recipe line tokenization
//! - [`PatternError`] - pattern syntax and pattern matching
//! - [`ArgumentError`] - argument coercion and directive initialization
//! - [`RecipeError`] - recipe parsing (terminal for the whole recipe)
//! - [`DirectiveError`] - fatal failure raised inside a directive
//! - [`ExecutionError`] - a [`DirectiveError`] tagged with its source line
//! - [`TransientStoreError`] - transient variable misuse
//! - [`CsvError`] - CSV ingestion
//! - [`ConfigError`] - configuration loading
//! - [`WrangleError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Tokenizer Errors
// =============================================================================

/// Errors while splitting a recipe line into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A quote was opened and never closed.
    #[error("Unterminated {quote} quote starting at offset {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
}

// =============================================================================
// Pattern Errors
// =============================================================================

/// Errors from parsing a pattern or matching input against it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern string itself is malformed.
    #[error("Malformed pattern '{pattern}': {message}")]
    Malformed { pattern: String, message: String },

    /// Input did not satisfy the pattern.
    #[error("Expected format: {pattern} ({reason})")]
    Mismatch { pattern: String, reason: String },
}

// =============================================================================
// Argument Errors
// =============================================================================

/// Errors while binding typed arguments to a directive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// A required parameter was not supplied.
    #[error("Missing required argument '{0}'")]
    Missing(String),

    /// A number parameter received non-numeric text.
    #[error("Argument '{name}' expects a number, got '{value}'")]
    InvalidNumber { name: String, value: String },

    /// A boolean parameter received a value outside the vocabulary.
    #[error("Argument '{name}' expects a boolean (true/false, yes/no, on/off, 1/0), got '{value}'")]
    InvalidBoolean { name: String, value: String },

    /// The bound value is of a different kind than requested.
    #[error("Argument '{name}' is not a {expected}")]
    WrongKind { name: String, expected: &'static str },

    /// Directive-specific validation failed during initialization.
    #[error("Invalid value for argument '{name}': {message}")]
    Invalid { name: String, message: String },
}

// =============================================================================
// Recipe Errors
// =============================================================================

/// Errors while parsing a recipe into a pipeline.
///
/// Both variants abort the whole parse; no partial pipeline is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    /// The directive line could not be tokenized, matched or bound.
    #[error("Line {line} '{text}': {message}")]
    Parse {
        line: usize,
        text: String,
        message: String,
    },

    /// No registry knows the directive name.
    #[error("Line {line}: directive '{name}' not found")]
    DirectiveNotFound { line: usize, name: String },
}

impl RecipeError {
    /// Builds a [`RecipeError::Parse`] from any displayable cause.
    pub fn parse(line: usize, text: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Parse {
            line,
            text: text.into(),
            message: cause.to_string(),
        }
    }

    /// Source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            Self::Parse { line, .. } | Self::DirectiveNotFound { line, .. } => *line,
        }
    }
}

// =============================================================================
// Transient Store Errors
// =============================================================================

/// Errors from the per-run transient variable store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransientStoreError {
    /// `increment` was called on a variable holding a non-numeric value.
    #[error("Variable '{name}' holds a {found} and cannot be incremented")]
    NotNumeric { name: String, found: &'static str },

    /// The integer result of `increment` does not fit in an `i64`.
    #[error("Incrementing variable '{name}' by {delta} overflows")]
    Overflow { name: String, delta: i64 },
}

// =============================================================================
// Directive Errors
// =============================================================================

/// Fatal failure raised by a directive while transforming a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    /// A column the directive requires is absent from a row.
    #[error("Column '{0}' is not defined in the row")]
    MissingColumn(String),

    /// A cell holds a value of the wrong type.
    #[error("Type mismatch in column '{column}': {message}")]
    TypeMismatch { column: String, message: String },

    /// Evaluating an expression failed.
    #[error("Expression '{expression}' failed: {message}")]
    Expression { expression: String, message: String },

    /// Transient store misuse.
    #[error(transparent)]
    Store(#[from] TransientStoreError),

    /// Any other unrecoverable condition.
    #[error("{0}")]
    Failed(String),
}

/// A fatal [`DirectiveError`] tagged with the directive that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Directive '{directive}' at line {line} ('{text}') failed: {message}")]
pub struct ExecutionError {
    /// Directive name.
    pub directive: String,
    /// Recipe line the directive was parsed from.
    pub line: usize,
    /// Original directive text.
    pub text: String,
    /// Failure description.
    pub message: String,
}

// =============================================================================
// CSV Ingestion Errors
// =============================================================================

/// Errors during CSV ingestion.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed CSV content.
    #[error("Invalid CSV format: {0}")]
    ParseError(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading an [`crate::config::EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration is not valid JSON for the expected shape.
    #[error("Invalid config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A field holds an unusable value.
    #[error("Invalid config value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::transform_bytes`]
/// and friends. It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum WrangleError {
    /// CSV ingestion error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Recipe parse error.
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Fatal execution error.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO error outside ingestion (reading recipes, writing output).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for pattern operations.
pub type PatternResult<T> = Result<T, PatternError>;

/// Result type for argument binding.
pub type ArgumentResult<T> = Result<T, ArgumentError>;

/// Result type for recipe parsing.
pub type RecipeResult<T> = Result<T, RecipeError>;

/// Result type for directive execution.
pub type DirectiveResult<T> = Result<T, DirectiveError>;

/// Result type for CSV ingestion.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for top-level operations.
pub type WrangleResult<T> = Result<T, WrangleError>;
