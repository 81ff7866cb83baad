//! # Wrangle - recipe-driven record transformation
//!
//! Wrangle applies a recipe of textual directives to batches of rows.
//! Each recipe line names a directive and its arguments; the engine parses
//! the recipe once into a pipeline and runs that pipeline over any number of
//! batches.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Recipe    │────▶│   Parser    │────▶│  Pipeline   │────▶│ Rows + Errs │
//! │   (text)    │     │ (registry)  │     │ (executor)  │     │ (+ vars)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                ▲
//!                     ┌─────────────┐            │
//!                     │  CSV ingest │────────────┘
//!                     │  (auto-enc) │
//!                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wrangle::{default_registry, EngineConfig, RecipeParser, Row};
//!
//! let registry = default_registry();
//! let pipeline = RecipeParser::new(&registry).parse(&[
//!     "set-variable total 0",
//!     "increment-variable total 1 \"age > 30\"",
//! ])?;
//!
//! let rows = vec![Row::new().with("age", 25), Row::new().with("age", 35)];
//! let result = pipeline.execute(rows)?;
//! assert_eq!(result.variables.get("total"), Some(&1.into()));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - Rows and cell values
//! - [`config`] - Parser and executor options
//! - [`ingest`] - CSV ingestion with auto-detection
//! - [`transform`] - DSL, directives, registry, parser and executor

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Ingestion
pub mod ingest;

// Transformation
pub mod transform;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ArgumentError, ConfigError, CsvError, DirectiveError, ExecutionError, PatternError,
    RecipeError, TokenizeError, TransientStoreError, WrangleError, WrangleResult,
};

// =============================================================================
// Re-exports - Models and config
// =============================================================================

pub use config::{EngineConfig, ErrorRowPolicy, ExecutorOptions, ParserOptions};
pub use models::{Row, Value};

// =============================================================================
// Re-exports - CSV Ingestion
// =============================================================================

pub use ingest::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto,
    parse_str, ParseResult,
};

// =============================================================================
// Re-exports - DSL
// =============================================================================

pub use transform::dsl::{
    tokenize, ArgValue, Arguments, Bindings, Parameter, Pattern, PatternToken, TokenKind,
    UsageBuilder, UsageDefinition,
};

// =============================================================================
// Re-exports - Directives and registries
// =============================================================================

pub use transform::{
    CompositeDirectiveRegistry, Directive, DirectiveInfo, DirectiveOutput, DirectiveRegistry,
    ErrorRecord, RowError, RowOutcome, SystemDirectiveRegistry, UserDirectiveRegistry,
};

// =============================================================================
// Re-exports - Execution
// =============================================================================

pub use transform::{
    BoundDirective, ExecutionContext, ExecutionResult, RecipeParser, RecipePipeline,
    RunMetadata, TransientStore,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    default_registry, parse_recipe, transform_bytes, transform_file, transform_rows, CsvInfo,
    PipelineResult, TransformOptions,
};
