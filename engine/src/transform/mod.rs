//! Recipe-driven row transformation.
//!
//! This module handles everything between recipe text and transformed rows:
//! - DSL: tokenizer, patterns, typed arguments, usage definitions
//! - Registry: directive lookup by name
//! - Recipe: recipe lines → bound pipeline
//! - Executor: runs a pipeline over a batch
//! - Pipeline: high-level CSV helpers

pub mod context;
pub mod directive;
pub mod directives;
pub mod dsl;
pub mod executor;
pub mod expression;
pub mod pipeline;
pub mod recipe;
pub mod registry;

pub use context::{ExecutionContext, RunMetadata, TransientStore};
pub use directive::{
    Directive, DirectiveOutput, ErrorRecord, RowError, RowOutcome, DEFAULT_ERROR_CODE,
};
pub use dsl::*;
pub use executor::{BoundDirective, ExecutionResult, RecipePipeline};
pub use expression::Expression;
pub use pipeline::*;
pub use recipe::{LogicalLine, RecipeParser};
pub use registry::{
    CompositeDirectiveRegistry, DirectiveFactory, DirectiveInfo, DirectiveRegistry,
    SystemDirectiveRegistry, UserDirectiveRegistry,
};
