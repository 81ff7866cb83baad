//! Recipe DSL front end.
//!
//! This module provides:
//! - `tokenizer`: split a recipe line into tokens, honoring quotes
//! - `pattern`: parse directive patterns and match tokens against them
//! - `arguments`: coerce raw bindings into typed [`Arguments`]
//! - `usage`: the declared grammar of a directive
//!
//! ## Usage Flow
//!
//! ```text
//! "copy a b true" → tokenize → Pattern::matches → UsageDefinition::bind → Arguments
//! ```

pub mod arguments;
pub mod pattern;
pub mod tokenizer;
pub mod usage;

// Re-exports for convenience
pub use arguments::{parse_bool, ArgValue, Arguments, TokenKind};
pub use pattern::{Bindings, Pattern, PatternToken};
pub use tokenizer::tokenize;
pub use usage::{Parameter, UsageBuilder, UsageDefinition};
