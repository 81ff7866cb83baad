//! High-level API: CSV in, recipe applied, rows and error records out.
//!
//! # Example
//!
//! ```rust,ignore
//! use wrangle::{transform_file, TransformOptions};
//!
//! let recipe = "set-type age integer\nsend-to-error 'age < 0'";
//! let result = transform_file("people.csv", recipe, &TransformOptions::default())?;
//! println!("{} rows, {} errors", result.rows.len(), result.errors.len());
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::context::{RunMetadata, TransientStore};
use super::directive::ErrorRecord;
use super::executor::{ExecutionResult, RecipePipeline};
use super::recipe::RecipeParser;
use super::registry::{CompositeDirectiveRegistry, DirectiveRegistry};
use crate::config::EngineConfig;
use crate::error::{RecipeResult, WrangleResult};
use crate::ingest::{parse_bytes_auto, ParseResult};
use crate::models::Row;

/// Options for the high-level helpers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    pub config: EngineConfig,
    /// Label recorded in the run metadata, e.g. the input file name.
    pub run_name: Option<String>,
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of transforming a CSV input.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub rows: Vec<Row>,
    pub errors: Vec<ErrorRecord>,
    pub variables: TransientStore,
    pub metadata: RunMetadata,
    pub csv_info: CsvInfo,
}

/// Registry holding the built-in directives.
pub fn default_registry() -> CompositeDirectiveRegistry {
    CompositeDirectiveRegistry::standard()
}

/// Parse `recipe` against `registry`, applying both parser and executor config.
pub fn parse_recipe(
    recipe: &str,
    registry: &dyn DirectiveRegistry,
    config: &EngineConfig,
) -> RecipeResult<RecipePipeline> {
    let pipeline = RecipeParser::new(registry)
        .with_options(config.parser.clone())
        .parse_str(recipe)?;
    Ok(pipeline.with_options(config.executor.clone()))
}

/// Apply `recipe` to rows that are already in memory.
pub fn transform_rows(
    rows: Vec<Row>,
    recipe: &str,
    options: &TransformOptions,
) -> WrangleResult<ExecutionResult> {
    let registry = default_registry();
    let pipeline = parse_recipe(recipe, &registry, &options.config)?;
    Ok(pipeline.execute_with(rows, metadata(options))?)
}

/// Ingest CSV bytes and apply `recipe`.
pub fn transform_bytes(
    bytes: &[u8],
    recipe: &str,
    options: &TransformOptions,
) -> WrangleResult<PipelineResult> {
    // Parse the recipe before ingesting so recipe errors surface first.
    let registry = default_registry();
    let pipeline = parse_recipe(recipe, &registry, &options.config)?;

    let parsed = parse_bytes_auto(bytes)?;
    transform_parsed(parsed, &pipeline, options)
}

/// Ingest a CSV file and apply `recipe`.
pub fn transform_file(
    path: impl AsRef<Path>,
    recipe: &str,
    options: &TransformOptions,
) -> WrangleResult<PipelineResult> {
    let bytes = std::fs::read(path)?;
    transform_bytes(&bytes, recipe, options)
}

fn transform_parsed(
    parsed: ParseResult,
    pipeline: &RecipePipeline,
    options: &TransformOptions,
) -> WrangleResult<PipelineResult> {
    info!(
        encoding = %parsed.encoding,
        delimiter = ?parsed.delimiter,
        rows = parsed.rows.len(),
        columns = parsed.headers.len(),
        "csv parsed"
    );

    let csv_info = CsvInfo {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        headers: parsed.headers,
        row_count: parsed.rows.len(),
    };

    let result = pipeline.execute_with(parsed.rows, metadata(options))?;
    Ok(PipelineResult {
        rows: result.rows,
        errors: result.errors,
        variables: result.variables,
        metadata: result.metadata,
        csv_info,
    })
}

fn metadata(options: &TransformOptions) -> RunMetadata {
    match &options.run_name {
        Some(name) => RunMetadata::new().with_name(name.clone()),
        None => RunMetadata::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorRowPolicy;
    use crate::error::WrangleError;
    use crate::models::Value;
    use pretty_assertions::assert_eq;

    const PEOPLE: &[u8] = b"name;age\nAlice;30\nBob;-1\nCarol;45\n";

    #[test]
    fn test_transform_bytes_end_to_end() {
        let recipe = "\
            set-type age integer\n\
            send-to-error 'age < 0' 'negative age'\n\
            increment-variable seniors 1 'age > 40'\n\
            uppercase name\n";
        let result = transform_bytes(PEOPLE, recipe, &TransformOptions::default()).unwrap();

        assert_eq!(result.csv_info.delimiter, ';');
        assert_eq!(result.csv_info.row_count, 3);
        assert_eq!(
            result.rows,
            vec![
                Row::new().with("name", "ALICE").with("age", 30),
                Row::new().with("name", "CAROL").with("age", 45),
            ]
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 2);
        assert_eq!(result.variables.get("seniors"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_recipe_error_before_ingestion() {
        let err = transform_bytes(b"", "explode x", &TransformOptions::default()).unwrap_err();
        assert!(matches!(err, WrangleError::Recipe(_)));
    }

    #[test]
    fn test_execution_error_is_wrapped() {
        let err = transform_bytes(PEOPLE, "rename missing x", &TransformOptions::default())
            .unwrap_err();
        assert!(matches!(err, WrangleError::Execution(_)));
    }

    #[test]
    fn test_options_reach_parser_and_executor() {
        let mut options = TransformOptions::default();
        options.config.parser.comment_prefixes = vec!["--".into()];
        options.config.executor.error_rows = ErrorRowPolicy::Retain;
        options.run_name = Some("people".into());

        let rows = vec![Row::new().with("n", 1), Row::new().with("n", 2)];
        let result = transform_rows(rows, "-- divert ones\nsend-to-error 'n == 1'", &options).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.metadata.name.as_deref(), Some("people"));
    }
}
