//! Pipeline executor.
//!
//! Runs bound directives strictly in recipe order. Directive `i` receives the
//! whole batch produced by directive `i - 1`. Each invocation gets its own
//! [`ExecutionContext`], so one [`RecipePipeline`] can serve concurrent runs.

use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, info_span, warn};

use super::context::{ExecutionContext, RunMetadata, TransientStore};
use super::directive::{Directive, ErrorRecord, RowOutcome};
use super::dsl::Arguments;
use crate::config::{ErrorRowPolicy, ExecutorOptions};
use crate::error::ExecutionError;
use crate::models::Row;

/// A directive instance together with the recipe line it came from.
#[derive(Debug)]
pub struct BoundDirective {
    pub name: String,
    /// 1-based recipe line.
    pub line: usize,
    /// Original directive text.
    pub text: String,
    pub arguments: Arguments,
    pub directive: Box<dyn Directive>,
}

/// Outcome of one successful run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub rows: Vec<Row>,
    pub errors: Vec<ErrorRecord>,
    /// Transient variables as they stood when the run finished.
    pub variables: TransientStore,
    pub metadata: RunMetadata,
}

/// An ordered, immutable list of bound directives.
#[derive(Debug, Default)]
pub struct RecipePipeline {
    directives: Vec<BoundDirective>,
    options: ExecutorOptions,
}

impl RecipePipeline {
    pub fn new(directives: Vec<BoundDirective>) -> Self {
        Self {
            directives,
            options: ExecutorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn directives(&self) -> &[BoundDirective] {
        &self.directives
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Run over `rows` with fresh run metadata.
    pub fn execute(&self, rows: Vec<Row>) -> Result<ExecutionResult, ExecutionError> {
        self.execute_with(rows, RunMetadata::new())
    }

    /// Run over `rows`.
    ///
    /// The first directive error, or panic, aborts the run and is reported
    /// with the directive's name and recipe line.
    pub fn execute_with(
        &self,
        rows: Vec<Row>,
        metadata: RunMetadata,
    ) -> Result<ExecutionResult, ExecutionError> {
        let mut context = ExecutionContext::new(metadata);
        let span = info_span!("pipeline", run_id = %context.metadata().run_id);
        let _guard = span.enter();

        let mut batch = rows;
        let mut errors = Vec::new();

        for bound in &self.directives {
            let rows_in = batch.len();
            let input = std::mem::take(&mut batch);
            let output = panic::catch_unwind(AssertUnwindSafe(|| {
                bound.directive.execute(input, &mut context)
            }))
            .map_err(|payload| fatal(bound, panic_message(payload.as_ref())))?
            .map_err(|e| fatal(bound, e.to_string()))?;

            let mut diverted = 0;
            batch.reserve(output.kept());
            for outcome in output.into_outcomes() {
                match outcome {
                    RowOutcome::Keep(row) => batch.push(row),
                    RowOutcome::Divert(err) => {
                        diverted += 1;
                        if self.options.error_rows == ErrorRowPolicy::Retain {
                            batch.push(err.row.clone());
                        }
                        errors.push(ErrorRecord {
                            row: err.row,
                            directive: bound.name.clone(),
                            line: bound.line,
                            message: err.message,
                            code: err.code,
                        });
                    }
                }
            }

            debug!(
                directive = %bound.name,
                line = bound.line,
                rows_in,
                rows_out = batch.len(),
                diverted,
                "directive executed"
            );
            if diverted > 0 {
                warn!(
                    directive = %bound.name,
                    line = bound.line,
                    diverted,
                    "rows sent to error collection"
                );
            }
        }

        info!(rows = batch.len(), errors = errors.len(), "pipeline finished");
        let (variables, metadata) = context.into_parts();
        Ok(ExecutionResult {
            rows: batch,
            errors,
            variables,
            metadata,
        })
    }
}

fn fatal(bound: &BoundDirective, message: String) -> ExecutionError {
    ExecutionError {
        directive: bound.name.clone(),
        line: bound.line,
        text: bound.text.clone(),
        message,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArgumentResult, DirectiveResult};
    use crate::models::Value;
    use crate::transform::directive::DirectiveOutput;
    use crate::transform::dsl::{TokenKind, UsageDefinition};
    use crate::transform::recipe::RecipeParser;
    use crate::transform::registry::CompositeDirectiveRegistry;
    use pretty_assertions::assert_eq;

    fn pipeline(lines: &[&str]) -> RecipePipeline {
        let registry = CompositeDirectiveRegistry::standard();
        RecipeParser::new(&registry).parse(lines).unwrap()
    }

    fn numbered(count: i64) -> Vec<Row> {
        (0..count).map(|n| Row::new().with("n", n)).collect()
    }

    #[test]
    fn test_counting_with_transient_variables() {
        let pipeline = pipeline(&["set-variable total 0", "increment-variable total 1 \"age > 30\""]);
        let rows = [25, 35, 40].iter().map(|age| Row::new().with("age", *age)).collect();
        let result = pipeline.execute(rows).unwrap();
        assert_eq!(result.variables.get("total"), Some(&Value::Int(2)));
        assert_eq!(result.rows.len(), 3);
    }

    #[test]
    fn test_left_to_right_visibility() {
        let pipeline = pipeline(&["set-column b 'n + 1'", "set-column c 'b * 2'"]);
        let result = pipeline.execute(numbered(2)).unwrap();
        assert_eq!(
            result.rows[1],
            Row::new().with("n", 1).with("b", 2).with("c", 4)
        );
    }

    #[test]
    fn test_diverted_rows_are_removed_and_recorded_once() {
        let pipeline = pipeline(&["send-to-error 'n == 1' 'no ones'", "set-column seen 'true'"]);
        let result = pipeline.execute(numbered(3)).unwrap();

        assert_eq!(result.rows.len(), 2);
        assert!(result.rows.iter().all(|row| row.get("seen").is_some()));
        assert_eq!(result.errors.len(), 1);

        let record = &result.errors[0];
        assert_eq!(record.directive, "send-to-error");
        assert_eq!(record.line, 1);
        assert_eq!(record.message, "no ones");
        assert_eq!(record.row, Row::new().with("n", 1));
    }

    #[test]
    fn test_retain_policy_keeps_rows_in_place() {
        let pipeline = pipeline(&["send-to-error 'n == 1'", "set-column seen 'true'"]).with_options(
            ExecutorOptions {
                error_rows: ErrorRowPolicy::Retain,
            },
        );
        let result = pipeline.execute(numbered(3)).unwrap();
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[1].get("n"), Some(&Value::Int(1)));
        assert_eq!(result.rows[1].get("seen"), Some(&Value::Bool(true)));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_fatal_error_reports_origin() {
        let pipeline = pipeline(&["trim n", "rename missing other"]);
        let err = pipeline.execute(numbered(1)).unwrap_err();
        assert_eq!(err.directive, "rename");
        assert_eq!(err.line, 2);
        assert_eq!(err.text, "rename missing other");
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn test_each_run_starts_with_empty_store() {
        let pipeline = pipeline(&["increment-variable count 1 'true'"]);
        for _ in 0..2 {
            let result = pipeline.execute(numbered(3)).unwrap();
            assert_eq!(result.variables.get("count"), Some(&Value::Int(3)));
        }
    }

    #[test]
    fn test_concurrent_runs_share_nothing() {
        let pipeline = pipeline(&["increment-variable count 1 'true'", "sample 50 7"]);
        let expected = pipeline.execute(numbered(40)).unwrap().rows;

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| pipeline.execute(numbered(40)).unwrap()))
                .collect();
            for handle in handles {
                let result = handle.join().unwrap();
                assert_eq!(result.variables.get("count"), Some(&Value::Int(40)));
                assert_eq!(result.rows, expected);
            }
        });
    }

    #[test]
    fn test_empty_pipeline_passes_rows_through() {
        let result = RecipePipeline::default().execute(numbered(2)).unwrap();
        assert_eq!(result.rows, numbered(2));
        assert!(result.errors.is_empty());
        assert!(result.variables.is_empty());
    }

    #[derive(Debug, Default)]
    struct Explode;

    impl Directive for Explode {
        fn define(&self) -> UsageDefinition {
            UsageDefinition::builder("explode")
                .define("column", TokenKind::ColumnName)
                .build()
        }

        fn initialize(&mut self, _args: &Arguments) -> ArgumentResult<()> {
            Ok(())
        }

        fn execute(
            &self,
            _rows: Vec<Row>,
            _context: &mut ExecutionContext,
        ) -> DirectiveResult<DirectiveOutput> {
            panic!("boom");
        }
    }

    #[test]
    fn test_panic_is_reported_as_fatal() {
        let pipeline = RecipePipeline::new(vec![BoundDirective {
            name: "explode".into(),
            line: 9,
            text: "explode n".into(),
            arguments: Arguments::default(),
            directive: Box::new(Explode),
        }]);
        let err = pipeline.execute(numbered(1)).unwrap_err();
        assert_eq!(err.line, 9);
        assert!(err.message.contains("boom"));
    }
}
