//! Row-level directives: filtering, diverting, splitting and sampling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{compile_expression, require_column};
use crate::error::{ArgumentError, ArgumentResult, DirectiveResult};
use crate::models::{Row, Value};
use crate::transform::context::ExecutionContext;
use crate::transform::directive::{Directive, DirectiveOutput, DEFAULT_ERROR_CODE};
use crate::transform::dsl::{Arguments, TokenKind, UsageDefinition};
use crate::transform::expression::Expression;

/// `filter-row-if-true <condition>`
#[derive(Debug, Default)]
pub struct FilterRowIfTrue {
    condition: Expression,
}

impl Directive for FilterRowIfTrue {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("filter-row-if-true")
            .define("condition", TokenKind::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.condition = compile_expression("condition", args.str("condition")?)?;
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        let mut output = DirectiveOutput::with_capacity(rows.len());
        for row in rows {
            if !self.condition.test(&row, context.store())? {
                output.keep(row);
            }
        }
        Ok(output)
    }
}

/// `send-to-error <condition> [<message>]`
#[derive(Debug, Default)]
pub struct SendToError {
    condition: Expression,
    message: Option<String>,
}

impl Directive for SendToError {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("send-to-error")
            .define("condition", TokenKind::Text)
            .define_optional("message", TokenKind::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.condition = compile_expression("condition", args.str("condition")?)?;
        self.message = match args.contains("message") {
            true => Some(args.str("message")?.to_string()),
            false => None,
        };
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        let mut output = DirectiveOutput::with_capacity(rows.len());
        for row in rows {
            if self.condition.test(&row, context.store())? {
                let message = self.message.clone().unwrap_or_else(|| {
                    format!("Row matched condition '{}'", self.condition.source())
                });
                output.divert_with_code(row, message, DEFAULT_ERROR_CODE);
            } else {
                output.keep(row);
            }
        }
        Ok(output)
    }
}

/// `split-to-rows <column> <separator>`
///
/// The separator is literal text. A null cell leaves the row as is.
#[derive(Debug, Default)]
pub struct SplitToRows {
    column: String,
    separator: String,
}

impl Directive for SplitToRows {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("split-to-rows")
            .define("column", TokenKind::ColumnName)
            .define("separator", TokenKind::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.column = args.str("column")?.to_string();
        self.separator = args.str("separator")?.to_string();
        if self.separator.is_empty() {
            return Err(ArgumentError::Invalid {
                name: "separator".to_string(),
                message: "separator must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        let mut output = DirectiveOutput::with_capacity(rows.len());
        for row in rows {
            let idx = require_column(&row, &self.column)?;
            let Some(text) = row.value(idx).and_then(Value::as_text) else {
                output.keep(row);
                continue;
            };
            for piece in text.split(self.separator.as_str()) {
                let mut split = row.clone();
                split.set_value(idx, piece);
                output.keep(split);
            }
        }
        Ok(output)
    }
}

/// Seed used by `sample` when none is given.
pub const DEFAULT_SAMPLE_SEED: u64 = 0;

/// `sample <percentage> [<seed>]`
///
/// The generator is reseeded on every batch, so the same input and seed
/// always keep the same rows.
#[derive(Debug, Default)]
pub struct Sample {
    probability: f64,
    seed: u64,
}

impl Directive for Sample {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("sample")
            .define("percentage", TokenKind::Number)
            .define_optional("seed", TokenKind::Number)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        let percentage = args.number("percentage")?;
        if !(0.0..=100.0).contains(&percentage) {
            return Err(ArgumentError::Invalid {
                name: "percentage".to_string(),
                message: format!("{} is not between 0 and 100", percentage),
            });
        }
        self.probability = percentage / 100.0;
        self.seed = match args.contains("seed") {
            true => args
                .integer("seed")
                .ok()
                .and_then(|seed| u64::try_from(seed).ok())
                .ok_or_else(|| ArgumentError::Invalid {
                    name: "seed".to_string(),
                    message: "seed must be a non-negative integer".to_string(),
                })?,
            false => DEFAULT_SAMPLE_SEED,
        };
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut output = DirectiveOutput::new();
        for row in rows {
            if rng.gen_bool(self.probability) {
                output.keep(row);
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectiveError;
    use crate::transform::directive::RowOutcome;
    use crate::transform::directives::testing::{kept, run, try_bind};
    use pretty_assertions::assert_eq;

    fn numbered(count: i64) -> Vec<Row> {
        (0..count).map(|n| Row::new().with("n", n)).collect()
    }

    #[test]
    fn test_filter_row_if_true() {
        let output = run("filter-row-if-true 'n % 2 == 0'", numbered(5)).unwrap();
        let remaining: Vec<_> = kept(&output)
            .iter()
            .map(|row| row.get("n").cloned().unwrap())
            .collect();
        assert_eq!(remaining, vec![Value::Int(1), Value::Int(3)]);
    }

    #[test]
    fn test_filter_unknown_column_is_fatal() {
        let err = run("filter-row-if-true 'missing > 1'", numbered(1)).unwrap_err();
        assert!(matches!(err, DirectiveError::Expression { .. }));
    }

    #[test]
    fn test_send_to_error_preserves_order() {
        let output = run("send-to-error 'n == 1' 'one is not allowed'", numbered(3)).unwrap();
        assert_eq!(output.kept(), 2);
        match &output.outcomes()[1] {
            RowOutcome::Divert(err) => {
                assert_eq!(err.message, "one is not allowed");
                assert_eq!(err.row.get("n"), Some(&Value::Int(1)));
                assert_eq!(err.code, DEFAULT_ERROR_CODE);
            }
            other => panic!("expected divert, got {other:?}"),
        }
    }

    #[test]
    fn test_send_to_error_default_message() {
        let output = run("send-to-error 'n > 0'", numbered(2)).unwrap();
        match &output.outcomes()[1] {
            RowOutcome::Divert(err) => assert!(err.message.contains("n > 0")),
            other => panic!("expected divert, got {other:?}"),
        }
    }

    #[test]
    fn test_split_to_rows() {
        let row = Row::new().with("id", 1).with("tags", "a;b;c");
        let output = run("split-to-rows tags ;", vec![row]).unwrap();
        let rows = kept(&output);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].get("tags"), Some(&Value::from("c")));
        assert_eq!(rows[2].get("id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_split_to_rows_missing_column_is_fatal() {
        assert!(run("split-to-rows tags ,", numbered(1)).is_err());
    }

    #[test]
    fn test_sample_bounds_and_determinism() {
        assert_eq!(run("sample 100", numbered(20)).unwrap().kept(), 20);
        assert_eq!(run("sample 0", numbered(20)).unwrap().kept(), 0);

        let first = kept(&run("sample 50 42", numbered(100)).unwrap());
        let second = kept(&run("sample 50 42", numbered(100)).unwrap());
        assert_eq!(first, second);
        assert!(!first.is_empty() && first.len() < 100);
    }

    #[test]
    fn test_sample_rejects_bad_arguments() {
        assert!(try_bind("sample 150").is_err());
        assert!(try_bind("sample 10 -1").is_err());
        assert!(try_bind("sample ten").is_err());
    }
}
