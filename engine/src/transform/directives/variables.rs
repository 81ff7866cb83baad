//! Transient variable directives.

use super::compile_expression;
use crate::error::{ArgumentError, ArgumentResult, DirectiveResult};
use crate::models::Row;
use crate::transform::context::ExecutionContext;
use crate::transform::directive::{Directive, DirectiveOutput};
use crate::transform::dsl::{Arguments, TokenKind, UsageDefinition};
use crate::transform::expression::Expression;

/// `set-variable <variable> <expression>`
///
/// Evaluated once per row; the last row's value is what later directives see
/// after the batch. Within the batch each evaluation sees the previous value.
#[derive(Debug, Default)]
pub struct SetVariable {
    variable: String,
    expression: Expression,
}

impl Directive for SetVariable {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("set-variable")
            .define("variable", TokenKind::Identifier)
            .define("expression", TokenKind::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.variable = args.str("variable")?.to_string();
        self.expression = compile_expression("expression", args.str("expression")?)?;
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        for row in &rows {
            let value = self.expression.evaluate(row, context.store())?;
            context.store_mut().set(self.variable.clone(), value);
        }
        Ok(rows.into())
    }
}

/// `increment-variable <variable> <value> <expression>`
#[derive(Debug, Default)]
pub struct IncrementVariable {
    variable: String,
    value: i64,
    condition: Expression,
}

impl Directive for IncrementVariable {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("increment-variable")
            .define("variable", TokenKind::Identifier)
            .define("value", TokenKind::Number)
            .define("condition", TokenKind::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.variable = args.str("variable")?.to_string();
        self.value = args.integer("value").map_err(|_| ArgumentError::Invalid {
            name: "value".to_string(),
            message: "increment must be an integer".to_string(),
        })?;
        self.condition = compile_expression("condition", args.str("condition")?)?;
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        for row in &rows {
            if self.condition.test(row, context.store())? {
                context.store_mut().increment(&self.variable, self.value)?;
            }
        }
        Ok(rows.into())
    }
}
