//! Built-in directives.
//!
//! - `variables`: `set-variable`, `increment-variable`
//! - `columns`: `rename`, `drop`, `keep`, `copy`, `set-column`,
//!   `fill-null-or-empty`, `set-type`
//! - `text`: `uppercase`, `lowercase`, `trim`, `find-and-replace`
//! - `rows`: `filter-row-if-true`, `send-to-error`, `split-to-rows`, `sample`

pub mod columns;
pub mod rows;
pub mod text;
pub mod variables;

pub use columns::{
    CopyColumn, DropColumns, FillNullOrEmpty, KeepColumns, RenameColumn, SetColumn, SetType,
};
pub use rows::{FilterRowIfTrue, Sample, SendToError, SplitToRows};
pub use text::{FindAndReplace, Lowercase, Trim, Uppercase};
pub use variables::{IncrementVariable, SetVariable};

use super::expression::Expression;
use super::registry::DirectiveInfo;
use crate::error::{ArgumentError, ArgumentResult, DirectiveError, DirectiveResult};
use crate::models::Row;

/// Registration entries for every built-in directive.
pub fn system_directives() -> Vec<DirectiveInfo> {
    vec![
        DirectiveInfo::of::<SetVariable>(
            "Evaluates the expression for each row and stores the result in a transient variable",
        ),
        DirectiveInfo::of::<IncrementVariable>(
            "Increments a transient variable by the given value for each row where the condition is true",
        ),
        DirectiveInfo::of::<RenameColumn>("Renames a column"),
        DirectiveInfo::of::<DropColumns>("Removes the listed columns"),
        DirectiveInfo::of::<KeepColumns>("Keeps only the listed columns"),
        DirectiveInfo::of::<CopyColumn>(
            "Copies a column, overwriting an existing destination only when forced",
        ),
        DirectiveInfo::of::<SetColumn>("Sets a column to the result of an expression"),
        DirectiveInfo::of::<FillNullOrEmpty>("Replaces null or blank values with a fixed value"),
        DirectiveInfo::of::<SetType>(
            "Converts a column to string, integer, float or boolean",
        ),
        DirectiveInfo::of::<Uppercase>("Converts a text column to upper case"),
        DirectiveInfo::of::<Lowercase>("Converts a text column to lower case"),
        DirectiveInfo::of::<Trim>("Removes leading and trailing whitespace"),
        DirectiveInfo::of::<FindAndReplace>(
            "Replaces every regex match in a text column",
        ),
        DirectiveInfo::of::<FilterRowIfTrue>("Removes rows where the condition is true"),
        DirectiveInfo::of::<SendToError>(
            "Sends rows where the condition is true to the error collection",
        ),
        DirectiveInfo::of::<SplitToRows>(
            "Splits a column on a separator, emitting one row per piece",
        ),
        DirectiveInfo::of::<Sample>(
            "Keeps a random percentage of rows using a seeded generator",
        ),
    ]
}

/// Index of `column`, or a fatal error when the row lacks it.
pub(crate) fn require_column(row: &Row, column: &str) -> DirectiveResult<usize> {
    row.find(column)
        .ok_or_else(|| DirectiveError::MissingColumn(column.to_string()))
}

/// Compile the expression bound to argument `name`.
pub(crate) fn compile_expression(name: &str, source: &str) -> ArgumentResult<Expression> {
    Expression::compile(source).map_err(|message| ArgumentError::Invalid {
        name: name.to_string(),
        message,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::DirectiveResult;
    use crate::models::Row;
    use crate::transform::context::{ExecutionContext, RunMetadata};
    use crate::transform::directive::{Directive, DirectiveOutput, RowOutcome};
    use crate::transform::dsl::tokenize;

    use super::system_directives;

    /// Bind and initialize a built-in directive from a recipe line.
    pub fn try_bind(line: &str) -> Result<Box<dyn Directive>, String> {
        let tokens = tokenize(line).map_err(|e| e.to_string())?;
        let info = system_directives()
            .into_iter()
            .find(|info| info.name() == tokens[0])
            .ok_or_else(|| format!("unknown directive {}", tokens[0]))?;
        let bindings = info
            .usage()
            .pattern()
            .matches(&tokens)
            .map_err(|e| e.to_string())?;
        let args = info.usage().bind(&bindings, line).map_err(|e| e.to_string())?;
        let mut directive = info.create();
        directive.initialize(&args).map_err(|e| e.to_string())?;
        Ok(directive)
    }

    pub fn bind(line: &str) -> Box<dyn Directive> {
        try_bind(line).unwrap_or_else(|e| panic!("failed to bind '{line}': {e}"))
    }

    pub fn run(line: &str, rows: Vec<Row>) -> DirectiveResult<DirectiveOutput> {
        let mut context = ExecutionContext::new(RunMetadata::new());
        bind(line).execute(rows, &mut context)
    }

    pub fn kept(output: &DirectiveOutput) -> Vec<Row> {
        output
            .outcomes()
            .iter()
            .filter_map(|outcome| match outcome {
                RowOutcome::Keep(row) => Some(row.clone()),
                RowOutcome::Divert(_) => None,
            })
            .collect()
    }
}
