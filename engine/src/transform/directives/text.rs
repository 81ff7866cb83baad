//! Text directives.
//!
//! Rows without the column, or with a null in it, pass through untouched.
//! Non-string scalars are rendered to text before the transformation.

use regex::Regex;

use crate::error::{ArgumentError, ArgumentResult, DirectiveError, DirectiveResult};
use crate::models::{Row, Value};
use crate::transform::context::ExecutionContext;
use crate::transform::directive::{Directive, DirectiveOutput};
use crate::transform::dsl::{Arguments, TokenKind, UsageDefinition};

/// Apply `f` to the text of `column` in every row that has it.
fn map_text(mut rows: Vec<Row>, column: &str, f: impl Fn(&str) -> String) -> DirectiveOutput {
    for row in &mut rows {
        let Some(idx) = row.find(column) else {
            continue;
        };
        let text = match row.value(idx) {
            Some(Value::String(s)) => f(s),
            Some(other) => match other.as_text() {
                Some(text) => f(&text),
                None => continue,
            },
            None => continue,
        };
        row.set_value(idx, text);
    }
    rows.into()
}

fn column_usage(name: &str) -> UsageDefinition {
    UsageDefinition::builder(name)
        .define("column", TokenKind::ColumnName)
        .build()
}

/// `uppercase <column>`
#[derive(Debug, Default)]
pub struct Uppercase {
    column: String,
}

impl Directive for Uppercase {
    fn define(&self) -> UsageDefinition {
        column_usage("uppercase")
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.column = args.str("column")?.to_string();
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        Ok(map_text(rows, &self.column, str::to_uppercase))
    }
}

/// `lowercase <column>`
#[derive(Debug, Default)]
pub struct Lowercase {
    column: String,
}

impl Directive for Lowercase {
    fn define(&self) -> UsageDefinition {
        column_usage("lowercase")
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.column = args.str("column")?.to_string();
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        Ok(map_text(rows, &self.column, str::to_lowercase))
    }
}

/// `trim <column>`
#[derive(Debug, Default)]
pub struct Trim {
    column: String,
}

impl Directive for Trim {
    fn define(&self) -> UsageDefinition {
        column_usage("trim")
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.column = args.str("column")?.to_string();
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        Ok(map_text(rows, &self.column, |s| s.trim().to_string()))
    }
}

/// `find-and-replace <column> <pattern> <replacement>`
///
/// `pattern` is a regular expression; `replacement` may use `$1` style
/// group references.
#[derive(Debug, Default)]
pub struct FindAndReplace {
    column: String,
    pattern: Option<Regex>,
    replacement: String,
}

impl Directive for FindAndReplace {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("find-and-replace")
            .define("column", TokenKind::ColumnName)
            .define("pattern", TokenKind::Text)
            .define("replacement", TokenKind::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.column = args.str("column")?.to_string();
        let pattern = args.str("pattern")?;
        self.pattern = Some(Regex::new(pattern).map_err(|e| ArgumentError::Invalid {
            name: "pattern".to_string(),
            message: e.to_string(),
        })?);
        self.replacement = args.str("replacement")?.to_string();
        Ok(())
    }

    fn execute(
        &self,
        rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        let pattern = self
            .pattern
            .as_ref()
            .ok_or_else(|| DirectiveError::Failed("find-and-replace is not initialized".into()))?;
        Ok(map_text(rows, &self.column, |s| {
            pattern.replace_all(s, self.replacement.as_str()).into_owned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::directives::testing::{kept, run, try_bind};

    #[test]
    fn test_case_and_trim() {
        let row = Row::new().with("name", "  Ada Lovelace  ");
        let output = run("trim name", vec![row]).unwrap();
        let output = run("uppercase name", kept(&output)).unwrap();
        assert_eq!(kept(&output)[0].get("name"), Some(&Value::from("ADA LOVELACE")));

        let output = run("lowercase name", kept(&output)).unwrap();
        assert_eq!(kept(&output)[0].get("name"), Some(&Value::from("ada lovelace")));
    }

    #[test]
    fn test_missing_and_null_cells_skipped() {
        let rows = vec![
            Row::new().with("other", "x"),
            Row::new().with("name", Value::Null),
        ];
        let output = run("uppercase name", rows.clone()).unwrap();
        assert_eq!(kept(&output), rows);
    }

    #[test]
    fn test_find_and_replace_regex() {
        let row = Row::new().with("phone", "+33 6-12.34");
        let output = run("find-and-replace phone '[-. ]' ''", vec![row]).unwrap();
        assert_eq!(kept(&output)[0].get("phone"), Some(&Value::from("+3361234")));
    }

    #[test]
    fn test_find_and_replace_group_reference() {
        let row = Row::new().with("date", "2024-03-15");
        let output = run(
            r"find-and-replace date '(\d+)-(\d+)-(\d+)' '$3/$2/$1'",
            vec![row],
        )
        .unwrap();
        assert_eq!(kept(&output)[0].get("date"), Some(&Value::from("15/03/2024")));
    }

    #[test]
    fn test_bad_regex_rejected() {
        let err = try_bind("find-and-replace col '(' x").unwrap_err();
        assert!(err.contains("pattern"), "{err}");
    }
}
