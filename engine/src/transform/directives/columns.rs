//! Column-level directives.

use std::collections::HashSet;

use super::{compile_expression, require_column};
use crate::error::{ArgumentError, ArgumentResult, DirectiveError, DirectiveResult};
use crate::models::{Row, Value};
use crate::transform::context::ExecutionContext;
use crate::transform::directive::{Directive, DirectiveOutput};
use crate::transform::dsl::{parse_bool, Arguments, TokenKind, UsageDefinition};
use crate::transform::expression::Expression;

// =============================================================================
// rename / drop / keep / copy
// =============================================================================

/// `rename <old> <new>`
#[derive(Debug, Default)]
pub struct RenameColumn {
    old: String,
    new: String,
}

impl Directive for RenameColumn {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("rename")
            .define("old", TokenKind::ColumnName)
            .define("new", TokenKind::ColumnName)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.old = args.str("old")?.to_string();
        self.new = args.str("new")?.to_string();
        Ok(())
    }

    fn execute(
        &self,
        mut rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        for row in &mut rows {
            let idx = require_column(row, &self.old)?;
            if matches!(row.find(&self.new), Some(existing) if existing != idx) {
                return Err(DirectiveError::Failed(format!(
                    "Column '{}' already exists",
                    self.new
                )));
            }
            row.set_column(idx, self.new.clone());
        }
        Ok(rows.into())
    }
}

/// `drop <columns>`
#[derive(Debug, Default)]
pub struct DropColumns {
    columns: Vec<String>,
}

impl Directive for DropColumns {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("drop")
            .define("columns", TokenKind::List)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.columns = args.list("columns")?.to_vec();
        if self.columns.is_empty() {
            return Err(ArgumentError::Invalid {
                name: "columns".to_string(),
                message: "at least one column is required".to_string(),
            });
        }
        Ok(())
    }

    fn execute(
        &self,
        mut rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        let dropped: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        for row in &mut rows {
            for column in &self.columns {
                require_column(row, column)?;
            }
            row.retain(|name, _| !dropped.contains(name));
        }
        Ok(rows.into())
    }
}

/// `keep <columns>`
///
/// Listed columns that a row lacks are ignored.
#[derive(Debug, Default)]
pub struct KeepColumns {
    columns: HashSet<String>,
}

impl Directive for KeepColumns {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("keep")
            .define("columns", TokenKind::List)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.columns = args.list("columns")?.iter().cloned().collect();
        Ok(())
    }

    fn execute(
        &self,
        mut rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        for row in &mut rows {
            row.retain(|name, _| self.columns.contains(name));
        }
        Ok(rows.into())
    }
}

/// `copy <source> <destination> [<force>]`
///
/// `force` defaults to false; copying onto an existing column without it is
/// fatal.
#[derive(Debug, Default)]
pub struct CopyColumn {
    source: String,
    destination: String,
    force: bool,
}

impl Directive for CopyColumn {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("copy")
            .define("source", TokenKind::ColumnName)
            .define("destination", TokenKind::ColumnName)
            .define_optional("force", TokenKind::Boolean)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.source = args.str("source")?.to_string();
        self.destination = args.str("destination")?.to_string();
        self.force = match args.contains("force") {
            true => args.boolean("force")?,
            false => false,
        };
        Ok(())
    }

    fn execute(
        &self,
        mut rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        for row in &mut rows {
            let idx = require_column(row, &self.source)?;
            let value = row.value(idx).cloned().unwrap_or_default();
            if row.find(&self.destination).is_some() && !self.force {
                return Err(DirectiveError::Failed(format!(
                    "Destination column '{}' already exists; use force to overwrite",
                    self.destination
                )));
            }
            row.add_or_set(&self.destination, value);
        }
        Ok(rows.into())
    }
}

// =============================================================================
// set-column / fill-null-or-empty
// =============================================================================

/// `set-column <column> <expression>`
#[derive(Debug, Default)]
pub struct SetColumn {
    column: String,
    expression: Expression,
}

impl Directive for SetColumn {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("set-column")
            .define("column", TokenKind::ColumnName)
            .define("expression", TokenKind::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.column = args.str("column")?.to_string();
        self.expression = compile_expression("expression", args.str("expression")?)?;
        Ok(())
    }

    fn execute(
        &self,
        mut rows: Vec<Row>,
        context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        for row in &mut rows {
            let value = self.expression.evaluate(row, context.store())?;
            row.add_or_set(&self.column, value);
        }
        Ok(rows.into())
    }
}

/// `fill-null-or-empty <column> <value>`
#[derive(Debug, Default)]
pub struct FillNullOrEmpty {
    column: String,
    value: String,
}

impl Directive for FillNullOrEmpty {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("fill-null-or-empty")
            .define("column", TokenKind::ColumnName)
            .define("value", TokenKind::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.column = args.str("column")?.to_string();
        self.value = args.str("value")?.to_string();
        Ok(())
    }

    fn execute(
        &self,
        mut rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        for row in &mut rows {
            if let Some(idx) = row.find(&self.column) {
                if row.value(idx).is_some_and(Value::is_null_or_empty) {
                    row.set_value(idx, self.value.as_str());
                }
            }
        }
        Ok(rows.into())
    }
}

// =============================================================================
// set-type
// =============================================================================

/// Target of a `set-type` conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
}

impl TargetType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "string" => Some(Self::String),
            "int" | "integer" | "long" => Some(Self::Integer),
            "float" | "double" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }

    /// Convert one value. Null stays null.
    pub fn convert(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        match self {
            Self::String => value.as_text().map(Value::String),
            Self::Integer => match value {
                Value::Int(n) => Some(Value::Int(*n)),
                Value::Float(f) => float_to_int(f.trunc()).map(Value::Int),
                Value::Bool(b) => Some(Value::Int(i64::from(*b))),
                Value::String(s) => {
                    let s = s.trim();
                    s.parse::<i64>().ok().map(Value::Int).or_else(|| {
                        s.parse::<f64>()
                            .ok()
                            .filter(|f| f.fract() == 0.0)
                            .and_then(float_to_int)
                            .map(Value::Int)
                    })
                }
                _ => None,
            },
            Self::Float => match value {
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Value::Float),
                Value::Bool(b) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
                other => other.as_f64().map(Value::Float),
            },
            Self::Boolean => match value {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::Int(n) => Some(Value::Bool(*n != 0)),
                Value::String(s) => parse_bool(s).map(Value::Bool),
                _ => None,
            },
        }
    }
}

/// Whole float to `i64`; `None` when out of range or not finite.
fn float_to_int(f: f64) -> Option<i64> {
    (f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

/// `set-type <column> <type>`
#[derive(Debug, Default)]
pub struct SetType {
    column: String,
    target: TargetType,
}

impl Directive for SetType {
    fn define(&self) -> UsageDefinition {
        UsageDefinition::builder("set-type")
            .define("column", TokenKind::ColumnName)
            .define("type", TokenKind::Identifier)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()> {
        self.column = args.str("column")?.to_string();
        let raw = args.str("type")?;
        self.target = TargetType::parse(raw).ok_or_else(|| ArgumentError::Invalid {
            name: "type".to_string(),
            message: format!(
                "unknown type '{}' (expected string, int, integer, long, float, double, bool or boolean)",
                raw
            ),
        })?;
        Ok(())
    }

    fn execute(
        &self,
        mut rows: Vec<Row>,
        _context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput> {
        for row in &mut rows {
            let idx = require_column(row, &self.column)?;
            let current = row.value(idx).cloned().unwrap_or_default();
            let converted =
                self.target
                    .convert(&current)
                    .ok_or_else(|| DirectiveError::TypeMismatch {
                        column: self.column.clone(),
                        message: format!(
                            "cannot convert {} '{}' to {}",
                            current.type_name(),
                            current,
                            self.target.as_str()
                        ),
                    })?;
            row.set_value(idx, converted);
        }
        Ok(rows.into())
    }
}
