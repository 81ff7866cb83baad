//! Typed directive arguments.
//!
//! Raw string bindings from the pattern matcher are coerced according to the
//! [`TokenKind`] each parameter declares. Coercion happens once, at parse
//! time; a directive never sees an argument that failed it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ArgumentError, ArgumentResult};

/// Declared kind of a directive parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    ColumnName,
    Identifier,
    Text,
    Number,
    Boolean,
    List,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::ColumnName => "column-name",
            TokenKind::Identifier => "identifier",
            TokenKind::Text => "text",
            TokenKind::Number => "number",
            TokenKind::Boolean => "boolean",
            TokenKind::List => "list",
        }
    }
}

/// A coerced argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    ColumnName(String),
    Identifier(String),
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl ArgValue {
    /// String view of column names, identifiers and text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::ColumnName(s) | ArgValue::Identifier(s) | ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; floats qualify only when they have no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Int(n) => Some(*n),
            ArgValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Int(n) => Some(*n as f64),
            ArgValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ArgValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Coerce one raw binding into the declared kind.
pub fn coerce(kind: TokenKind, name: &str, raw: &str) -> ArgumentResult<ArgValue> {
    match kind {
        TokenKind::ColumnName => Ok(ArgValue::ColumnName(raw.to_string())),
        TokenKind::Identifier => Ok(ArgValue::Identifier(raw.to_string())),
        TokenKind::Text => Ok(ArgValue::Text(unquote(raw).to_string())),
        TokenKind::Number => parse_number(raw).ok_or_else(|| ArgumentError::InvalidNumber {
            name: name.to_string(),
            value: raw.to_string(),
        }),
        TokenKind::Boolean => {
            parse_bool(raw)
                .map(ArgValue::Bool)
                .ok_or_else(|| ArgumentError::InvalidBoolean {
                    name: name.to_string(),
                    value: raw.to_string(),
                })
        }
        TokenKind::List => Ok(ArgValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )),
    }
}

/// Case-insensitive boolean vocabulary shared by arguments and `set-type`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<ArgValue> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(ArgValue::Int(n));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(ArgValue::Float)
}

/// Strip one layer of matching surrounding quotes.
fn unquote(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Arguments bound to one directive instance.
///
/// Built once by the recipe parser and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<String, ArgValue>,
    line: String,
}

impl Arguments {
    pub fn new(values: HashMap<String, ArgValue>, line: impl Into<String>) -> Self {
        Self {
            values,
            line: line.into(),
        }
    }

    /// The original directive text these arguments were bound from.
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn value(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn require(&self, name: &str) -> ArgumentResult<&ArgValue> {
        self.values
            .get(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))
    }

    /// Required column name, identifier or text argument.
    pub fn str(&self, name: &str) -> ArgumentResult<&str> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| wrong_kind(name, "string"))
    }

    /// Required integral number argument.
    pub fn integer(&self, name: &str) -> ArgumentResult<i64> {
        self.require(name)?
            .as_i64()
            .ok_or_else(|| wrong_kind(name, "integer"))
    }

    pub fn number(&self, name: &str) -> ArgumentResult<f64> {
        self.require(name)?
            .as_f64()
            .ok_or_else(|| wrong_kind(name, "number"))
    }

    pub fn boolean(&self, name: &str) -> ArgumentResult<bool> {
        self.require(name)?
            .as_bool()
            .ok_or_else(|| wrong_kind(name, "boolean"))
    }

    pub fn list(&self, name: &str) -> ArgumentResult<&[String]> {
        self.require(name)?
            .as_list()
            .ok_or_else(|| wrong_kind(name, "list"))
    }
}

fn wrong_kind(name: &str, expected: &'static str) -> ArgumentError {
    ArgumentError::WrongKind {
        name: name.to_string(),
        expected,
    }
}
