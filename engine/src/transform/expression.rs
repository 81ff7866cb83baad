//! Row expressions for `set-variable`, `filter-row-if-true` and friends.
//!
//! Expressions are compiled once when the directive is initialized and
//! evaluated per row. The evaluation scope holds every column whose name is
//! a valid identifier (first occurrence wins), followed by every transient
//! variable, so a variable shadows a column of the same name.

use once_cell::sync::Lazy;
use regex::Regex;
use rhai::{Dynamic, Engine, Scope, AST};

use super::context::TransientStore;
use crate::error::{DirectiveError, DirectiveResult};
use crate::models::{Row, Value};

static ENGINE: Lazy<Engine> = Lazy::new(Engine::new);

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid")
});

/// A compiled expression.
#[derive(Debug, Clone, Default)]
pub struct Expression {
    source: String,
    ast: AST,
}

impl Expression {
    /// Compile `source`; the error string describes the syntax problem.
    pub fn compile(source: &str) -> Result<Self, String> {
        let ast = ENGINE
            .compile_expression(source)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against one row and the current transient variables.
    pub fn evaluate(&self, row: &Row, store: &TransientStore) -> DirectiveResult<Value> {
        let mut scope = Scope::new();
        for (name, value) in row.iter() {
            if IDENTIFIER.is_match(name) && !scope.contains(name) {
                scope.push_dynamic(name.to_string(), to_dynamic(value));
            }
        }
        for (name, value) in store.iter() {
            scope.push_dynamic(name.to_string(), to_dynamic(value));
        }

        ENGINE
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
            .map(from_dynamic)
            .map_err(|e| self.failure(e.to_string()))
    }

    /// Evaluate a condition; anything other than a boolean result is an error.
    pub fn test(&self, row: &Row, store: &TransientStore) -> DirectiveResult<bool> {
        match self.evaluate(row, store)? {
            Value::Bool(b) => Ok(b),
            other => Err(self.failure(format!(
                "condition must evaluate to a boolean, got {}",
                other.type_name()
            ))),
        }
    }

    fn failure(&self, message: String) -> DirectiveError {
        DirectiveError::Expression {
            expression: self.source.clone(),
            message,
        }
    }
}

fn to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from_bool(*b),
        Value::Int(n) => Dynamic::from_int(*n),
        Value::Float(f) => Dynamic::from_float(*f),
        Value::String(s) => Dynamic::from(s.clone()),
        Value::Date(_) => Dynamic::from(value.as_text().unwrap_or_default()),
        Value::Bytes(b) => Dynamic::from(b.clone()),
        Value::List(items) => Dynamic::from_array(items.iter().map(to_dynamic).collect()),
        Value::Row(row) => {
            let mut map = rhai::Map::new();
            for (name, value) in row.iter() {
                map.entry(name.into()).or_insert_with(|| to_dynamic(value));
            }
            Dynamic::from_map(map)
        }
    }
}

fn from_dynamic(value: Dynamic) -> Value {
    if value.is_unit() {
        return Value::Null;
    }
    if let Ok(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Ok(n) = value.as_int() {
        return Value::Int(n);
    }
    if let Ok(f) = value.as_float() {
        return Value::Float(f);
    }
    if let Ok(c) = value.as_char() {
        return Value::String(c.to_string());
    }
    if value.is_string() {
        return Value::String(value.into_string().unwrap_or_default());
    }
    if value.is_blob() {
        return Value::Bytes(value.into_blob().unwrap_or_default());
    }
    if value.is_array() {
        let items = value.into_array().unwrap_or_default();
        return Value::List(items.into_iter().map(from_dynamic).collect());
    }
    if value.is_map() {
        let map = value.try_cast::<rhai::Map>().unwrap_or_default();
        return Value::Row(
            map.into_iter()
                .map(|(name, value)| (name.to_string(), from_dynamic(value)))
                .collect(),
        );
    }
    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_over_columns() {
        let expr = Expression::compile("age > 30").unwrap();
        let store = TransientStore::new();
        assert!(!expr.test(&Row::new().with("age", 25), &store).unwrap());
        assert!(expr.test(&Row::new().with("age", 35), &store).unwrap());
    }

    #[test]
    fn test_variables_shadow_columns() {
        let expr = Expression::compile("limit + 1").unwrap();
        let mut store = TransientStore::new();
        store.set("limit", 10);
        let row = Row::new().with("limit", 1);
        assert_eq!(expr.evaluate(&row, &store).unwrap(), Value::Int(11));
    }

    #[test]
    fn test_string_concat_and_invalid_identifiers_skipped() {
        let expr = Expression::compile(r#"first + " " + last"#).unwrap();
        let row = Row::new()
            .with("first", "Ada")
            .with("last", "Lovelace")
            .with("full name", "ignored");
        assert_eq!(
            expr.evaluate(&row, &TransientStore::new()).unwrap(),
            Value::from("Ada Lovelace")
        );
    }

    #[test]
    fn test_non_boolean_condition_fails() {
        let expr = Expression::compile("age + 1").unwrap();
        let err = expr
            .test(&Row::new().with("age", 1), &TransientStore::new())
            .unwrap_err();
        assert!(matches!(err, DirectiveError::Expression { .. }));
    }

    #[test]
    fn test_unknown_variable_is_an_error() {
        let expr = Expression::compile("age > 30").unwrap();
        let row = Row::new().with("years", 40);
        let err = expr.evaluate(&row, &TransientStore::new()).unwrap_err();
        assert!(matches!(err, DirectiveError::Expression { ref expression, .. } if expression == "age > 30"));
    }

    #[test]
    fn test_compile_error() {
        assert!(Expression::compile("age >").is_err());
    }
}
