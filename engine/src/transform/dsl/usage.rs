//! Usage definitions: the declared grammar of a directive.
//!
//! A [`UsageDefinition`] lists a directive's parameters with their kinds,
//! interleaved with literal keywords and optional groups. It renders to the
//! pattern string shown to users and produces the [`Pattern`] the recipe
//! parser matches against.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::arguments::{coerce, Arguments, TokenKind};
use super::pattern::{Bindings, Pattern, PatternToken};
use crate::error::{ArgumentError, ArgumentResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum UsageToken {
    Param { name: String, kind: TokenKind },
    Keyword(String),
    Optional(Vec<UsageToken>),
}

/// Flattened view of one declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub kind: TokenKind,
    /// False when the parameter sits inside an optional group.
    pub required: bool,
}

/// The declared grammar of one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageDefinition {
    directive: String,
    tokens: Vec<UsageToken>,
}

impl UsageDefinition {
    pub fn builder(directive: impl Into<String>) -> UsageBuilder {
        UsageBuilder {
            directive: directive.into(),
            tokens: Vec::new(),
        }
    }

    /// Directive name; also the leading literal of the pattern.
    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut params = Vec::new();
        collect_parameters(&self.tokens, true, &mut params);
        params
    }

    pub fn kind_of(&self, name: &str) -> Option<TokenKind> {
        self.parameters()
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| p.kind)
    }

    /// Pattern including the directive name as its first literal.
    pub fn pattern(&self) -> Pattern {
        let mut tokens = vec![PatternToken::Literal(self.directive.clone())];
        tokens.extend(self.tokens.iter().map(to_pattern_token));
        Pattern::new(tokens)
    }

    /// Coerce raw bindings into typed [`Arguments`].
    ///
    /// Fails on a missing required parameter or a value that does not
    /// coerce to its declared kind.
    pub fn bind(&self, bindings: &Bindings, line: &str) -> ArgumentResult<Arguments> {
        let mut values = HashMap::new();
        for param in self.parameters() {
            match bindings.get(&param.name) {
                Some(raw) => {
                    values.insert(param.name.clone(), coerce(param.kind, &param.name, raw)?);
                }
                None if param.required => return Err(ArgumentError::Missing(param.name)),
                None => {}
            }
        }
        Ok(Arguments::new(values, line))
    }
}

impl fmt::Display for UsageDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern())
    }
}

fn collect_parameters(tokens: &[UsageToken], required: bool, out: &mut Vec<Parameter>) {
    for token in tokens {
        match token {
            UsageToken::Param { name, kind } => out.push(Parameter {
                name: name.clone(),
                kind: *kind,
                required,
            }),
            UsageToken::Keyword(_) => {}
            UsageToken::Optional(inner) => collect_parameters(inner, false, out),
        }
    }
}

fn to_pattern_token(token: &UsageToken) -> PatternToken {
    match token {
        UsageToken::Param { name, .. } => PatternToken::Mandatory(name.clone()),
        UsageToken::Keyword(word) => PatternToken::Literal(word.clone()),
        UsageToken::Optional(inner) => {
            PatternToken::Optional(inner.iter().map(to_pattern_token).collect())
        }
    }
}

/// Builder for [`UsageDefinition`].
///
/// ```rust,ignore
/// let usage = UsageDefinition::builder("copy")
///     .define("source", TokenKind::ColumnName)
///     .define("destination", TokenKind::ColumnName)
///     .define_optional("force", TokenKind::Boolean)
///     .build();
/// assert_eq!(usage.to_string(), "copy <source> <destination> [<force>]");
/// ```
#[derive(Debug, Clone)]
pub struct UsageBuilder {
    directive: String,
    tokens: Vec<UsageToken>,
}

impl UsageBuilder {
    /// Required parameter.
    pub fn define(mut self, name: impl Into<String>, kind: TokenKind) -> Self {
        self.tokens.push(UsageToken::Param {
            name: name.into(),
            kind,
        });
        self
    }

    /// Optional parameter in its own group.
    pub fn define_optional(self, name: impl Into<String>, kind: TokenKind) -> Self {
        let name = name.into();
        self.optional(|group| group.define(name, kind))
    }

    /// Literal keyword.
    pub fn keyword(mut self, word: impl Into<String>) -> Self {
        self.tokens.push(UsageToken::Keyword(word.into()));
        self
    }

    /// Optional group built by `group`, which may nest further groups.
    pub fn optional(mut self, group: impl FnOnce(UsageBuilder) -> UsageBuilder) -> Self {
        let inner = group(UsageBuilder {
            directive: self.directive.clone(),
            tokens: Vec::new(),
        });
        if !inner.tokens.is_empty() {
            self.tokens.push(UsageToken::Optional(inner.tokens));
        }
        self
    }

    pub fn build(self) -> UsageDefinition {
        UsageDefinition {
            directive: self.directive,
            tokens: self.tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::dsl::arguments::ArgValue;
    use crate::transform::dsl::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn encode_usage() -> UsageDefinition {
        UsageDefinition::builder("encode")
            .define("type", TokenKind::Identifier)
            .define("column", TokenKind::ColumnName)
            .build()
    }

    #[test]
    fn test_render() {
        assert_eq!(encode_usage().to_string(), "encode <type> <column>");

        let usage = UsageDefinition::builder("split")
            .define("column", TokenKind::ColumnName)
            .optional(|g| {
                g.keyword("by")
                    .define("separator", TokenKind::Text)
                    .define_optional("limit", TokenKind::Number)
            })
            .build();
        assert_eq!(usage.to_string(), "split <column> [by <separator> [<limit>]]");
    }

    #[test]
    fn test_render_and_reparse_is_equivalent() {
        let usage = UsageDefinition::builder("cast")
            .define("column", TokenKind::ColumnName)
            .optional(|g| g.keyword("with").define("format", TokenKind::Text))
            .keyword("as")
            .define("type", TokenKind::Identifier)
            .build();
        let reparsed = Pattern::parse(&usage.to_string()).unwrap();
        assert_eq!(reparsed, usage.pattern());
    }

    #[test]
    fn test_parameters_flatten_required_flag() {
        let usage = UsageDefinition::builder("sample")
            .define("percentage", TokenKind::Number)
            .define_optional("seed", TokenKind::Number)
            .build();
        let params = usage.parameters();
        assert_eq!(params.len(), 2);
        assert!(params[0].required);
        assert!(!params[1].required);
        assert_eq!(usage.kind_of("seed"), Some(TokenKind::Number));
    }

    #[test]
    fn test_bind_end_to_end() {
        let usage = encode_usage();
        let line = "encode base64 body";
        let bindings = usage.pattern().matches(&tokenize(line).unwrap()).unwrap();
        let args = usage.bind(&bindings, line).unwrap();
        assert_eq!(args.value("type"), Some(&ArgValue::Identifier("base64".into())));
        assert_eq!(args.str("column").unwrap(), "body");
    }

    #[test]
    fn test_bind_rejects_bad_number() {
        let usage = UsageDefinition::builder("sample")
            .define("percentage", TokenKind::Number)
            .build();
        let line = "sample lots";
        let bindings = usage.pattern().matches(&tokenize(line).unwrap()).unwrap();
        assert!(matches!(
            usage.bind(&bindings, line),
            Err(ArgumentError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_bind_reports_missing_required() {
        let usage = encode_usage();
        let mut bindings = Bindings::new();
        bindings.insert("type".into(), "hex".into());
        assert_eq!(
            usage.bind(&bindings, "encode hex"),
            Err(ArgumentError::Missing("column".into()))
        );
    }
}
