//! Recipe parser: recipe lines → bound [`RecipePipeline`].
//!
//! ## Flow
//!
//! ```text
//! physical lines → logical lines (comments skipped, continuations joined)
//!                → tokenize → registry lookup → Pattern::matches
//!                → UsageDefinition::bind → factory → initialize
//! ```
//!
//! The first failing line aborts the parse; no partial pipeline is returned.

use tracing::debug;

use super::executor::{BoundDirective, RecipePipeline};
use super::dsl::tokenize;
use super::registry::DirectiveRegistry;
use crate::config::ParserOptions;
use crate::error::{RecipeError, RecipeResult};

/// One directive line after comment removal and continuation joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based number of the first physical line.
    pub line: usize,
    pub text: String,
}

/// Parses recipes against a directive registry.
pub struct RecipeParser<'r> {
    registry: &'r dyn DirectiveRegistry,
    options: ParserOptions,
}

impl<'r> RecipeParser<'r> {
    pub fn new(registry: &'r dyn DirectiveRegistry) -> Self {
        Self {
            registry,
            options: ParserOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse recipe text, one directive per line.
    pub fn parse_str(&self, recipe: &str) -> RecipeResult<RecipePipeline> {
        let lines: Vec<&str> = recipe.lines().collect();
        self.parse(&lines)
    }

    /// Parse ordered recipe lines.
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> RecipeResult<RecipePipeline> {
        let mut directives = Vec::new();
        for logical in self.logical_lines(lines)? {
            directives.push(self.bind(logical)?);
        }
        debug!(directives = directives.len(), "recipe parsed");
        Ok(RecipePipeline::new(directives))
    }

    /// Join continuations and drop blank and comment lines.
    ///
    /// A continued line joins the next line that is neither blank nor a
    /// comment.
    pub fn logical_lines<S: AsRef<str>>(&self, lines: &[S]) -> RecipeResult<Vec<LogicalLine>> {
        let marker = self.options.continuation_marker;
        let mut logical = Vec::new();
        let mut pending: Option<LogicalLine> = None;

        for (idx, raw) in lines.iter().enumerate() {
            let number = idx + 1;
            let trimmed = raw.as_ref().trim();

            // Skipped even inside a continuation, which stays open.
            if trimmed.is_empty() || self.is_comment(trimmed) {
                continue;
            }

            let (content, continues) = match trimmed.strip_suffix(marker) {
                Some(head) => (head.trim_end(), true),
                None => (trimmed, false),
            };

            let current = pending.get_or_insert_with(|| LogicalLine {
                line: number,
                text: String::new(),
            });
            if !content.is_empty() {
                if !current.text.is_empty() {
                    current.text.push(' ');
                }
                current.text.push_str(content);
            }

            if !continues {
                if let Some(done) = pending.take() {
                    if !done.text.is_empty() {
                        logical.push(done);
                    }
                }
            }
        }

        if let Some(open) = pending {
            return Err(RecipeError::parse(
                open.line,
                open.text,
                format!("line continuation '{}' at end of recipe", marker),
            ));
        }
        Ok(logical)
    }

    fn is_comment(&self, line: &str) -> bool {
        self.options
            .comment_prefixes
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()))
    }

    fn bind(&self, logical: LogicalLine) -> RecipeResult<BoundDirective> {
        let LogicalLine { line, text } = logical;
        let fail = |cause: &dyn std::fmt::Display| RecipeError::parse(line, text.clone(), cause);

        let tokens = tokenize(&text).map_err(|e| fail(&e))?;
        let name = tokens.first().cloned().unwrap_or_default();
        let info = self
            .registry
            .get(&name)
            .ok_or_else(|| RecipeError::DirectiveNotFound {
                line,
                name: name.clone(),
            })?;

        let usage = info.usage();
        let bindings = usage.pattern().matches(&tokens).map_err(|e| fail(&e))?;
        let arguments = usage.bind(&bindings, &text).map_err(|e| fail(&e))?;

        let mut directive = info.create();
        directive.initialize(&arguments).map_err(|e| fail(&e))?;

        debug!(line, directive = %name, "directive bound");
        Ok(BoundDirective {
            name,
            line,
            text,
            arguments,
            directive,
        })
    }
}
