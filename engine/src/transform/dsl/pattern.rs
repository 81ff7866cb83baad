//! Directive patterns and the matcher that binds tokens to them.
//!
//! ```text
//! <name>        mandatory argument
//! [ ... ]       optional group, may nest
//! word          literal keyword the input must repeat exactly
//! ```
//!
//! Matching walks pattern and input in lockstep. Optional groups are tried
//! against the remaining input; when they fail nothing is bound and no input
//! is consumed. A successful optional group is never revisited, so
//! `[<a>] <b>` against a single token fails rather than backtracking.

use std::collections::HashMap;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{PatternError, PatternResult};

/// Raw bindings produced by a successful match: parameter name → token.
pub type Bindings = HashMap<String, String>;

/// One element of a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    Mandatory(String),
    Literal(String),
    Optional(Vec<PatternToken>),
}

/// A parsed directive pattern such as `encode <type> <column>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    tokens: Vec<PatternToken>,
}

impl Pattern {
    pub fn new(tokens: Vec<PatternToken>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> PatternResult<Self> {
        let mut chars = pattern.char_indices().peekable();
        let tokens = parse_sequence(&mut chars, pattern, false)?;
        Ok(Self { tokens })
    }

    /// Match already tokenized input, requiring both sides to be fully consumed.
    pub fn matches(&self, input: &[String]) -> PatternResult<Bindings> {
        let mut bindings = Bindings::new();
        let consumed = match_sequence(&self.tokens, input, &mut bindings)
            .map_err(|reason| self.mismatch(reason))?;

        if let Some(extra) = input.get(consumed) {
            return Err(self.mismatch(format!("unexpected '{}'", extra)));
        }
        Ok(bindings)
    }

    fn mismatch(&self, reason: String) -> PatternError {
        PatternError::Mismatch {
            pattern: self.to_string(),
            reason,
        }
    }
}

/// Returns the number of input tokens consumed, or why matching failed.
fn match_sequence(
    tokens: &[PatternToken],
    input: &[String],
    bindings: &mut Bindings,
) -> Result<usize, String> {
    let mut pos = 0;

    for token in tokens {
        match token {
            PatternToken::Optional(inner) => {
                let remaining = input.get(pos..).unwrap_or_default();
                let mut scratch = Bindings::new();
                if let Ok(consumed) = match_sequence(inner, remaining, &mut scratch) {
                    bindings.extend(scratch);
                    pos += consumed;
                }
            }
            PatternToken::Mandatory(name) => {
                let value = input
                    .get(pos)
                    .ok_or_else(|| format!("missing value for <{}>", name))?;
                bindings.insert(name.clone(), value.clone());
                pos += 1;
            }
            PatternToken::Literal(word) => match input.get(pos) {
                Some(found) if found == word => pos += 1,
                Some(found) => return Err(format!("expected '{}', found '{}'", word, found)),
                None => return Err(format!("expected '{}'", word)),
            },
        }
    }

    Ok(pos)
}

fn parse_sequence(
    chars: &mut Peekable<CharIndices<'_>>,
    pattern: &str,
    nested: bool,
) -> PatternResult<Vec<PatternToken>> {
    let malformed = |message: String| PatternError::Malformed {
        pattern: pattern.to_string(),
        message,
    };
    let mut tokens = Vec::new();

    loop {
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let Some(&(offset, c)) = chars.peek() else {
            if nested {
                return Err(malformed("unclosed '['".to_string()));
            }
            return Ok(tokens);
        };

        match c {
            ']' => {
                chars.next();
                if !nested {
                    return Err(malformed(format!("unexpected ']' at offset {}", offset)));
                }
                return Ok(tokens);
            }
            '[' => {
                chars.next();
                let inner = parse_sequence(chars, pattern, true)?;
                if inner.is_empty() {
                    return Err(malformed(format!("empty optional group at offset {}", offset)));
                }
                tokens.push(PatternToken::Optional(inner));
            }
            '<' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '>')) => break,
                        Some((_, c)) if c.is_whitespace() || matches!(c, '<' | '[' | ']') => {
                            return Err(malformed(format!(
                                "invalid character '{}' in argument name",
                                c
                            )));
                        }
                        Some((_, c)) => name.push(c),
                        None => return Err(malformed("unclosed '<'".to_string())),
                    }
                }
                if name.is_empty() {
                    return Err(malformed(format!("empty argument name at offset {}", offset)));
                }
                tokens.push(PatternToken::Mandatory(name));
            }
            _ => {
                let mut word = String::new();
                while let Some((_, c)) =
                    chars.next_if(|(_, c)| !c.is_whitespace() && !matches!(*c, '[' | ']' | '<'))
                {
                    word.push(c);
                }
                tokens.push(PatternToken::Literal(word));
            }
        }
    }
}

impl fmt::Display for PatternToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternToken::Mandatory(name) => write!(f, "<{}>", name),
            PatternToken::Literal(word) => f.write_str(word),
            PatternToken::Optional(inner) => {
                f.write_str("[")?;
                write_tokens(f, inner)?;
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(f, &self.tokens)
    }
}

fn write_tokens(f: &mut fmt::Formatter<'_>, tokens: &[PatternToken]) -> fmt::Result {
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", token)?;
    }
    Ok(())
}
