//! Recipe line tokenizer.
//!
//! Splits on whitespace, except inside single or double quotes. Quote
//! characters are stripped and `\'` / `\"` decode to the bare quote, so
//! `set-column msg 'it\'s here'` yields `["set-column", "msg", "it's here"]`.

use crate::error::TokenizeError;

/// Split one recipe line into tokens.
pub fn tokenize(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Distinguishes an empty quoted token ('') from no token at all.
    let mut in_token = false;
    let mut quote: Option<(char, usize)> = None;
    let mut chars = line.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c == '\\' {
            if let Some(&(_, next)) = chars.peek() {
                if next == '\'' || next == '"' {
                    current.push(next);
                    in_token = true;
                    chars.next();
                    continue;
                }
            }
        }

        if let Some((open, _)) = quote {
            if c == open {
                quote = None;
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some((c, offset));
                in_token = true;
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if let Some((quote, offset)) = quote {
        return Err(TokenizeError::UnterminatedQuote { quote, offset });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_whitespace() {
        assert_eq!(
            tokenize("  rename   old\tnew ").unwrap(),
            vec!["rename", "old", "new"]
        );
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_quoted_span_is_one_token() {
        assert_eq!(tokenize("'a b'").unwrap(), vec!["a b"]);
        assert_eq!(
            tokenize(r#"filter-row-if-true "age > 30""#).unwrap(),
            vec!["filter-row-if-true", "age > 30"]
        );
    }

    #[test]
    fn test_escaped_quotes_decode() {
        assert_eq!(tokenize(r"'it\'s'").unwrap(), vec!["it's"]);
        assert_eq!(tokenize(r#"say \"hi\""#).unwrap(), vec!["say", "\"hi\""]);
    }

    #[test]
    fn test_other_quote_kind_is_literal_inside_quotes() {
        assert_eq!(tokenize(r#""'x y'""#).unwrap(), vec!["'x y'"]);
    }

    #[test]
    fn test_empty_quoted_token_is_kept() {
        assert_eq!(tokenize("replace col ''").unwrap(), vec!["replace", "col", ""]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            tokenize("set-column x 'oops"),
            Err(TokenizeError::UnterminatedQuote { quote: '\'', offset: 13 })
        );
    }
}
