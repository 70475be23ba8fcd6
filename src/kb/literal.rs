//! Strict parser for the serialized collection columns of the knowledge
//! base file.
//!
//! The `reactions` and `severities` columns hold flat collection literals
//! of quoted strings — `{'cough', 'rash'}` or `["cough", "rash"]` — as
//! written out by the upstream dataset builder. This parser accepts exactly
//! that grammar and nothing else: no nesting, no bare words, no numbers,
//! no expressions. Malformed input is rejected with a positioned error
//! instead of ever being evaluated.
//!
//! Grammar:
//! ```text
//! collection := "set()" | "{" items? "}" | "[" items? "]"
//! items      := string ("," string)* ","?
//! string     := "'" chars "'" | '"' chars '"'   (backslash escapes allowed)
//! ```

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LiteralError {
    #[error("empty input")]
    Empty,
    #[error("expected '{{' or '[' at position {0}")]
    BadOpener(usize),
    #[error("unterminated string starting at position {0}")]
    UnterminatedString(usize),
    #[error("invalid escape '\\{1}' at position {0}")]
    BadEscape(usize, char),
    #[error("expected ',' or closing delimiter at position {0}")]
    BadSeparator(usize),
    #[error("expected string at position {0}")]
    ExpectedString(usize),
    #[error("missing closing delimiter")]
    Unclosed,
    #[error("trailing content after collection at position {0}")]
    TrailingContent(usize),
}

/// Parse a serialized collection literal into its member strings.
///
/// Duplicates are preserved here; callers deduplicate into sets.
pub fn parse_string_collection(input: &str) -> Result<Vec<String>, LiteralError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LiteralError::Empty);
    }
    // Empty-set spelling used by the upstream writer when a drug has no
    // recorded reactions.
    if trimmed == "set()" {
        return Ok(vec![]);
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let closer = match chars[0] {
        '{' => '}',
        '[' => ']',
        _ => return Err(LiteralError::BadOpener(0)),
    };

    let mut items = Vec::new();
    let mut pos = 1;
    let mut expecting_item = true;
    loop {
        pos = skip_ws(&chars, pos);
        let Some(&c) = chars.get(pos) else {
            return Err(LiteralError::Unclosed);
        };
        if c == closer {
            pos += 1;
            break;
        }
        if !expecting_item {
            if c == ',' {
                pos += 1;
                expecting_item = true;
                continue;
            }
            return Err(LiteralError::BadSeparator(pos));
        }
        let (value, next) = parse_string(&chars, pos)?;
        items.push(value);
        pos = next;
        expecting_item = false;
    }

    let pos = skip_ws(&chars, pos);
    if pos != chars.len() {
        return Err(LiteralError::TrailingContent(pos));
    }
    Ok(items)
}

fn skip_ws(chars: &[char], mut pos: usize) -> usize {
    while chars.get(pos).is_some_and(|c| c.is_whitespace()) {
        pos += 1;
    }
    pos
}

fn parse_string(chars: &[char], start: usize) -> Result<(String, usize), LiteralError> {
    let quote = match chars.get(start) {
        Some(&q) if q == '\'' || q == '"' => q,
        _ => return Err(LiteralError::ExpectedString(start)),
    };
    let mut out = String::new();
    let mut pos = start + 1;
    loop {
        match chars.get(pos) {
            None => return Err(LiteralError::UnterminatedString(start)),
            Some(&c) if c == quote => return Ok((out, pos + 1)),
            Some('\\') => {
                let esc = chars
                    .get(pos + 1)
                    .ok_or(LiteralError::UnterminatedString(start))?;
                match esc {
                    '\\' | '\'' | '"' => out.push(*esc),
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    other => return Err(LiteralError::BadEscape(pos, *other)),
                }
                pos += 2;
            }
            Some(&c) => {
                out.push(c);
                pos += 1;
            }
        }
    }
}
