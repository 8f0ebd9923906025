//! Strict parser for the name-to-ID mapping literals in `S` and `E` lines
//!
//! Grammar:
//!
//! ```text
//! mapping := '{' [ entry { ',' entry } [ ',' ] ] '}'
//! entry   := string ':' integer
//! string  := '"' chars '"' | '\'' chars '\''
//! ```
//!
//! Names may contain backslash escapes. Nothing else is accepted.

use crate::types::{LogError, Result};
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::CharIndices;

/// Parse a mapping literal into `(name, id)` pairs in source order
pub fn parse_id_mapping(text: &str) -> Result<Vec<(String, u32)>> {
    let mut parser = Parser {
        text,
        chars: text.char_indices().peekable(),
    };
    let entries = parser.mapping()?;

    let mut seen = HashSet::new();
    for (name, _) in &entries {
        if !seen.insert(name.as_str()) {
            return Err(LogError::DuplicateName(name.clone()));
        }
    }

    Ok(entries)
}

struct Parser<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn mapping(&mut self) -> Result<Vec<(String, u32)>> {
        let mut entries = Vec::new();

        self.expect('{')?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('}') => {
                    self.chars.next();
                    break;
                }
                Some(_) => {}
                None => return Err(self.error("unterminated mapping")),
            }

            let name = self.string()?;
            self.expect(':')?;
            let id = self.integer()?;
            entries.push((name, id));

            self.skip_whitespace();
            match self.chars.next() {
                Some((_, ',')) => continue,
                Some((_, '}')) => break,
                Some((pos, c)) => {
                    return Err(self.error(&format!("unexpected {:?} at offset {}", c, pos)))
                }
                None => return Err(self.error("unterminated mapping")),
            }
        }

        self.skip_whitespace();
        if let Some((pos, c)) = self.chars.next() {
            return Err(self.error(&format!("trailing {:?} at offset {}", c, pos)));
        }
        Ok(entries)
    }

    fn string(&mut self) -> Result<String> {
        self.skip_whitespace();
        let quote = match self.chars.next() {
            Some((_, q @ ('"' | '\''))) => q,
            Some((pos, c)) => {
                return Err(self.error(&format!("expected quoted name at offset {}, found {:?}", pos, c)))
            }
            None => return Err(self.error("expected quoted name")),
        };

        let mut name = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, c)) => name.push(c),
                    None => return Err(self.error("unterminated escape")),
                },
                Some((_, c)) if c == quote => return Ok(name),
                Some((_, c)) => name.push(c),
                None => return Err(self.error("unterminated name")),
            }
        }
    }

    fn integer(&mut self) -> Result<u32> {
        self.skip_whitespace();
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        digits
            .parse::<u32>()
            .map_err(|_| self.error(&format!("expected integer ID, found {:?}", digits)))
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((pos, c)) => Err(self.error(&format!(
                "expected {:?} at offset {}, found {:?}",
                expected, pos, c
            ))),
            None => Err(self.error(&format!("expected {:?}", expected))),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn error(&self, reason: &str) -> LogError {
        LogError::InvalidIdTable(format!("{} in {:?}", reason, self.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_quoted_mapping() {
        let entries = parse_id_mapping("{'wait_for_poke': 1, 'reward': 2}").unwrap();
        assert_eq!(
            entries,
            vec![("wait_for_poke".to_string(), 1), ("reward".to_string(), 2)]
        );
    }

    #[test]
    fn test_double_quoted_compact_mapping() {
        let entries = parse_id_mapping(r#"{"init":1}"#).unwrap();
        assert_eq!(entries, vec![("init".to_string(), 1)]);
    }

    #[test]
    fn test_empty_and_trailing_comma() {
        assert!(parse_id_mapping("{}").unwrap().is_empty());
        assert!(parse_id_mapping("  { }  ").unwrap().is_empty());
        assert_eq!(parse_id_mapping("{'a': 3,}").unwrap().len(), 1);
    }

    #[test]
    fn test_escaped_quote_in_name() {
        let entries = parse_id_mapping(r"{'it\'s': 4}").unwrap();
        assert_eq!(entries[0].0, "it's");
    }

    #[test]
    fn test_rejects_expressions() {
        for text in [
            "{'a': 1 + 1}",
            "{'a': __import__('os')}",
            "dict(a=1)",
            "{'a': -1}",
            "{a: 1}",
            "{'a': 1} extra",
            "{'a': 1",
        ] {
            let result = parse_id_mapping(text);
            assert!(
                matches!(result, Err(LogError::InvalidIdTable(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = parse_id_mapping("{'a': 1, 'a': 2}");
        assert!(matches!(result, Err(LogError::DuplicateName(name)) if name == "a"));
    }
}
