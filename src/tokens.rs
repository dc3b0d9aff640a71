use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::borrow::Cow;

use crate::errors::ImportError;
use crate::types::{Index, Position};

/// Any run of bytes that are not a space, tab, CR, LF, NUL or non-ASCII.
/// Non-ASCII bytes split tokens just like whitespace does.
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)[^ \t\r\n\x00\x80-\xFF]+").expect("token pattern is valid"));

/// Split raw file contents into whitespace delimited tokens.
/// There is no comment or quoting syntax.
pub fn tokenize(contents: &[u8]) -> Vec<Cow<'_, str>> {
    TOKEN
        .find_iter(contents)
        .map(|m| String::from_utf8_lossy(m.as_bytes()))
        .collect()
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Positional, bounds checked access to the token stream.
/// Running off the end is an [ImportError], never a panic.
pub(crate) struct Tokens<'a> {
    tokens: &'a [Cow<'a, str>],
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(tokens: &'a [Cow<'a, str>]) -> Self {
        Tokens { tokens }
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn get(&self, index: Index, expected: &'static str) -> Result<&'a str, ImportError> {
        self.tokens
            .get(index)
            .map(|token| token.as_ref())
            .ok_or(ImportError::UnexpectedEof { index, expected })
    }

    /// Fail unless the token at `index` is exactly `keyword`.
    pub(crate) fn expect(&self, index: Index, keyword: &'static str) -> Result<(), ImportError> {
        let found = self.get(index, keyword)?;
        if found == keyword {
            Ok(())
        } else {
            Err(ImportError::UnexpectedToken {
                index,
                expected: keyword,
                found: found.to_string(),
            })
        }
    }

    pub(crate) fn number(&self, index: Index) -> Result<f64, ImportError> {
        let token = self.get(index, "a number")?;
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ImportError::InvalidNumber {
                index,
                token: token.to_string(),
            }),
        }
    }

    /// Three consecutive numbers starting at `index`.
    pub(crate) fn vector(&self, index: Index) -> Result<Position, ImportError> {
        Ok(Position::new(
            self.number(index)?,
            self.number(index + 1)?,
            self.number(index + 2)?,
        ))
    }
}
