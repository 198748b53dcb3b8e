//! Parsers for git's plumbing output.
//!
//! Every parser works on one fully buffered string through a [`Scanner`]:
//! a read-only buffer plus a byte cursor, advanced by small grammar
//! productions (`expect`, `consume`, `consume_to`, `consume_regex`).

pub mod blame;
pub mod commit;
pub mod diff;
pub mod log;
pub mod reference;
pub mod remote;
pub mod tree;

use std::sync::LazyLock;

use regex::{Captures, Regex};

pub use blame::{BlameCommitInfo, BlameOutput, BlameRecord, parse_blame};
pub use commit::{CommitData, parse_commit};
pub use diff::parse_diff;
pub use log::{FileStatus, LogRecord, parse_log};
pub use reference::parse_references;
pub use remote::{RemoteLine, parse_remotes};
pub use tree::{EntryKind, TreeEntry, parse_tree};

/// Longest excerpt of the input kept in a [`ParseError`].
const EXCERPT_LEN: usize = 40;

#[allow(clippy::expect_used)]
static HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}(?:[0-9a-f]{24})?").expect("valid regex"));

/// git output did not match the expected grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at byte {position}: expected {expected}, found {found:?}")]
pub struct ParseError {
    /// Byte offset of the failure in the parsed buffer.
    pub position: usize,
    /// What the grammar expected at that position.
    pub expected: String,
    /// Excerpt of the input at that position.
    pub found: String,
}

/// Cursor over an immutable text buffer.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner positioned at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    /// Current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// True once the cursor reached the end of the buffer.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.cursor >= self.input.len()
    }

    /// Unconsumed remainder of the buffer.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    /// True if the remainder starts with `literal`. Never consumes.
    #[must_use]
    pub fn peek(&self, literal: &str) -> bool {
        self.rest().starts_with(literal)
    }

    /// Consume `literal` if the remainder starts with it.
    pub fn expect(&mut self, literal: &str) -> bool {
        if self.peek(literal) {
            self.cursor += literal.len();
            true
        } else {
            false
        }
    }

    /// Consume `literal`, failing if it is not next.
    ///
    /// # Errors
    /// Returns a [`ParseError`] when the remainder does not start with `literal`.
    pub fn consume(&mut self, literal: &str) -> Result<(), ParseError> {
        if self.expect(literal) {
            Ok(())
        } else {
            Err(self.error(format!("{literal:?}")))
        }
    }

    /// Consume text up to (not including) `delimiter`.
    ///
    /// # Errors
    /// Returns a [`ParseError`] when `delimiter` does not occur in the remainder.
    pub fn consume_to(&mut self, delimiter: &str) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let Some(end) = rest.find(delimiter) else {
            return Err(self.error(format!("text terminated by {delimiter:?}")));
        };
        self.cursor += end;
        Ok(&rest[..end])
    }

    /// Consume one line: everything to the next newline (consumed, not
    /// returned) or to the end of the buffer.
    pub fn consume_line(&mut self) -> &'a str {
        let rest = self.rest();
        match rest.find('\n') {
            Some(end) => {
                self.cursor += end + 1;
                &rest[..end]
            }
            None => {
                self.cursor = self.input.len();
                rest
            }
        }
    }

    /// Match `pattern` at the cursor and consume the whole match.
    ///
    /// The pattern must be anchored with `^`; it is applied to the remainder.
    ///
    /// # Errors
    /// Returns a [`ParseError`] when the pattern does not match at the cursor.
    pub fn consume_regex(&mut self, pattern: &Regex) -> Result<Captures<'a>, ParseError> {
        let rest = self.rest();
        match pattern.captures(rest) {
            Some(caps) if caps.get(0).is_some_and(|m| m.start() == 0) => {
                self.cursor += caps.get(0).map_or(0, |m| m.end());
                Ok(caps)
            }
            _ => Err(self.error(format!("pattern /{}/", pattern.as_str()))),
        }
    }

    /// Consume an object name (40 hex chars, or 64 for SHA-256 repositories).
    ///
    /// # Errors
    /// Returns a [`ParseError`] when no hash is at the cursor.
    pub fn consume_hash(&mut self) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let caps = self
            .consume_regex(&HASH)
            .map_err(|_| self.error("object hash".to_string()))?;
        let len = caps.get(0).map_or(0, |m| m.end());
        Ok(&rest[..len])
    }

    /// Consume a single `\n`.
    ///
    /// # Errors
    /// Returns a [`ParseError`] when the next character is not a newline.
    pub fn consume_newline(&mut self) -> Result<(), ParseError> {
        self.consume("\n")
    }

    /// Consume and return everything left.
    pub fn consume_all(&mut self) -> &'a str {
        let rest = self.rest();
        self.cursor = self.input.len();
        rest
    }

    /// Build an error at the current position.
    #[must_use]
    pub fn error(&self, expected: String) -> ParseError {
        let found: String = self.rest().chars().take(EXCERPT_LEN).collect();
        ParseError {
            position: self.cursor,
            expected,
            found,
        }
    }
}

/// Strip the surrounding double quotes git puts around paths with unusual
/// characters. Escape sequences inside are kept as emitted.
#[must_use]
pub fn unquote_path(path: &str) -> &str {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}

/// True if `value` is a full object name.
#[must_use]
pub fn is_hash(value: &str) -> bool {
    HASH.find(value).is_some_and(|m| m.end() == value.len())
}

/// True for the all-zero object name git uses for "no object".
#[must_use]
pub fn is_null_hash(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b == b'0')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_and_consume() {
        let mut s = Scanner::new("tree abc\n");
        assert!(!s.expect("parent "));
        assert!(s.expect("tree "));
        assert_eq!(s.consume_to("\n").unwrap(), "abc");
        s.consume_newline().unwrap();
        assert!(s.is_finished());
    }

    #[test]
    fn test_consume_failure_reports_position() {
        let mut s = Scanner::new("tree abc");
        s.consume("tree ").unwrap();
        let err = s.consume("parent ").unwrap_err();
        assert_eq!(err.position, 5);
        assert_eq!(err.expected, "\"parent \"");
        assert_eq!(err.found, "abc");
    }

    #[test]
    fn test_consume_to_missing_delimiter() {
        let mut s = Scanner::new("no newline");
        assert!(s.consume_to("\n").is_err());
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn test_consume_line_without_trailing_newline() {
        let mut s = Scanner::new("one\ntwo");
        assert_eq!(s.consume_line(), "one");
        assert_eq!(s.consume_line(), "two");
        assert!(s.is_finished());
    }

    #[test]
    fn test_consume_regex_is_anchored() {
        let re = Regex::new(r"^(\d+)%").unwrap();
        let mut s = Scanner::new("x 100%");
        assert!(s.consume_regex(&re).is_err());
        s.consume("x ").unwrap();
        let caps = s.consume_regex(&re).unwrap();
        assert_eq!(&caps[1], "100");
        assert!(s.is_finished());
    }

    #[test]
    fn test_consume_hash() {
        let hash = "a".repeat(40);
        let input = format!("{hash} rest");
        let mut s = Scanner::new(&input);
        assert_eq!(s.consume_hash().unwrap(), hash);
        assert!(s.peek(" rest"));

        let mut short = Scanner::new("abc123 x");
        assert!(short.consume_hash().is_err());
    }

    #[test]
    fn test_is_hash() {
        assert!(is_hash(&"0".repeat(40)));
        assert!(is_hash(&"f".repeat(64)));
        assert!(!is_hash(&"f".repeat(41)));
        assert!(!is_hash("HEAD"));
    }

    #[test]
    fn test_unquote_path() {
        assert_eq!(unquote_path("\"a/t\\303\\244\""), "a/t\\303\\244");
        assert_eq!(unquote_path("a/plain"), "a/plain");
    }
}
