//! Multi-commit stream produced by `git log --format=raw`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::commit::{CommitData, parse_header};
use super::{ParseError, Scanner, unquote_path};

#[allow(clippy::expect_used)]
static STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][0-9]*)\t([^\n]+)(?:\n|$)").expect("valid regex"));

/// Indentation git puts in front of every message line in raw log output.
const MESSAGE_INDENT: &str = "    ";

/// One file touched by a commit, from `--name-status` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    /// Status letter with optional score (`M`, `A`, `D`, `R100`, ...).
    pub status: String,
    /// One path, or source and destination for renames and copies.
    pub paths: Vec<String>,
}

impl FileStatus {
    /// The path as it exists after the commit.
    #[must_use]
    pub fn path(&self) -> &str {
        self.paths.last().map_or("", String::as_str)
    }
}

/// One commit of a log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Commit hash.
    pub hash: String,
    /// Decoded commit.
    pub commit: CommitData,
    /// Files touched, only filled when the log was run with `--name-status`.
    pub changes: Vec<FileStatus>,
}

/// Parse a raw log stream into records, in emission order.
///
/// # Errors
/// Returns a [`ParseError`] on the first record that breaks the grammar.
pub fn parse_log(input: &str) -> Result<Vec<LogRecord>, ParseError> {
    let mut s = Scanner::new(input);
    let mut records = Vec::new();

    skip_blank_lines(&mut s);
    while !s.is_finished() {
        s.consume("commit ")?;
        let hash = s.consume_hash()?.to_string();
        if !s.is_finished() {
            s.consume_newline()?;
        }

        let mut commit = parse_header(&mut s)?;
        commit.message = consume_message(&mut s);

        skip_blank_lines(&mut s);
        let mut changes = Vec::new();
        while !s.is_finished() && !s.peek("commit ") {
            let caps = s.consume_regex(&STATUS)?;
            changes.push(FileStatus {
                status: caps[1].to_string(),
                paths: caps[2]
                    .split('\t')
                    .map(|p| unquote_path(p).to_string())
                    .collect(),
            });
            skip_blank_lines(&mut s);
        }

        records.push(LogRecord {
            hash,
            commit,
            changes,
        });
    }

    Ok(records)
}

/// Message lines are indented by four spaces; an empty line in the middle
/// of a message is tolerated if the message continues after it.
fn consume_message(s: &mut Scanner<'_>) -> String {
    let mut message = String::new();
    loop {
        if s.expect(MESSAGE_INDENT) {
            message.push_str(s.consume_line());
            message.push('\n');
        } else if s.peek("\n    ") {
            s.consume_line();
            message.push('\n');
        } else {
            break;
        }
    }
    message
}

fn skip_blank_lines(s: &mut Scanner<'_>) {
    while s.expect("\n") {}
}
