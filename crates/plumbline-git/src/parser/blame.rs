//! `git blame -p` porcelain output.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{ParseError, Scanner};

#[allow(clippy::expect_used)]
static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-f]{40}(?:[0-9a-f]{24})?) (\d+) (\d+)(?: \d+)?\n").expect("valid regex")
});

/// Commit metadata printed on the first occurrence of a hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlameCommitInfo {
    pub author: String,
    pub author_mail: String,
    pub author_time: i64,
    pub author_tz: String,
    pub committer: String,
    pub committer_mail: String,
    pub committer_time: i64,
    pub committer_tz: String,
    pub summary: String,
    /// `<hash> <path>` of the previous version, when there is one.
    pub previous: Option<String>,
    pub filename: String,
    /// The commit is a boundary of the blamed range.
    pub boundary: bool,
}

/// One blamed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameRecord {
    pub hash: String,
    /// Line number in the commit that introduced the line.
    pub original_line: usize,
    /// Line number in the blamed file (1-based).
    pub final_line: usize,
    pub content: String,
}

/// Everything decoded from one porcelain run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlameOutput {
    pub records: Vec<BlameRecord>,
    pub commits: HashMap<String, BlameCommitInfo>,
}

/// Parse porcelain blame output.
///
/// # Errors
/// Returns a [`ParseError`] when a block header or content line is malformed.
pub fn parse_blame(input: &str) -> Result<BlameOutput, ParseError> {
    let mut s = Scanner::new(input);
    let mut output = BlameOutput::default();

    while !s.is_finished() {
        let caps = s.consume_regex(&BLOCK)?;
        let hash = caps[1].to_string();
        let original_line = parse_number(&s, &caps[2])?;
        let final_line = parse_number(&s, &caps[3])?;

        let info = output.commits.entry(hash.clone()).or_default();
        while !s.peek("\t") {
            if s.is_finished() {
                return Err(s.error("tab-prefixed content line".to_string()));
            }
            let line_start = s.clone();
            let line = s.consume_line();
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            apply_metadata(&line_start, info, key, value)?;
        }

        s.consume("\t")?;
        let content = s.consume_line().to_string();

        output.records.push(BlameRecord {
            hash,
            original_line,
            final_line,
            content,
        });
    }

    Ok(output)
}

fn apply_metadata(
    s: &Scanner<'_>,
    info: &mut BlameCommitInfo,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    let timestamp = || -> Result<i64, ParseError> {
        value
            .parse()
            .map_err(|_| s.error(format!("unix timestamp after \"{key}\"")))
    };
    let value = value.to_string();
    match key {
        "author" => info.author = value,
        "author-mail" => info.author_mail = trim_mail(&value),
        "author-time" => info.author_time = timestamp()?,
        "author-tz" => info.author_tz = value,
        "committer" => info.committer = value,
        "committer-mail" => info.committer_mail = trim_mail(&value),
        "committer-time" => info.committer_time = timestamp()?,
        "committer-tz" => info.committer_tz = value,
        "summary" => info.summary = value,
        "previous" => info.previous = Some(value),
        "filename" => info.filename = value,
        "boundary" => info.boundary = true,
        other => tracing::trace!(key = other, "ignoring blame metadata"),
    }
    Ok(())
}

fn trim_mail(value: &str) -> String {
    value
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_string()
}

fn parse_number(s: &Scanner<'_>, text: &str) -> Result<usize, ParseError> {
    text.parse()
        .map_err(|_| s.error("line number".to_string()))
}
