//! `remote -v` listings.

use std::sync::LazyLock;

use regex::Regex;

use super::{ParseError, Scanner};

#[allow(clippy::expect_used)]
static REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+(\S+)\s+\((\w+)\)(?:\n|$)").expect("valid regex")
});

/// One `<name> <url> (<direction>)` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLine {
    pub name: String,
    pub url: String,
    /// `fetch` or `push`.
    pub direction: String,
}

/// Parse `remote -v` output, in emission order. Blank lines are skipped.
///
/// # Errors
/// Returns a [`ParseError`] when a line is not `name url (direction)`.
pub fn parse_remotes(input: &str) -> Result<Vec<RemoteLine>, ParseError> {
    let mut s = Scanner::new(input);
    let mut remotes = Vec::new();

    while !s.is_finished() {
        if s.expect("\n") {
            continue;
        }
        let caps = s.consume_regex(&REMOTE)?;
        remotes.push(RemoteLine {
            name: caps[1].to_string(),
            url: caps[2].to_string(),
            direction: caps[3].to_string(),
        });
    }

    Ok(remotes)
}
