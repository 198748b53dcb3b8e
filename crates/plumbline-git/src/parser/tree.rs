//! Tree listings from `cat-file -p <tree>`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ParseError, Scanner};

#[allow(clippy::expect_used)]
static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{5,6}) (blob|tree|commit) ([0-9a-f]{40}(?:[0-9a-f]{24})?)\t([^\n]+)(?:\n|$)")
        .expect("valid regex")
});

/// What a tree entry points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// File content.
    Blob,
    /// Subdirectory.
    Tree,
    /// Submodule: a commit in another repository.
    Commit,
}

impl EntryKind {
    /// The type name git prints for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Octal file mode as printed by git (`100644`, `040000`, `160000`, ...).
    pub mode: String,
    /// Kind of the referenced object.
    pub kind: EntryKind,
    /// Hash of the referenced object.
    pub hash: String,
    /// Entry name (a single path component).
    pub name: String,
}

/// Parse a tree listing, keeping git's order.
///
/// # Errors
/// Returns a [`ParseError`] on a malformed line or unknown object type.
pub fn parse_tree(input: &str) -> Result<Vec<TreeEntry>, ParseError> {
    let mut s = Scanner::new(input);
    let mut entries = Vec::new();

    while !s.is_finished() {
        let caps = s.consume_regex(&ENTRY)?;
        let kind = match &caps[2] {
            "blob" => EntryKind::Blob,
            "tree" => EntryKind::Tree,
            _ => EntryKind::Commit,
        };
        entries.push(TreeEntry {
            mode: caps[1].to_string(),
            kind,
            hash: caps[3].to_string(),
            name: caps[4].to_string(),
        });
    }

    Ok(entries)
}
