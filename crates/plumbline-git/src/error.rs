//! Error types for plumbline-git.

use std::path::PathBuf;

use crate::parser::ParseError;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to git or decoding its output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The git binary could not be started (missing binary, permissions).
    #[error("failed to run git {command}: {source}")]
    Spawn {
        /// The git subcommand that was attempted.
        command: String,
        /// The underlying spawn failure.
        #[source]
        source: std::io::Error,
    },

    /// git ran but exited with a non-zero status.
    #[error("git {command} failed (exit code {}): {}", exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()), stderr.trim())]
    Process {
        /// The git subcommand and its arguments.
        command: String,
        /// Exit code, `None` when killed by a signal.
        exit_code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A revision or reference does not exist.
    #[error("reference not found: \"{0}\"")]
    ReferenceNotFound(String),

    /// The path is not inside a git repository.
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// git output did not match the expected grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A hash is already cached as an object of another kind.
    #[error("object {hash} is a {actual}, not a {expected}")]
    ObjectKindMismatch {
        /// The object hash.
        hash: String,
        /// The kind that was requested.
        expected: &'static str,
        /// The kind held by the cache.
        actual: &'static str,
    },

    /// A tree has no entry with the given name.
    #[error("no entry {0}")]
    EntryNotFound(String),

    /// Path resolution tried to descend into something that is not a tree.
    #[error("unresolvable path: {0}")]
    NotATree(String),

    /// A blame line number outside the blamed range.
    #[error("line {0} does not exist")]
    LineOutOfRange(usize),

    /// A diff file has no blob index on the requested side.
    #[error("index is missing to return blob object")]
    MissingIndex,

    /// A deleted reference of a push has no commit range.
    #[error("no log on deletion of {0}")]
    DeletedReference(String),

    /// The repository session owning an object was dropped.
    #[error("repository session is closed")]
    SessionClosed,

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Returns true for failures of the git process itself (as opposed to
    /// parse or lookup failures).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Spawn { .. } | Self::Process { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_message() {
        let err = Error::Process {
            command: "rev-parse --verify nope".into(),
            exit_code: Some(128),
            stdout: String::new(),
            stderr: "fatal: Needed a single revision\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "git rev-parse --verify nope failed (exit code 128): fatal: Needed a single revision"
        );
        assert!(err.is_transport());
    }

    #[test]
    fn test_reference_not_found_is_not_transport() {
        let err = Error::ReferenceNotFound("foo".into());
        assert_eq!(err.to_string(), "reference not found: \"foo\"");
        assert!(!err.is_transport());
    }
}
