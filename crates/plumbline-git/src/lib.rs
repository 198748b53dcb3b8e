//! # plumbline-git
//!
//! Typed access to a git repository through its plumbing commands.
//! Command output is decoded by small cursor-based parsers into commits,
//! trees, blobs, diffs, references and blame data. Objects are cached per
//! repository handle and load their content on first use.

pub mod blame;
pub mod config;
pub mod diff;
mod error;
pub mod log;
mod objects;
pub mod parser;
pub mod push;
pub mod reference;
pub mod remote;
mod repository;
pub mod revision;
pub mod runner;

#[cfg(test)]
mod testing;

pub use blame::{Blame, BlameLine};
pub use config::{Config, GitConfig, LogConfig};
pub use diff::{Diff, File, FileChange, Line, LineKind};
pub use error::{Error, Result};
pub use log::{Log, LogEntry};
pub use objects::{Blob, Commit, CommitReference, Tree, TreeObject};
pub use parser::{EntryKind, ParseError, TreeEntry};
pub use push::PushReference;
pub use reference::{Reference, ReferenceBag};
pub use remote::{Remote, RemoteBag};
pub use repository::Repository;
pub use revision::Revision;
pub use runner::{CommandRunner, GitCli};

pub use objects::SHORT_MESSAGE_LIMIT;
