//! Structured diffs: files, hunks and classified lines.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Repository;
use crate::error::{Error, Result};
use crate::objects::Blob;
use crate::parser;

/// A parsed diff: one [`File`] per touched path, in git's order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diff {
    files: Vec<File>,
    #[serde(skip)]
    degraded: bool,
}

// Equality is over content; `degraded` only records how it was parsed.
impl PartialEq for Diff {
    fn eq(&self, other: &Self) -> bool {
        self.files == other.files
    }
}

impl Eq for Diff {}

impl Diff {
    /// Build a diff from already decoded files.
    #[must_use]
    pub const fn new(files: Vec<File>) -> Self {
        Self {
            files,
            degraded: false,
        }
    }

    pub(crate) const fn with_degraded(files: Vec<File>, degraded: bool) -> Self {
        Self { files, degraded }
    }

    /// Parse unified diff text, with or without raw lines.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] when the text is not a diff git would produce.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(parser::parse_diff(raw)?)
    }

    #[must_use]
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// True when the diff had no raw lines and modes/indexes were inferred
    /// from extended headers only.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Structured array form: a JSON array of file objects.
    ///
    /// # Errors
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_array(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.files)?)
    }

    /// Rebuild a diff from [`Diff::to_array`] output.
    ///
    /// # Errors
    /// Returns [`Error::Json`] when the value does not describe a list of files.
    pub fn from_array(value: Value) -> Result<Self> {
        let files: Vec<File> = serde_json::from_value(value)?;
        Ok(Self::new(files))
    }
}

/// One touched path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    old_name: Option<String>,
    new_name: Option<String>,
    old_mode: Option<String>,
    new_mode: Option<String>,
    old_index: Option<String>,
    new_index: Option<String>,
    is_binary: bool,
    changes: Vec<FileChange>,
}

impl File {
    /// Create a file record without hunks.
    ///
    /// An absent `old_name` marks a creation, an absent `new_name` a deletion.
    #[must_use]
    pub const fn new(
        old_name: Option<String>,
        new_name: Option<String>,
        old_mode: Option<String>,
        new_mode: Option<String>,
        old_index: Option<String>,
        new_index: Option<String>,
        is_binary: bool,
    ) -> Self {
        Self {
            old_name,
            new_name,
            old_mode,
            new_mode,
            old_index,
            new_index,
            is_binary,
            changes: Vec::new(),
        }
    }

    pub fn add_change(&mut self, change: FileChange) {
        self.changes.push(change);
    }

    #[must_use]
    pub const fn is_creation(&self) -> bool {
        self.old_name.is_none()
    }

    #[must_use]
    pub const fn is_deletion(&self) -> bool {
        self.new_name.is_none()
    }

    #[must_use]
    pub const fn is_modification(&self) -> bool {
        self.old_name.is_some() && self.new_name.is_some()
    }

    /// Modification whose path changed.
    #[must_use]
    pub fn is_rename(&self) -> bool {
        self.is_modification() && self.old_name != self.new_name
    }

    /// Modification whose mode changed.
    #[must_use]
    pub fn is_change_mode(&self) -> bool {
        self.is_modification() && self.old_mode != self.new_mode
    }

    /// Number of added lines over all hunks.
    #[must_use]
    pub fn additions(&self) -> usize {
        self.changes.iter().map(|c| c.count(LineKind::Add)).sum()
    }

    /// Number of removed lines over all hunks.
    #[must_use]
    pub fn deletions(&self) -> usize {
        self.changes.iter().map(|c| c.count(LineKind::Remove)).sum()
    }

    #[must_use]
    pub fn old_name(&self) -> Option<&str> {
        self.old_name.as_deref()
    }

    #[must_use]
    pub fn new_name(&self) -> Option<&str> {
        self.new_name.as_deref()
    }

    /// The path to display: new name, or old name for deletions.
    #[must_use]
    pub fn name(&self) -> &str {
        self.new_name
            .as_deref()
            .or(self.old_name.as_deref())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn old_mode(&self) -> Option<&str> {
        self.old_mode.as_deref()
    }

    #[must_use]
    pub fn new_mode(&self) -> Option<&str> {
        self.new_mode.as_deref()
    }

    /// Blob hash before the change. `Some("")` when unknown, `None` when
    /// there is no old side.
    #[must_use]
    pub fn old_index(&self) -> Option<&str> {
        self.old_index.as_deref()
    }

    /// Blob hash after the change. `Some("")` when unknown, `None` when
    /// there is no new side.
    #[must_use]
    pub fn new_index(&self) -> Option<&str> {
        self.new_index.as_deref()
    }

    #[must_use]
    pub const fn is_binary(&self) -> bool {
        self.is_binary
    }

    #[must_use]
    pub fn changes(&self) -> &[FileChange] {
        &self.changes
    }

    /// Blob before the change.
    ///
    /// # Errors
    /// Returns [`Error::MissingIndex`] when the old index is absent or unknown.
    pub fn old_blob(&self, repository: &Repository) -> Result<Rc<Blob>> {
        blob_for(repository, self.old_index.as_deref())
    }

    /// Blob after the change.
    ///
    /// # Errors
    /// Returns [`Error::MissingIndex`] when the new index is absent or unknown.
    pub fn new_blob(&self, repository: &Repository) -> Result<Rc<Blob>> {
        blob_for(repository, self.new_index.as_deref())
    }
}

fn blob_for(repository: &Repository, index: Option<&str>) -> Result<Rc<Blob>> {
    match index {
        Some(hash) if !hash.is_empty() => repository.blob(hash),
        _ => Err(Error::MissingIndex),
    }
}

/// Classification of a hunk line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Context,
    Add,
    Remove,
}

/// A hunk line without its `+`/`-`/space prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub kind: LineKind,
    pub content: String,
}

/// One hunk, with the ranges declared in its `@@` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    range_old_start: usize,
    range_old_count: usize,
    range_new_start: usize,
    range_new_count: usize,
    lines: Vec<Line>,
}

impl FileChange {
    #[must_use]
    pub const fn new(
        range_old_start: usize,
        range_old_count: usize,
        range_new_start: usize,
        range_new_count: usize,
        lines: Vec<Line>,
    ) -> Self {
        Self {
            range_old_start,
            range_old_count,
            range_new_start,
            range_new_count,
            lines,
        }
    }

    /// Number of lines of the given kind.
    #[must_use]
    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }

    #[must_use]
    pub const fn range_old_start(&self) -> usize {
        self.range_old_start
    }

    #[must_use]
    pub const fn range_old_count(&self) -> usize {
        self.range_old_count
    }

    #[must_use]
    pub const fn range_new_start(&self) -> usize {
        self.range_new_start
    }

    #[must_use]
    pub const fn range_new_count(&self) -> usize {
        self.range_new_count
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
}
