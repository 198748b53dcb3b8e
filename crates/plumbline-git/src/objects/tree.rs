use std::cell::OnceCell;
use std::rc::{Rc, Weak};

use super::{Blob, attach};
use crate::error::{Error, Result};
use crate::parser::{self, EntryKind, TreeEntry};
use crate::repository::Session;

/// A directory listing, loaded with `cat-file -p` on first use.
#[derive(Debug)]
pub struct Tree {
    hash: String,
    session: Weak<Session>,
    entries: OnceCell<Vec<TreeEntry>>,
}

/// What a tree entry resolves to.
#[derive(Debug, Clone)]
pub enum TreeObject {
    Blob(Rc<Blob>),
    Tree(Rc<Tree>),
    /// Submodule pointer. The commit lives in another repository.
    Commit(CommitReference),
}

impl TreeObject {
    #[must_use]
    pub fn hash(&self) -> &str {
        match self {
            Self::Blob(blob) => blob.hash(),
            Self::Tree(tree) => tree.hash(),
            Self::Commit(reference) => reference.hash(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Blob(_) => EntryKind::Blob,
            Self::Tree(_) => EntryKind::Tree,
            Self::Commit(_) => EntryKind::Commit,
        }
    }
}

/// Hash of a commit recorded by a submodule entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReference {
    hash: String,
}

impl CommitReference {
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl Tree {
    pub(crate) const fn new(hash: String, session: Weak<Session>) -> Self {
        Self {
            hash,
            session,
            entries: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.entries.get().is_some()
    }

    /// Entries in git's order.
    ///
    /// # Errors
    /// Returns error if git fails or the listing is malformed.
    pub fn entries(&self) -> Result<&[TreeEntry]> {
        if let Some(entries) = self.entries.get() {
            return Ok(entries);
        }

        let repository = attach(&self.session)?;
        let raw = repository.run("cat-file", &["-p", &self.hash])?;
        let entries = parser::parse_tree(&raw)?;
        Ok(self.entries.get_or_init(|| entries))
    }

    /// Raw listing line for `name`.
    ///
    /// # Errors
    /// Returns [`Error::EntryNotFound`] when the tree has no such entry.
    pub fn entry_info(&self, name: &str) -> Result<&TreeEntry> {
        self.entries()?
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))
    }

    /// Object behind the entry `name`, from the session cache.
    ///
    /// # Errors
    /// Returns [`Error::EntryNotFound`] when the tree has no such entry.
    pub fn entry(&self, name: &str) -> Result<TreeObject> {
        let entry = self.entry_info(name)?;
        self.resolve_entry(entry)
    }

    /// Blob entries, with their names.
    ///
    /// # Errors
    /// Returns error if the tree cannot be loaded.
    pub fn blobs(&self) -> Result<Vec<(&str, Rc<Blob>)>> {
        let repository = attach(&self.session)?;
        self.entries_of(EntryKind::Blob)?
            .map(|entry| -> Result<_> { Ok((entry.name.as_str(), repository.blob(&entry.hash)?)) })
            .collect()
    }

    /// Subtree entries, with their names.
    ///
    /// # Errors
    /// Returns error if the tree cannot be loaded.
    pub fn trees(&self) -> Result<Vec<(&str, Rc<Self>)>> {
        let repository = attach(&self.session)?;
        self.entries_of(EntryKind::Tree)?
            .map(|entry| -> Result<_> { Ok((entry.name.as_str(), repository.tree(&entry.hash)?)) })
            .collect()
    }

    /// Submodule entries, with their names.
    ///
    /// # Errors
    /// Returns error if the tree cannot be loaded.
    pub fn submodules(&self) -> Result<Vec<(&str, CommitReference)>> {
        Ok(self
            .entries_of(EntryKind::Commit)?
            .map(|entry| {
                (
                    entry.name.as_str(),
                    CommitReference {
                        hash: entry.hash.clone(),
                    },
                )
            })
            .collect())
    }

    /// Walk a `/`-separated path from this tree. An empty path is the tree
    /// itself and a leading `/` is ignored.
    ///
    /// # Errors
    /// Returns [`Error::EntryNotFound`] for a missing segment and
    /// [`Error::NotATree`] when the path goes through a blob or submodule.
    pub fn resolve_path(self: &Rc<Self>, path: &str) -> Result<TreeObject> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let mut current = TreeObject::Tree(Rc::clone(self));
        if path.is_empty() {
            return Ok(current);
        }

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match current {
                TreeObject::Tree(tree) => tree.entry(segment)?,
                _ => return Err(Error::NotATree(path.to_string())),
            };
        }

        Ok(current)
    }

    fn entries_of(&self, kind: EntryKind) -> Result<impl Iterator<Item = &TreeEntry>> {
        Ok(self.entries()?.iter().filter(move |entry| entry.kind == kind))
    }

    fn resolve_entry(&self, entry: &TreeEntry) -> Result<TreeObject> {
        let repository = attach(&self.session)?;
        Ok(match entry.kind {
            EntryKind::Blob => TreeObject::Blob(repository.blob(&entry.hash)?),
            EntryKind::Tree => TreeObject::Tree(repository.tree(&entry.hash)?),
            EntryKind::Commit => TreeObject::Commit(CommitReference {
                hash: entry.hash.clone(),
            }),
        })
    }
}
