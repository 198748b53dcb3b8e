//! Lazily loaded git objects.
//!
//! Each object is created unloaded by the repository cache and fills its
//! state on first access. Objects keep a weak handle on their session so the
//! cache does not keep itself alive.

mod blob;
mod commit;
mod tree;

use std::rc::{Rc, Weak};

pub use blob::Blob;
pub use commit::{Commit, SHORT_MESSAGE_LIMIT};
pub use tree::{CommitReference, Tree, TreeObject};

use crate::error::{Error, Result};
use crate::repository::{Repository, Session};

/// A cache slot: one instance per hash and per session.
#[derive(Debug, Clone)]
pub(crate) enum CachedObject {
    Commit(Rc<Commit>),
    Tree(Rc<Tree>),
    Blob(Rc<Blob>),
}

impl CachedObject {
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Commit(_) => Commit::KIND,
            Self::Tree(_) => Tree::KIND,
            Self::Blob(_) => Blob::KIND,
        }
    }
}

/// Glue between an object type and its cache slot.
pub(crate) trait Cached: Sized {
    const KIND: &'static str;

    fn create(hash: String, session: Weak<Session>) -> Self;

    fn from_slot(slot: &CachedObject) -> Option<&Rc<Self>>;

    fn into_slot(object: Rc<Self>) -> CachedObject;
}

impl Cached for Commit {
    const KIND: &'static str = "commit";

    fn create(hash: String, session: Weak<Session>) -> Self {
        Self::new(hash, session)
    }

    fn from_slot(slot: &CachedObject) -> Option<&Rc<Self>> {
        match slot {
            CachedObject::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    fn into_slot(object: Rc<Self>) -> CachedObject {
        CachedObject::Commit(object)
    }
}

impl Cached for Tree {
    const KIND: &'static str = "tree";

    fn create(hash: String, session: Weak<Session>) -> Self {
        Self::new(hash, session)
    }

    fn from_slot(slot: &CachedObject) -> Option<&Rc<Self>> {
        match slot {
            CachedObject::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    fn into_slot(object: Rc<Self>) -> CachedObject {
        CachedObject::Tree(object)
    }
}

impl Cached for Blob {
    const KIND: &'static str = "blob";

    fn create(hash: String, session: Weak<Session>) -> Self {
        Self::new(hash, session)
    }

    fn from_slot(slot: &CachedObject) -> Option<&Rc<Self>> {
        match slot {
            CachedObject::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    fn into_slot(object: Rc<Self>) -> CachedObject {
        CachedObject::Blob(object)
    }
}

/// Turn an object's session handle back into a repository.
pub(crate) fn attach(session: &Weak<Session>) -> Result<Repository> {
    session
        .upgrade()
        .map(Repository::from_session)
        .ok_or(Error::SessionClosed)
}
