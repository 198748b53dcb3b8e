//! Named revisions.

use std::cell::OnceCell;
use std::rc::Rc;

use crate::Repository;
use crate::error::Result;
use crate::log::Log;
use crate::objects::Commit;

/// A revision expression such as `main`, `HEAD~3` or `v1.0`, resolved to a
/// commit the first time it is needed.
#[derive(Debug, Clone)]
pub struct Revision {
    repository: Repository,
    name: String,
    resolved: OnceCell<Rc<Commit>>,
}

impl Revision {
    pub(crate) fn new(repository: Repository, name: &str) -> Self {
        Self {
            repository,
            name: name.to_string(),
            resolved: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The commit this revision designates.
    ///
    /// # Errors
    /// Returns [`crate::Error::ReferenceNotFound`] if git cannot resolve it.
    pub fn resolve(&self) -> Result<Rc<Commit>> {
        if let Some(commit) = self.resolved.get() {
            return Ok(Rc::clone(commit));
        }
        let commit = self.repository.resolve_revision(&self.name)?;
        Ok(Rc::clone(self.resolved.get_or_init(|| commit)))
    }

    /// History starting at this revision.
    #[must_use]
    pub fn log(&self, offset: Option<usize>, limit: Option<usize>) -> Log {
        self.repository
            .log(&[self.name.as_str()], &[])
            .with_offset(offset)
            .with_limit(limit)
    }
}
