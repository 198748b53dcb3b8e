//! Reference updates of a push, as hooks receive them.

use crate::Repository;
use crate::error::{Error, Result};
use crate::log::Log;
use crate::parser;

/// One `<before> <after> <reference>` update of a push.
///
/// A null `before` is a creation, a null `after` a deletion. Anything else
/// is a fast-forward unless `before` is not an ancestor of `after`.
#[derive(Debug, Clone)]
pub struct PushReference {
    repository: Repository,
    reference: String,
    before: String,
    after: String,
    force: bool,
}

impl PushReference {
    /// Build the update and check whether it rewrites history.
    ///
    /// # Errors
    /// Returns error if `git merge-base` fails for another reason than
    /// unrelated histories.
    pub(crate) fn new(repository: Repository, reference: &str, before: &str, after: &str) -> Result<Self> {
        let mut push = Self {
            repository,
            reference: reference.to_string(),
            before: before.to_string(),
            after: after.to_string(),
            force: false,
        };
        push.force = push.detect_force()?;
        Ok(push)
    }

    fn detect_force(&self) -> Result<bool> {
        if self.is_create() || self.is_delete() {
            return Ok(false);
        }

        match self.repository.run("merge-base", &[&self.before, &self.after]) {
            Ok(base) => Ok(base.trim() != self.before),
            // no common ancestor
            Err(Error::Process {
                exit_code: Some(1),
                stdout,
                ..
            }) if stdout.trim().is_empty() => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Full name of the updated reference.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    #[must_use]
    pub fn before(&self) -> &str {
        &self.before
    }

    #[must_use]
    pub fn after(&self) -> &str {
        &self.after
    }

    #[must_use]
    pub fn is_create(&self) -> bool {
        parser::is_null_hash(&self.before)
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        parser::is_null_hash(&self.after)
    }

    #[must_use]
    pub const fn is_force(&self) -> bool {
        self.force
    }

    #[must_use]
    pub fn is_fast_forward(&self) -> bool {
        !self.is_create() && !self.is_delete() && !self.force
    }

    /// Revision range of the pushed commits: `after` for a creation,
    /// `before..after` otherwise.
    ///
    /// # Errors
    /// Returns [`Error::DeletedReference`] for a deletion.
    pub fn revision(&self) -> Result<String> {
        if self.is_delete() {
            return Err(Error::DeletedReference(self.reference.clone()));
        }
        if self.is_create() {
            return Ok(self.after.clone());
        }
        Ok(format!("{}..{}", self.before, self.after))
    }

    /// Log of the pushed commits, leaving out those reachable from
    /// `excludes`.
    ///
    /// # Errors
    /// Returns [`Error::DeletedReference`] for a deletion.
    pub fn log(&self, excludes: &[&str]) -> Result<Log> {
        let revision = self.revision()?;
        let excludes: Vec<String> = excludes.iter().map(|e| format!("^{e}")).collect();

        let mut revisions = vec![revision.as_str()];
        revisions.extend(excludes.iter().map(String::as_str));
        Ok(self.repository.log(&revisions, &[]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{MockRunner, count_calls};

    const ZERO: &str = "0000000000000000000000000000000000000000";
    const OLD: &str = "1111111111111111111111111111111111111111";
    const NEW: &str = "2222222222222222222222222222222222222222";
    const BASE: &str = "3333333333333333333333333333333333333333";
    const BRANCH: &str = "refs/heads/main";

    #[test]
    fn test_creation() {
        let runner = MockRunner::new();
        let calls = runner.calls();
        let repo = Repository::with_runner(".", runner);

        let push = repo.push_reference(BRANCH, ZERO, NEW).unwrap();
        assert!(push.is_create());
        assert!(!push.is_delete());
        assert!(!push.is_force());
        assert!(!push.is_fast_forward());
        assert_eq!(push.revision().unwrap(), NEW);
        assert_eq!(count_calls(&calls, "merge-base"), 0);
    }

    #[test]
    fn test_deletion_has_no_log() {
        let repo = Repository::with_runner(".", MockRunner::new());
        let push = repo.push_reference(BRANCH, OLD, ZERO).unwrap();
        assert!(push.is_delete());
        assert!(!push.is_fast_forward());
        assert!(matches!(push.revision(), Err(Error::DeletedReference(_))));
        assert!(push.log(&[]).is_err());
    }

    #[test]
    fn test_fast_forward() {
        let runner = MockRunner::new().with_output(&format!("merge-base {OLD} {NEW}"), format!("{OLD}\n"));
        let repo = Repository::with_runner(".", runner);

        let push = repo.push_reference(BRANCH, OLD, NEW).unwrap();
        assert!(push.is_fast_forward());
        assert!(!push.is_force());
        assert_eq!(push.revision().unwrap(), format!("{OLD}..{NEW}"));
    }

    #[test]
    fn test_rewritten_history_is_force() {
        let runner = MockRunner::new().with_output(&format!("merge-base {OLD} {NEW}"), format!("{BASE}\n"));
        let repo = Repository::with_runner(".", runner);
        let push = repo.push_reference(BRANCH, OLD, NEW).unwrap();
        assert!(push.is_force());
        assert!(!push.is_fast_forward());
    }

    #[test]
    fn test_unrelated_history_is_force() {
        let runner = MockRunner::new().with_failure(&format!("merge-base {OLD} {NEW}"), 1, "");
        let repo = Repository::with_runner(".", runner);
        assert!(repo.push_reference(BRANCH, OLD, NEW).unwrap().is_force());
    }

    #[test]
    fn test_merge_base_failure_propagates() {
        let runner = MockRunner::new().with_failure(&format!("merge-base {OLD} {NEW}"), 128, "fatal: bad object");
        let repo = Repository::with_runner(".", runner);
        assert!(repo.push_reference(BRANCH, OLD, NEW).unwrap_err().is_transport());
    }

    #[test]
    fn test_log_excludes() {
        let runner = MockRunner::new().with_output(&format!("merge-base {OLD} {NEW}"), format!("{OLD}\n"));
        let repo = Repository::with_runner(".", runner);
        let push = repo.push_reference(BRANCH, OLD, NEW).unwrap();

        let log = push.log(&["refs/heads/release"]).unwrap();
        assert_eq!(
            log.revisions(),
            [format!("{OLD}..{NEW}"), "^refs/heads/release".to_string()]
        );
    }
}
