use std::cell::OnceCell;
use std::rc::{Rc, Weak};

use chrono::{DateTime, FixedOffset};

use super::{Tree, attach};
use crate::diff::Diff;
use crate::error::Result;
use crate::parser::{self, CommitData};
use crate::repository::{Repository, Session};

/// Default length of [`Commit::short_message`] as used by listings.
pub const SHORT_MESSAGE_LIMIT: usize = 50;

/// A commit, identified by its hash. Header and message load on first use.
#[derive(Debug)]
pub struct Commit {
    hash: String,
    session: Weak<Session>,
    data: OnceCell<CommitData>,
    diff: OnceCell<Diff>,
}

impl Commit {
    pub(crate) const fn new(hash: String, session: Weak<Session>) -> Self {
        Self {
            hash,
            session,
            data: OnceCell::new(),
            diff: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Abbreviated hash for display.
    #[must_use]
    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }

    /// True once the header has been parsed, by `cat-file` or a log listing.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    /// Fill the commit from an already parsed log record. No-op when loaded.
    pub(crate) fn preload(&self, data: CommitData) {
        if self.data.set(data).is_err() {
            tracing::trace!(hash = %self.hash, "commit already loaded");
        }
    }

    /// Parsed header and message, running `cat-file commit` once.
    ///
    /// # Errors
    /// Returns error if git fails, the payload is malformed, or the repository
    /// was dropped.
    pub fn data(&self) -> Result<&CommitData> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }

        let repository = attach(&self.session)?;
        let raw = repository.run("cat-file", &["commit", &self.hash])?;
        let data = parser::parse_commit(&raw)?;
        Ok(self.data.get_or_init(|| data))
    }

    /// # Errors
    /// See [`Commit::data`].
    pub fn tree_hash(&self) -> Result<&str> {
        Ok(&self.data()?.tree_hash)
    }

    /// Parent hashes in recorded order.
    ///
    /// # Errors
    /// See [`Commit::data`].
    pub fn parent_hashes(&self) -> Result<&[String]> {
        Ok(&self.data()?.parent_hashes)
    }

    /// # Errors
    /// See [`Commit::data`].
    pub fn author_name(&self) -> Result<&str> {
        Ok(&self.data()?.author_name)
    }

    /// # Errors
    /// See [`Commit::data`].
    pub fn author_email(&self) -> Result<&str> {
        Ok(&self.data()?.author_email)
    }

    /// # Errors
    /// See [`Commit::data`].
    pub fn author_date(&self) -> Result<DateTime<FixedOffset>> {
        Ok(self.data()?.author_date)
    }

    /// # Errors
    /// See [`Commit::data`].
    pub fn committer_name(&self) -> Result<&str> {
        Ok(&self.data()?.committer_name)
    }

    /// # Errors
    /// See [`Commit::data`].
    pub fn committer_email(&self) -> Result<&str> {
        Ok(&self.data()?.committer_email)
    }

    /// # Errors
    /// See [`Commit::data`].
    pub fn committer_date(&self) -> Result<DateTime<FixedOffset>> {
        Ok(self.data()?.committer_date)
    }

    /// Full message, as stored.
    ///
    /// # Errors
    /// See [`Commit::data`].
    pub fn message(&self) -> Result<&str> {
        Ok(&self.data()?.message)
    }

    /// Armored GPG signature, for signed commits.
    ///
    /// # Errors
    /// See [`Commit::data`].
    pub fn signature(&self) -> Result<Option<&str>> {
        Ok(self.data()?.signature.as_deref())
    }

    /// First line of the message, cut to `limit` characters plus `...`.
    ///
    /// # Errors
    /// See [`Commit::data`].
    pub fn short_message(&self, limit: usize) -> Result<String> {
        Ok(shorten(self.message()?, limit))
    }

    /// First line of the message.
    ///
    /// # Errors
    /// See [`Commit::data`].
    pub fn subject_message(&self) -> Result<&str> {
        let message = self.message()?;
        Ok(message.lines().next().unwrap_or_default())
    }

    /// Message after the subject and its blank separator line.
    ///
    /// # Errors
    /// See [`Commit::data`].
    pub fn body_message(&self) -> Result<&str> {
        let message = self.message()?;
        Ok(message
            .split_once('\n')
            .map_or("", |(_, body)| body.trim_start_matches('\n')))
    }

    /// Root tree of the commit.
    ///
    /// # Errors
    /// See [`Commit::data`]; also fails if the tree hash is cached as another
    /// object kind.
    pub fn tree(&self) -> Result<Rc<Tree>> {
        let repository = attach(&self.session)?;
        repository.tree(self.tree_hash()?)
    }

    /// Parent commits in recorded order, from the session cache.
    ///
    /// # Errors
    /// See [`Commit::data`].
    pub fn parents(&self) -> Result<Vec<Rc<Self>>> {
        let repository = attach(&self.session)?;
        self.parent_hashes()?
            .iter()
            .map(|hash| repository.commit(hash))
            .collect()
    }

    /// Changes introduced by this commit, one block per parent for merges.
    ///
    /// # Errors
    /// Returns error if `diff-tree` fails or its output is malformed.
    pub fn diff(&self) -> Result<&Diff> {
        if let Some(diff) = self.diff.get() {
            return Ok(diff);
        }

        let repository = attach(&self.session)?;
        let raw = repository.run(
            "diff-tree",
            &[
                "-r",
                "-p",
                "--raw",
                "--no-abbrev",
                "--no-color",
                "-m",
                "-M",
                "--root",
                "--no-commit-id",
                "--full-index",
                &self.hash,
            ],
        )?;
        let diff = Diff::parse(&raw)?;
        Ok(self.diff.get_or_init(|| diff))
    }

    /// Most recent commit reachable from this one that touched `path`.
    /// `None` when the path never existed in that history.
    ///
    /// # Errors
    /// Returns error if `git log` fails.
    pub fn last_modification(&self, path: &str) -> Result<Option<Rc<Self>>> {
        let repository = attach(&self.session)?;
        let path = path.strip_prefix('/').unwrap_or(path);
        let output = repository.run("log", &["--format=%H", "-n", "1", &self.hash, "--", path])?;
        match output.trim() {
            "" => Ok(None),
            hash => repository.commit(hash).map(Some),
        }
    }

    /// Repository this commit belongs to.
    ///
    /// # Errors
    /// Returns [`crate::Error::SessionClosed`] once the repository is dropped.
    pub fn repository(&self) -> Result<Repository> {
        attach(&self.session)
    }
}

fn shorten(message: &str, limit: usize) -> String {
    let first = message.lines().next().unwrap_or_default();
    if first.chars().count() < limit {
        return first.to_string();
    }
    let mut short: String = first.chars().take(limit).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::testing::{MockRunner, count_calls};

    const HASH: &str = "1111111111111111111111111111111111111111";
    const PARENT: &str = "2222222222222222222222222222222222222222";
    const TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    fn payload(message: &str) -> String {
        format!(
            "tree {TREE}\nparent {PARENT}\n\
             author Alice <alice@example.com> 1700000000 +0100\n\
             committer Alice <alice@example.com> 1700000000 +0100\n\n{message}"
        )
    }

    fn repository(message: &str) -> (Repository, std::rc::Rc<std::cell::RefCell<Vec<String>>>) {
        let runner = MockRunner::new().with_output(&format!("cat-file commit {HASH}"), payload(message));
        let calls = runner.calls();
        (Repository::with_runner(".", runner), calls)
    }

    #[test]
    fn test_loads_once() {
        let (repo, calls) = repository("Subject\n");
        let commit = repo.commit(HASH).unwrap();
        assert!(!commit.is_loaded());
        assert_eq!(count_calls(&calls, "cat-file"), 0);

        assert_eq!(commit.author_name().unwrap(), "Alice");
        assert_eq!(commit.tree_hash().unwrap(), TREE);
        assert_eq!(commit.parent_hashes().unwrap(), [PARENT.to_string()]);
        assert!(commit.is_loaded());
        assert_eq!(count_calls(&calls, "cat-file"), 1);
    }

    #[test]
    fn test_parents_come_from_cache() {
        let (repo, _) = repository("m\n");
        let commit = repo.commit(HASH).unwrap();
        let parents = commit.parents().unwrap();
        assert!(Rc::ptr_eq(&parents[0], &repo.commit(PARENT).unwrap()));
        assert!(!parents[0].is_loaded());
    }

    #[test]
    fn test_subject_and_body() {
        let (repo, _) = repository("Add parser\n\nFirst paragraph.\n\nSecond.\n");
        let commit = repo.commit(HASH).unwrap();
        assert_eq!(commit.subject_message().unwrap(), "Add parser");
        assert_eq!(commit.body_message().unwrap(), "First paragraph.\n\nSecond.\n");
    }

    #[test]
    fn test_empty_message() {
        let (repo, _) = repository("");
        let commit = repo.commit(HASH).unwrap();
        assert_eq!(commit.message().unwrap(), "");
        assert_eq!(commit.subject_message().unwrap(), "");
        assert_eq!(commit.body_message().unwrap(), "");
        assert_eq!(commit.short_message(50).unwrap(), "");
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("Fix bug\n", 50), "Fix bug");
        assert_eq!(shorten("abcdef", 3), "abc...");
        assert_eq!(shorten("abc", 3), "abc...");
        assert_eq!(shorten("ab\nbody", 3), "ab");
        assert_eq!(shorten("abcd\nbody", 3), "abc...");
        assert_eq!(shorten("ääää", 2), "ää...");
    }

    #[test]
    fn test_last_modification() {
        let runner = MockRunner::new()
            .with_output(&format!("log --format=%H -n 1 {HASH} -- README.md"), format!("{PARENT}\n"))
            .with_output(&format!("log --format=%H -n 1 {HASH} -- missing"), "");
        let repo = Repository::with_runner(".", runner);
        let commit = repo.commit(HASH).unwrap();

        let last = commit.last_modification("/README.md").unwrap().unwrap();
        assert_eq!(last.hash(), PARENT);
        assert!(commit.last_modification("missing").unwrap().is_none());
    }

    #[test]
    fn test_diff_is_cached() {
        let diff = format!(
            ":000000 100644 {} {TREE} A\tnew.txt\n\ndiff --git a/new.txt b/new.txt\nnew file mode 100644\nindex {}..{TREE}\n",
            "0".repeat(40),
            "0".repeat(40)
        );
        let runner = MockRunner::new().with_output(
            &format!("diff-tree -r -p --raw --no-abbrev --no-color -m -M --root --no-commit-id --full-index {HASH}"),
            diff,
        );
        let calls = runner.calls();
        let repo = Repository::with_runner(".", runner);
        let commit = repo.commit(HASH).unwrap();

        assert_eq!(commit.diff().unwrap().files().len(), 1);
        assert!(commit.diff().unwrap().files()[0].is_creation());
        assert_eq!(count_calls(&calls, "diff-tree"), 1);
    }

    #[test]
    fn test_dropped_repository() {
        let (repo, _) = repository("m\n");
        let commit = repo.commit(HASH).unwrap();
        drop(repo);
        assert!(matches!(commit.data(), Err(Error::SessionClosed)));
    }
}
