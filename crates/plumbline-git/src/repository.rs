//! Repository handle: one git working directory, one object cache.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::blame::Blame;
use crate::config::Config;
use crate::diff::Diff;
use crate::error::{Error, Result};
use crate::log::Log;
use crate::objects::{Blob, Cached, CachedObject, Commit, Tree};
use crate::parser;
use crate::push::PushReference;
use crate::reference::ReferenceBag;
use crate::remote::RemoteBag;
use crate::revision::Revision;
use crate::runner::{CommandRunner, GitCli};

/// State shared by a repository handle and every object it created.
pub(crate) struct Session {
    path: PathBuf,
    runner: Box<dyn CommandRunner>,
    objects: RefCell<HashMap<String, CachedObject>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("objects", &self.objects.borrow().len())
            .finish_non_exhaustive()
    }
}

/// A git repository, queried through plumbing commands.
///
/// Cloning is cheap and shares the object cache. The handle is not `Send`:
/// use one repository per thread.
#[derive(Debug, Clone)]
pub struct Repository {
    session: Rc<Session>,
}

impl Repository {
    /// Open the repository at `path` with default settings.
    ///
    /// # Errors
    /// Returns [`Error::NotARepository`] if git does not recognize the path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, &Config::default())
    }

    /// Open the repository at `path`, running git as `config` says.
    ///
    /// # Errors
    /// Returns [`Error::NotARepository`] if git does not recognize the path,
    /// or [`Error::Spawn`] when git cannot be started.
    pub fn open_with_config(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let runner = GitCli::new(path, &config.git);
        match runner.run("rev-parse", &["--git-dir"]) {
            Ok(_) => Ok(Self::with_runner(path, runner)),
            Err(Error::Process { .. }) => Err(Error::NotARepository(path.to_path_buf())),
            Err(e) => Err(e),
        }
    }

    /// Build a repository around any runner, without validation.
    #[must_use]
    pub fn with_runner(path: impl Into<PathBuf>, runner: impl CommandRunner + 'static) -> Self {
        Self {
            session: Rc::new(Session {
                path: path.into(),
                runner: Box::new(runner),
                objects: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub(crate) const fn from_session(session: Rc<Session>) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.session.path
    }

    /// Run a git subcommand in this repository.
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] or [`Error::Process`] from the runner.
    pub fn run(&self, command: &str, args: &[&str]) -> Result<String> {
        self.session.runner.run(command, args)
    }

    /// Like [`Repository::run`], keeping stdout as bytes.
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] or [`Error::Process`] from the runner.
    pub fn run_raw(&self, command: &str, args: &[&str]) -> Result<Vec<u8>> {
        self.session.runner.run_raw(command, args)
    }

    // === Object cache ===

    /// The commit `hash`, shared with every other lookup of that hash.
    ///
    /// # Errors
    /// Returns [`Error::ObjectKindMismatch`] when `hash` is cached as a tree
    /// or blob.
    pub fn commit(&self, hash: &str) -> Result<Rc<Commit>> {
        self.cached(hash)
    }

    /// The tree `hash`, shared with every other lookup of that hash.
    ///
    /// # Errors
    /// Returns [`Error::ObjectKindMismatch`] when `hash` is cached as another
    /// kind.
    pub fn tree(&self, hash: &str) -> Result<Rc<Tree>> {
        self.cached(hash)
    }

    /// The blob `hash`, shared with every other lookup of that hash.
    ///
    /// # Errors
    /// Returns [`Error::ObjectKindMismatch`] when `hash` is cached as another
    /// kind.
    pub fn blob(&self, hash: &str) -> Result<Rc<Blob>> {
        self.cached(hash)
    }

    /// Number of objects in the session cache.
    #[must_use]
    pub fn cached_objects(&self) -> usize {
        self.session.objects.borrow().len()
    }

    fn cached<T: Cached>(&self, hash: &str) -> Result<Rc<T>> {
        let mut objects = self.session.objects.borrow_mut();
        if let Some(slot) = objects.get(hash) {
            return match T::from_slot(slot) {
                Some(object) => {
                    tracing::trace!(hash, kind = T::KIND, "object cache hit");
                    Ok(Rc::clone(object))
                }
                None => Err(Error::ObjectKindMismatch {
                    hash: hash.to_string(),
                    expected: T::KIND,
                    actual: slot.kind(),
                }),
            };
        }

        tracing::trace!(hash, kind = T::KIND, "object cache miss");
        let object = Rc::new(T::create(hash.to_string(), self.downgrade()));
        objects.insert(hash.to_string(), T::into_slot(Rc::clone(&object)));
        Ok(object)
    }

    fn downgrade(&self) -> Weak<Session> {
        Rc::downgrade(&self.session)
    }

    // === Revisions ===

    /// Resolve a revision expression (`HEAD`, `main~2`, `v1.0`, a hash) to
    /// its commit.
    ///
    /// # Errors
    /// Returns [`Error::ReferenceNotFound`] when git cannot resolve `name`.
    pub fn resolve_revision(&self, name: &str) -> Result<Rc<Commit>> {
        let spec = format!("{name}^{{commit}}");
        let output = match self.run("rev-parse", &["--verify", "--quiet", &spec]) {
            Ok(output) => output,
            Err(Error::Process { .. }) => return Err(Error::ReferenceNotFound(name.to_string())),
            Err(e) => return Err(e),
        };

        let hash = output.trim();
        if !parser::is_hash(hash) {
            return Err(Error::ReferenceNotFound(name.to_string()));
        }
        self.commit(hash)
    }

    /// The commit `HEAD` points to.
    ///
    /// # Errors
    /// Returns [`Error::ReferenceNotFound`] on an unborn branch.
    pub fn head(&self) -> Result<Rc<Commit>> {
        self.resolve_revision("HEAD")
    }

    /// A named revision, resolved on demand.
    #[must_use]
    pub fn revision(&self, name: &str) -> Revision {
        Revision::new(self.clone(), name)
    }

    // === Queries ===

    /// All branches and tags.
    ///
    /// # Errors
    /// Returns error if `show-ref` fails or prints something unexpected.
    pub fn references(&self) -> Result<ReferenceBag> {
        ReferenceBag::load(self)
    }

    /// Configured remotes with their fetch and push URLs.
    ///
    /// # Errors
    /// Returns error if `git remote -v` fails or prints something unexpected.
    pub fn remotes(&self) -> Result<RemoteBag> {
        RemoteBag::load(self)
    }

    /// One update of a push, as a pre- or post-receive hook reads it.
    ///
    /// # Errors
    /// Returns error if `git merge-base` fails on an update of an existing
    /// reference.
    pub fn push_reference(&self, reference: &str, before: &str, after: &str) -> Result<PushReference> {
        PushReference::new(self.clone(), reference, before, after)
    }

    /// History of `revisions` (all references when empty), limited to
    /// `paths` when not empty.
    #[must_use]
    pub fn log(&self, revisions: &[&str], paths: &[&str]) -> Log {
        Log::new(self.clone(), revisions, paths)
    }

    /// Line-by-line attribution of `file` at `revision`.
    ///
    /// `range` is passed to `-L` as is (`10,20`, `/^fn main/,+5`).
    ///
    /// # Errors
    /// Returns error if `git blame` fails or its output is malformed.
    pub fn blame(&self, revision: &str, file: &str, range: Option<&str>) -> Result<Blame> {
        let mut args = vec!["-p"];
        if let Some(range) = range {
            args.extend(["-L", range]);
        }
        args.extend([revision, "--", file]);

        let raw = self.run("blame", &args)?;
        let output = parser::parse_blame(&raw)?;
        Blame::from_output(self, output)
    }

    /// Diff between revisions, as `git diff` reads them (`a..b`, `a b`).
    ///
    /// # Errors
    /// Returns error if `git diff` fails or its output is malformed.
    pub fn diff(&self, revisions: &[&str]) -> Result<Diff> {
        let mut args = DIFF_ARGS.to_vec();
        args.extend_from_slice(revisions);
        Diff::parse(&self.run("diff", &args)?)
    }

    /// Uncommitted changes: the index against `HEAD` when `staged`, the
    /// working tree against the index otherwise.
    ///
    /// Files only present in the working tree have no new index.
    ///
    /// # Errors
    /// Returns error if `git diff` fails or its output is malformed.
    pub fn working_copy_diff(&self, staged: bool) -> Result<Diff> {
        let mut args = DIFF_ARGS.to_vec();
        if staged {
            args.push("--staged");
        }
        Diff::parse(&self.run("diff", &args)?)
    }
}

/// `git diff` reads diff.* settings from user config, so prefixes and
/// external drivers are pinned.
const DIFF_ARGS: &[&str] = &[
    "-r",
    "-p",
    "--raw",
    "--no-abbrev",
    "--no-color",
    "--no-ext-diff",
    "--src-prefix=a/",
    "--dst-prefix=b/",
    "-m",
    "-M",
    "--full-index",
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{MockRunner, count_calls};

    const A: &str = "1111111111111111111111111111111111111111";
    const B: &str = "2222222222222222222222222222222222222222";

    #[test]
    fn test_commit_identity() {
        let repo = Repository::with_runner(".", MockRunner::new());
        let first = repo.commit(A).unwrap();
        let second = repo.commit(A).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(repo.cached_objects(), 1);

        let other = repo.commit(B).unwrap();
        assert!(!Rc::ptr_eq(&first, &other));
    }

    #[test]
    fn test_clones_share_the_cache() {
        let repo = Repository::with_runner(".", MockRunner::new());
        let clone = repo.clone();
        assert!(Rc::ptr_eq(&repo.tree(A).unwrap(), &clone.tree(A).unwrap()));
    }

    #[test]
    fn test_kind_mismatch() {
        let repo = Repository::with_runner(".", MockRunner::new());
        repo.tree(A).unwrap();
        match repo.commit(A) {
            Err(Error::ObjectKindMismatch { expected, actual, .. }) => {
                assert_eq!(expected, "commit");
                assert_eq!(actual, "tree");
            }
            other => panic!("expected kind mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_lookup_does_not_run_git() {
        let runner = MockRunner::new();
        let calls = runner.calls();
        let repo = Repository::with_runner(".", runner);
        repo.commit(A).unwrap();
        repo.blob(B).unwrap();
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_resolve_revision() {
        let runner = MockRunner::new()
            .with_output("rev-parse --verify --quiet main^{commit}", format!("{A}\n"))
            .with_failure("rev-parse --verify --quiet nope^{commit}", 1, "");
        let repo = Repository::with_runner(".", runner);

        let commit = repo.resolve_revision("main").unwrap();
        assert!(Rc::ptr_eq(&commit, &repo.commit(A).unwrap()));

        match repo.resolve_revision("nope") {
            Err(Error::ReferenceNotFound(name)) => assert_eq!(name, "nope"),
            other => panic!("expected reference not found, got {other:?}"),
        }
    }

    #[test]
    fn test_blame_arguments() {
        let porcelain = format!(
            "{A} 1 1 1\nauthor a\nsummary s\nfilename f\n\tline\n"
        );
        let runner = MockRunner::new().with_output("blame -p -L 1,1 HEAD -- f", porcelain);
        let calls = runner.calls();
        let repo = Repository::with_runner(".", runner);

        let blame = repo.blame("HEAD", "f", Some("1,1")).unwrap();
        assert_eq!(blame.len(), 1);
        assert_eq!(count_calls(&calls, "blame -p -L 1,1 HEAD -- f"), 1);
    }

    #[test]
    fn test_working_copy_diff() {
        let runner = MockRunner::new()
            .with_output("diff -r -p --raw --no-abbrev --no-color --no-ext-diff --src-prefix=a/ --dst-prefix=b/ -m -M --full-index --staged", "")
            .with_output(
                &format!("diff -r -p --raw --no-abbrev --no-color --no-ext-diff --src-prefix=a/ --dst-prefix=b/ -m -M --full-index {A} {B}"),
                "",
            );
        let repo = Repository::with_runner(".", runner);
        assert!(repo.working_copy_diff(true).unwrap().files().is_empty());
        assert!(repo.diff(&[A, B]).unwrap().files().is_empty());
    }

    #[test]
    fn test_failing_command_propagates() {
        let runner = MockRunner::new().with_failure(&format!("cat-file commit {A}"), 128, "fatal: bad object");
        let repo = Repository::with_runner(".", runner);
        let err = repo.commit(A).unwrap().data().unwrap_err();
        assert!(err.is_transport());
    }
}
