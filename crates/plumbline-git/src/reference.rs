//! Branches and tags, as listed by `show-ref`.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::Repository;
use crate::error::{Error, Result};
use crate::objects::Commit;
use crate::parser::{self, reference::ReferenceLine};

const HEADS: &str = "refs/heads/";
const REMOTES: &str = "refs/remotes/";
const TAGS: &str = "refs/tags/";
const PEELED: &str = "^{}";

/// A named pointer to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Reference {
    /// Local (`refs/heads/`) or remote-tracking (`refs/remotes/`) branch.
    Branch {
        fullname: String,
        commit_hash: String,
        is_local: bool,
    },
    /// Tag. For annotated tags `commit_hash` is the peeled target and
    /// `tag_object` the tag object itself.
    Tag {
        fullname: String,
        commit_hash: String,
        tag_object: Option<String>,
    },
}

impl Reference {
    /// Classify a `show-ref` line. `None` for namespaces other than heads,
    /// remotes and tags.
    fn classify(line: ReferenceLine) -> Option<Self> {
        let ReferenceLine { hash, fullname } = line;
        if fullname.starts_with(HEADS) {
            Some(Self::Branch {
                fullname,
                commit_hash: hash,
                is_local: true,
            })
        } else if fullname.starts_with(REMOTES) {
            // origin/HEAD is a symbolic pointer, not a branch
            if fullname.ends_with("/HEAD") {
                return None;
            }
            Some(Self::Branch {
                fullname,
                commit_hash: hash,
                is_local: false,
            })
        } else if fullname.starts_with(TAGS) {
            Some(Self::Tag {
                fullname,
                commit_hash: hash,
                tag_object: None,
            })
        } else {
            None
        }
    }

    /// Full name, e.g. `refs/heads/main`.
    #[must_use]
    pub fn fullname(&self) -> &str {
        match self {
            Self::Branch { fullname, .. } | Self::Tag { fullname, .. } => fullname,
        }
    }

    /// Short name: `main`, `origin/main`, `v1.0`.
    #[must_use]
    pub fn name(&self) -> &str {
        let fullname = self.fullname();
        [HEADS, REMOTES, TAGS]
            .iter()
            .find_map(|prefix| fullname.strip_prefix(prefix))
            .unwrap_or(fullname)
    }

    /// Remote of a remote-tracking branch.
    #[must_use]
    pub fn remote(&self) -> Option<&str> {
        match self {
            Self::Branch {
                is_local: false, ..
            } => self.name().split_once('/').map(|(remote, _)| remote),
            _ => None,
        }
    }

    #[must_use]
    pub fn commit_hash(&self) -> &str {
        match self {
            Self::Branch { commit_hash, .. } | Self::Tag { commit_hash, .. } => commit_hash,
        }
    }

    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self, Self::Branch { .. })
    }

    #[must_use]
    pub const fn is_tag(&self) -> bool {
        matches!(self, Self::Tag { .. })
    }

    /// The commit this reference points to, from the session cache.
    ///
    /// # Errors
    /// Returns [`Error::ObjectKindMismatch`] when the hash is cached as
    /// another kind.
    pub fn commit(&self, repository: &Repository) -> Result<Rc<Commit>> {
        repository.commit(self.commit_hash())
    }

    /// Author date of the commit this reference points to.
    ///
    /// # Errors
    /// Returns error if the commit cannot be loaded.
    pub fn last_modification(&self, repository: &Repository) -> Result<DateTime<FixedOffset>> {
        self.commit(repository)?.author_date()
    }
}

/// All references of a repository, in `show-ref` order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBag {
    references: Vec<Reference>,
    by_name: HashMap<String, usize>,
}

impl ReferenceBag {
    /// Run `show-ref --dereference` and classify its output.
    ///
    /// # Errors
    /// Returns error if `show-ref` fails for another reason than an empty
    /// repository, or its output is malformed.
    pub(crate) fn load(repository: &Repository) -> Result<Self> {
        let output = match repository.run("show-ref", &["--dereference"]) {
            Ok(output) => output,
            // no references at all: exit 1 and nothing on stderr
            Err(Error::Process {
                exit_code: Some(1),
                stderr,
                ..
            }) if stderr.trim().is_empty() => String::new(),
            Err(e) => return Err(e),
        };

        Ok(Self::from_lines(parser::parse_references(&output)?))
    }

    fn from_lines(lines: Vec<ReferenceLine>) -> Self {
        let mut bag = Self::default();

        for line in lines {
            if let Some(tag) = line.fullname.strip_suffix(PEELED) {
                bag.peel(tag, line.hash);
                continue;
            }

            let fullname = line.fullname.clone();
            match Reference::classify(line) {
                Some(reference) => {
                    bag.by_name.insert(fullname, bag.references.len());
                    bag.references.push(reference);
                }
                None => tracing::debug!(reference = %fullname, "skipping reference namespace"),
            }
        }

        bag
    }

    fn peel(&mut self, fullname: &str, target: String) {
        let slot = self
            .by_name
            .get(fullname)
            .and_then(|&index| self.references.get_mut(index));
        match slot {
            Some(Reference::Tag {
                commit_hash,
                tag_object,
                ..
            }) => *tag_object = Some(std::mem::replace(commit_hash, target)),
            _ => tracing::debug!(reference = %fullname, "skipping peeled reference"),
        }
    }

    /// Reference by full name.
    ///
    /// # Errors
    /// Returns [`Error::ReferenceNotFound`] if there is no such reference.
    pub fn get(&self, fullname: &str) -> Result<&Reference> {
        self.by_name
            .get(fullname)
            .map(|&index| &self.references[index])
            .ok_or_else(|| Error::ReferenceNotFound(fullname.to_string()))
    }

    #[must_use]
    pub fn has(&self, fullname: &str) -> bool {
        self.by_name.contains_key(fullname)
    }

    #[must_use]
    pub fn has_branch(&self, name: &str) -> bool {
        self.has(&format!("{HEADS}{name}"))
    }

    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.has(&format!("{TAGS}{name}"))
    }

    /// Local branch by short name.
    ///
    /// # Errors
    /// Returns [`Error::ReferenceNotFound`] if there is no such branch.
    pub fn branch(&self, name: &str) -> Result<&Reference> {
        self.get(&format!("{HEADS}{name}"))
    }

    /// Tag by short name.
    ///
    /// # Errors
    /// Returns [`Error::ReferenceNotFound`] if there is no such tag.
    pub fn tag(&self, name: &str) -> Result<&Reference> {
        self.get(&format!("{TAGS}{name}"))
    }

    /// True when there is at least one local or remote-tracking branch.
    #[must_use]
    pub fn has_branches(&self) -> bool {
        self.references.iter().any(Reference::is_branch)
    }

    /// First branch in `show-ref` order.
    #[must_use]
    pub fn first_branch(&self) -> Option<&Reference> {
        self.references.iter().find(|r| r.is_branch())
    }

    /// Local and remote-tracking branches.
    #[must_use]
    pub fn branches(&self) -> Vec<&Reference> {
        self.filter(Reference::is_branch)
    }

    #[must_use]
    pub fn local_branches(&self) -> Vec<&Reference> {
        self.filter(|r| matches!(r, Reference::Branch { is_local: true, .. }))
    }

    #[must_use]
    pub fn remote_branches(&self) -> Vec<&Reference> {
        self.filter(|r| matches!(r, Reference::Branch { is_local: false, .. }))
    }

    #[must_use]
    pub fn tags(&self) -> Vec<&Reference> {
        self.filter(Reference::is_tag)
    }

    #[must_use]
    pub fn all(&self) -> &[Reference] {
        &self.references
    }

    /// References pointing to commit `hash`.
    #[must_use]
    pub fn resolve(&self, hash: &str) -> Vec<&Reference> {
        self.filter(|r| r.commit_hash() == hash)
    }

    /// Tags pointing to commit `hash`.
    #[must_use]
    pub fn resolve_tags(&self, hash: &str) -> Vec<&Reference> {
        self.filter(|r| r.is_tag() && r.commit_hash() == hash)
    }

    /// Branches pointing to commit `hash`.
    #[must_use]
    pub fn resolve_branches(&self, hash: &str) -> Vec<&Reference> {
        self.filter(|r| r.is_branch() && r.commit_hash() == hash)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.references.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reference> {
        self.references.iter()
    }

    fn filter(&self, predicate: impl Fn(&Reference) -> bool) -> Vec<&Reference> {
        self.references.iter().filter(|r| predicate(r)).collect()
    }
}

impl<'a> IntoIterator for &'a ReferenceBag {
    type Item = &'a Reference;
    type IntoIter = std::slice::Iter<'a, Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::MockRunner;

    const MAIN: &str = "1111111111111111111111111111111111111111";
    const FEATURE: &str = "2222222222222222222222222222222222222222";
    const TAG_OBJECT: &str = "3333333333333333333333333333333333333333";
    const PULL: &str = "4444444444444444444444444444444444444444";

    fn listing() -> String {
        format!(
            "{MAIN} refs/heads/main\n\
             {FEATURE} refs/heads/feature/login\n\
             {PULL} refs/pull/1/head\n\
             {MAIN} refs/remotes/origin/HEAD\n\
             {MAIN} refs/remotes/origin/main\n\
             {MAIN} refs/stash\n\
             {FEATURE} refs/tags/light\n\
             {TAG_OBJECT} refs/tags/v1.0\n\
             {MAIN} refs/tags/v1.0^{{}}\n"
        )
    }

    fn bag() -> (Repository, ReferenceBag) {
        let runner = MockRunner::new().with_output("show-ref --dereference", listing());
        let repo = Repository::with_runner(".", runner);
        let bag = repo.references().unwrap();
        (repo, bag)
    }

    #[test]
    fn test_unknown_namespaces_are_skipped() {
        let (_, bag) = bag();
        assert_eq!(bag.len(), 5);
        assert!(!bag.has("refs/pull/1/head"));
        assert!(!bag.has("refs/stash"));
        assert_eq!(bag.local_branches().len(), 2);
        assert_eq!(bag.tags().len(), 2);
    }

    #[test]
    fn test_names() {
        let (_, bag) = bag();
        let feature = bag.branch("feature/login").unwrap();
        assert_eq!(feature.name(), "feature/login");
        assert_eq!(feature.remote(), None);

        let remote = bag.get("refs/remotes/origin/main").unwrap();
        assert_eq!(remote.name(), "origin/main");
        assert_eq!(remote.remote(), Some("origin"));
        assert_eq!(bag.remote_branches().len(), 1);
        assert_eq!(bag.branches().len(), 3);
    }

    #[test]
    fn test_annotated_tag_is_peeled() {
        let (_, bag) = bag();
        match bag.tag("v1.0").unwrap() {
            Reference::Tag {
                commit_hash,
                tag_object,
                ..
            } => {
                assert_eq!(commit_hash, MAIN);
                assert_eq!(tag_object.as_deref(), Some(TAG_OBJECT));
            }
            other => panic!("expected tag, got {other:?}"),
        }
        match bag.tag("light").unwrap() {
            Reference::Tag { tag_object, .. } => assert!(tag_object.is_none()),
            other => panic!("expected tag, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_by_commit() {
        let (_, bag) = bag();
        let names: Vec<_> = bag.resolve(MAIN).iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["main", "origin/main", "v1.0"]);
        assert_eq!(bag.resolve_tags(MAIN).len(), 1);
        assert_eq!(bag.resolve_branches(MAIN).len(), 2);
        assert!(bag.resolve(PULL).is_empty());
    }

    #[test]
    fn test_lookup_helpers() {
        let (repo, bag) = bag();
        assert!(bag.has_branch("main"));
        assert!(!bag.has_branch("origin/main"));
        assert!(bag.has_tag("light"));
        assert!(matches!(bag.get("refs/heads/nope"), Err(Error::ReferenceNotFound(_))));

        let commit = bag.branch("main").unwrap().commit(&repo).unwrap();
        assert!(Rc::ptr_eq(&commit, &repo.commit(MAIN).unwrap()));
    }

    #[test]
    fn test_first_branch() {
        let (_, bag) = bag();
        assert!(bag.has_branches());
        assert_eq!(bag.first_branch().unwrap().fullname(), "refs/heads/main");

        let tags_only = ReferenceBag::from_lines(
            parser::parse_references(&format!("{MAIN} refs/tags/v2\n")).unwrap(),
        );
        assert!(!tags_only.has_branches());
        assert!(tags_only.first_branch().is_none());
    }

    #[test]
    fn test_last_modification_is_author_date() {
        let payload = format!(
            "tree {PULL}\n\
             author Jane <jane@example.com> 1700000000 +0100\n\
             committer John <john@example.com> 1700000500 +0000\n\
             \n\
             Tag me\n"
        );
        let runner = MockRunner::new()
            .with_output("show-ref --dereference", listing())
            .with_output(&format!("cat-file commit {MAIN}"), payload);
        let repo = Repository::with_runner(".", runner);
        let bag = repo.references().unwrap();

        let date = bag.tag("v1.0").unwrap().last_modification(&repo).unwrap();
        assert_eq!(date.timestamp(), 1_700_000_000);
        assert_eq!(date.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_empty_repository() {
        let runner = MockRunner::new().with_failure("show-ref --dereference", 1, "");
        let repo = Repository::with_runner(".", runner);
        let bag = repo.references().unwrap();
        assert!(bag.is_empty());
        assert!(!bag.has_branches());
    }

    #[test]
    fn test_other_failures_propagate() {
        let runner = MockRunner::new().with_failure("show-ref --dereference", 128, "fatal: not a git repository");
        let repo = Repository::with_runner(".", runner);
        assert!(repo.references().unwrap_err().is_transport());
    }

    #[test]
    fn test_serialize_tagged() {
        let (_, bag) = bag();
        let json = serde_json::to_value(bag.branch("main").unwrap()).unwrap();
        assert_eq!(json["kind"], "branch");
        assert_eq!(json["is_local"], true);
    }
}
