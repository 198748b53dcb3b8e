//! Configured remotes, as listed by `remote -v`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::Repository;
use crate::error::Result;
use crate::parser::{self, RemoteLine};
use crate::reference::{Reference, ReferenceBag};

/// A named remote with its URL per direction (`fetch`, `push`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remote {
    name: String,
    urls: BTreeMap<String, String>,
}

impl Remote {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URLs keyed by direction.
    #[must_use]
    pub const fn urls(&self) -> &BTreeMap<String, String> {
        &self.urls
    }

    #[must_use]
    pub fn fetch_url(&self) -> Option<&str> {
        self.urls.get("fetch").map(String::as_str)
    }

    #[must_use]
    pub fn push_url(&self) -> Option<&str> {
        self.urls.get("push").map(String::as_str)
    }

    /// Remote-tracking branches of this remote (`refs/remotes/<name>/...`).
    #[must_use]
    pub fn local_references<'a>(&self, references: &'a ReferenceBag) -> Vec<&'a Reference> {
        let prefix = format!("refs/remotes/{}/", self.name);
        references
            .iter()
            .filter(|r| r.fullname().starts_with(&prefix))
            .collect()
    }
}

/// All remotes, in the order git lists them.
#[derive(Debug, Clone, Default)]
pub struct RemoteBag {
    remotes: Vec<Remote>,
}

impl RemoteBag {
    /// Run `remote -v` and group its lines by remote name.
    ///
    /// # Errors
    /// Returns error if `git remote` fails or prints something unexpected.
    pub(crate) fn load(repository: &Repository) -> Result<Self> {
        let output = repository.run("remote", &["-v"])?;
        Ok(Self::from_lines(parser::parse_remotes(&output)?))
    }

    fn from_lines(lines: Vec<RemoteLine>) -> Self {
        let mut bag = Self::default();
        for line in lines {
            let position = bag.remotes.iter().position(|r| r.name == line.name);
            let remote = match position {
                Some(index) => &mut bag.remotes[index],
                None => {
                    bag.remotes.push(Remote {
                        name: line.name,
                        urls: BTreeMap::new(),
                    });
                    let last = bag.remotes.len() - 1;
                    &mut bag.remotes[last]
                }
            };
            remote.urls.insert(line.direction, line.url);
        }
        bag
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Remote> {
        self.remotes.iter().find(|r| r.name == name)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn all(&self) -> &[Remote] {
        &self.remotes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.remotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Remote> {
        self.remotes.iter()
    }
}

impl<'a> IntoIterator for &'a RemoteBag {
    type Item = &'a Remote;
    type IntoIter = std::slice::Iter<'a, Remote>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
