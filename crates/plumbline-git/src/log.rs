//! Commit history queries.

use std::rc::Rc;

use crate::Repository;
use crate::diff::Diff;
use crate::error::Result;
use crate::objects::Commit;
use crate::parser::{self, FileStatus};

/// A commit with the paths it touched (`--name-status`).
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub commit: Rc<Commit>,
    pub changes: Vec<FileStatus>,
}

/// History of a set of revisions, optionally limited to paths.
///
/// Nothing runs until one of the query methods is called; each call runs
/// git again.
#[derive(Debug, Clone)]
pub struct Log {
    repository: Repository,
    revisions: Vec<String>,
    paths: Vec<String>,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl Log {
    pub(crate) fn new(repository: Repository, revisions: &[&str], paths: &[&str]) -> Self {
        Self {
            repository,
            revisions: revisions.iter().map(ToString::to_string).collect(),
            paths: paths.iter().map(ToString::to_string).collect(),
            offset: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn revisions(&self) -> &[String] {
        &self.revisions
    }

    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        self.offset
    }

    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Skip the first `offset` commits.
    #[must_use]
    pub const fn with_offset(mut self, offset: Option<usize>) -> Self {
        self.offset = offset;
        self
    }

    /// Stop after `limit` commits.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Commits in git's order. Each one comes back loaded, so reading its
    /// fields runs no further command.
    ///
    /// # Errors
    /// Returns error if `git log` fails or its output is malformed.
    pub fn commits(&self) -> Result<Vec<Rc<Commit>>> {
        Ok(self
            .load(false)?
            .into_iter()
            .map(|entry| entry.commit)
            .collect())
    }

    /// Commits with their `--name-status` changes.
    ///
    /// # Errors
    /// Returns error if `git log` fails or its output is malformed.
    pub fn records(&self) -> Result<Vec<LogEntry>> {
        self.load(true)
    }

    /// The first commit of this log, if any.
    ///
    /// # Errors
    /// Returns error if `git log` fails or its output is malformed.
    pub fn single_commit(&self) -> Result<Option<Rc<Commit>>> {
        let first = self.clone().with_limit(Some(1));
        Ok(first.commits()?.into_iter().next())
    }

    /// Number of commits, honoring offset and limit.
    ///
    /// # Errors
    /// Returns error if `git rev-list` fails.
    pub fn count_commits(&self) -> Result<usize> {
        let mut args = vec!["--count".to_string()];
        args.extend(self.range_args());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self.repository.run("rev-list", &args)?;
        output.trim().parse().map_err(|_| {
            crate::Error::Parse(parser::ParseError {
                position: 0,
                expected: "commit count".to_string(),
                found: output.trim().chars().take(40).collect(),
            })
        })
    }

    /// Diff over this log's revisions.
    ///
    /// # Errors
    /// Returns error if `git diff` fails or its output is malformed.
    pub fn diff(&self) -> Result<Diff> {
        let revisions: Vec<&str> = self.revisions.iter().map(String::as_str).collect();
        self.repository.diff(&revisions)
    }

    fn load(&self, name_status: bool) -> Result<Vec<LogEntry>> {
        let mut args = vec![
            "--encoding=UTF-8".to_string(),
            "--format=raw".to_string(),
            "--no-decorate".to_string(),
        ];
        if name_status {
            args.push("--name-status".to_string());
        }
        args.extend(self.range_args());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self.repository.run("log", &args)?;
        let records = parser::parse_log(&output)?;
        tracing::debug!(commits = records.len(), "parsed log");

        records
            .into_iter()
            .map(|record| {
                let commit = self.repository.commit(&record.hash)?;
                commit.preload(record.commit);
                Ok(LogEntry {
                    commit,
                    changes: record.changes,
                })
            })
            .collect()
    }

    /// `[--skip=N] [-n N] <revisions>|--all -- <paths>`
    fn range_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(offset) = self.offset {
            args.push(format!("--skip={offset}"));
        }
        if let Some(limit) = self.limit {
            args.push("-n".to_string());
            args.push(limit.to_string());
        }
        if self.revisions.is_empty() {
            args.push("--all".to_string());
        } else {
            args.extend(self.revisions.iter().cloned());
        }
        args.push("--".to_string());
        args.extend(self.paths.iter().cloned());
        args
    }
}
