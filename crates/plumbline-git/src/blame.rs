//! Line attribution (`git blame -p`).

use std::collections::HashMap;
use std::rc::Rc;

use crate::Repository;
use crate::error::{Error, Result};
use crate::objects::Commit;
use crate::parser::{BlameCommitInfo, BlameOutput};

/// One line of the blamed file.
#[derive(Debug, Clone)]
pub struct BlameLine {
    /// 1-based line number in the blamed file.
    pub number: usize,
    /// Line number in the commit that introduced it.
    pub original_number: usize,
    pub commit: Rc<Commit>,
    pub content: String,
}

/// Attribution of every line of a file, in file order.
#[derive(Debug, Clone)]
pub struct Blame {
    lines: Vec<BlameLine>,
    commits: HashMap<String, BlameCommitInfo>,
}

impl Blame {
    pub(crate) fn from_output(repository: &Repository, output: BlameOutput) -> Result<Self> {
        let lines = output
            .records
            .into_iter()
            .map(|record| {
                Ok(BlameLine {
                    number: record.final_line,
                    original_number: record.original_line,
                    commit: repository.commit(&record.hash)?,
                    content: record.content,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            lines,
            commits: output.commits,
        })
    }

    #[must_use]
    pub fn lines(&self) -> &[BlameLine] {
        &self.lines
    }

    /// Line `number` (1-based).
    ///
    /// # Errors
    /// Returns [`Error::LineOutOfRange`] when the blame has no such line.
    pub fn line(&self, number: usize) -> Result<&BlameLine> {
        self.lines
            .iter()
            .find(|line| line.number == number)
            .ok_or(Error::LineOutOfRange(number))
    }

    /// Consecutive lines from the same commit, in file order.
    #[must_use]
    pub fn grouped_lines(&self) -> Vec<(Rc<Commit>, Vec<&BlameLine>)> {
        let mut groups: Vec<(Rc<Commit>, Vec<&BlameLine>)> = Vec::new();
        for line in &self.lines {
            match groups.last_mut() {
                Some((commit, lines)) if Rc::ptr_eq(commit, &line.commit) => lines.push(line),
                _ => groups.push((Rc::clone(&line.commit), vec![line])),
            }
        }
        groups
    }

    /// Porcelain metadata (author, summary, ...) of a blamed commit.
    #[must_use]
    pub fn commit_info(&self, hash: &str) -> Option<&BlameCommitInfo> {
        self.commits.get(hash)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
