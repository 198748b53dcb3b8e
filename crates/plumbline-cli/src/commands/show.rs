//! `plumbline show` command - one commit with its diff.

use anyhow::Result;
use plumbline_git::Diff;
use serde::Serialize;

use super::GlobalArgs;
use super::diff::print_diff;
use super::utils::{CommitInfo, format_date, open_repo, print_json};
use crate::output;

#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    #[serde(flatten)]
    commit: CommitInfo,
    diff: &'a Diff,
}

/// Run the show command.
pub fn run(global: &GlobalArgs, revision: &str, json: bool) -> Result<()> {
    let (repo, _) = open_repo(global)?;
    let commit = repo.resolve_revision(revision)?;
    let diff = commit.diff()?;

    if json {
        return print_json(&ShowOutput {
            commit: CommitInfo::from_commit(&commit)?,
            diff,
        });
    }

    output::essential(&format!("commit {}", commit.hash()));
    let parents = commit.parent_hashes()?;
    if parents.len() > 1 {
        output::detail(&format!("Merge: {}", parents.join(" ")));
    }
    output::detail(&format!(
        "Author: {} <{}>",
        commit.author_name()?,
        commit.author_email()?
    ));
    output::detail(&format!("Date:   {}", format_date(&commit.author_date()?)));
    output::detail("");
    for line in commit.message()?.lines() {
        output::detail(&format!("    {line}"));
    }
    output::hr();

    print_diff(diff, false);
    Ok(())
}
