//! `plumbline log` command - show commit history.

use anyhow::Result;
use plumbline_git::parser::FileStatus;
use plumbline_git::{LogEntry, SHORT_MESSAGE_LIMIT};
use serde::Serialize;

use super::GlobalArgs;
use super::utils::{CommitInfo, open_repo, print_json};
use crate::output;

/// Arguments of the log command.
#[derive(Debug)]
pub struct LogArgs {
    pub revision: Option<String>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub name_status: bool,
    pub json: bool,
    pub paths: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LogItem<'a> {
    #[serde(flatten)]
    commit: CommitInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<&'a [FileStatus]>,
}

/// Run the log command.
pub fn run(global: &GlobalArgs, args: &LogArgs) -> Result<()> {
    let (repo, config) = open_repo(global)?;

    let revisions: Vec<&str> = args.revision.iter().map(String::as_str).collect();
    let paths: Vec<&str> = args.paths.iter().map(String::as_str).collect();
    let log = repo
        .log(&revisions, &paths)
        .with_offset(args.skip)
        .with_limit(Some(args.limit.unwrap_or(config.log.limit)));

    let entries: Vec<LogEntry> = if args.name_status {
        log.records()?
    } else {
        log.commits()?
            .into_iter()
            .map(|commit| LogEntry {
                commit,
                changes: Vec::new(),
            })
            .collect()
    };

    if args.json {
        let items = entries
            .iter()
            .map(|entry| {
                Ok(LogItem {
                    commit: CommitInfo::from_commit(&entry.commit)?,
                    changes: args.name_status.then_some(entry.changes.as_slice()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        return print_json(&items);
    }

    if entries.is_empty() {
        output::warn("No commits");
        return Ok(());
    }

    let references = repo.references()?;
    for entry in &entries {
        let commit = &entry.commit;
        let decorations = output::decorations(&references.resolve(commit.hash()));
        let line = format!(
            "{} {:<20} {} {}",
            output::short_hash(commit.hash()),
            commit.author_name()?,
            commit.short_message(SHORT_MESSAGE_LIMIT)?,
            decorations
        );
        output::essential(line.trim_end());

        for change in &entry.changes {
            output::detail(&format!("    {:<5} {}", change.status, change.paths.join(" -> ")));
        }
    }

    Ok(())
}
