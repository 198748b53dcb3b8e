//! `plumbline blame` command - line attribution.

use anyhow::Result;
use colored::Colorize;

use super::GlobalArgs;
use super::utils::open_repo;
use crate::output;

/// Run the blame command.
pub fn run(
    global: &GlobalArgs,
    file: &str,
    revision: &str,
    range: Option<&str>,
    grouped: bool,
) -> Result<()> {
    let (repo, _) = open_repo(global)?;
    let blame = repo.blame(revision, file, range)?;

    if blame.is_empty() {
        output::warn(&format!("{file} is empty"));
        return Ok(());
    }

    if grouped {
        for (commit, lines) in blame.grouped_lines() {
            let summary = blame
                .commit_info(commit.hash())
                .map_or("", |info| info.summary.as_str());
            output::detail(&format!(
                "{} {}",
                output::short_hash(commit.hash()),
                summary.dimmed()
            ));
            for line in lines {
                output::essential(&format!("{:>6} {}", line.number, line.content));
            }
        }
        return Ok(());
    }

    let width = blame
        .lines()
        .iter()
        .map(|line| line.number.to_string().len())
        .max()
        .unwrap_or(1);
    for line in blame.lines() {
        let author = blame
            .commit_info(line.commit.hash())
            .map_or("", |info| info.author.as_str());
        output::essential(&format!(
            "{} ({:<16} {:>width$}) {}",
            output::short_hash(line.commit.hash()),
            author,
            line.number,
            line.content
        ));
    }
    Ok(())
}
