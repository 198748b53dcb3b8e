//! `plumbline refs` command - list branches and tags.

use anyhow::Result;
use colored::Colorize;
use plumbline_git::Reference;

use super::GlobalArgs;
use super::utils::{open_repo, print_json};
use crate::output;

/// Run the refs command.
pub fn run(global: &GlobalArgs, json: bool) -> Result<()> {
    let (repo, _) = open_repo(global)?;
    let references = repo.references()?;

    if json {
        return print_json(references.all());
    }

    if references.is_empty() {
        output::warn("No references");
        return Ok(());
    }

    print_section("Branches", &references.local_branches());
    print_section("Remote branches", &references.remote_branches());
    print_section("Tags", &references.tags());
    Ok(())
}

fn print_section(title: &str, references: &[&Reference]) {
    if references.is_empty() {
        return;
    }

    output::detail(&title.bold().to_string());
    for reference in references {
        output::essential(&format!(
            "  {} {}",
            output::short_hash(reference.commit_hash()),
            reference.name()
        ));
    }
}
