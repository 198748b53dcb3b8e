//! `plumbline tree` command - list a tree.

use anyhow::{Result, bail};
use plumbline_git::TreeObject;

use super::GlobalArgs;
use super::utils::open_repo;
use crate::output;

/// Run the tree command.
pub fn run(global: &GlobalArgs, revision: &str, path: Option<&str>) -> Result<()> {
    let (repo, _) = open_repo(global)?;
    let root = repo.resolve_revision(revision)?.tree()?;

    let tree = match path.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        None => root,
        Some(path) => match root.resolve_path(path)? {
            TreeObject::Tree(tree) => tree,
            other => bail!("{path} is a {}, not a directory", other.kind()),
        },
    };

    for entry in tree.entries()? {
        output::essential(&format!(
            "{} {} {}",
            entry.mode,
            output::short_hash(&entry.hash),
            output::entry_name(entry.kind, &entry.name)
        ));
    }
    Ok(())
}
