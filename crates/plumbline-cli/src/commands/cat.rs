//! `plumbline cat` command - print a file as of a revision.

use std::io::Write;

use anyhow::{Context, Result, bail};
use plumbline_git::TreeObject;

use super::GlobalArgs;
use super::utils::open_repo;

/// Run the cat command.
pub fn run(global: &GlobalArgs, revision: &str, path: &str) -> Result<()> {
    let (repo, _) = open_repo(global)?;
    let tree = repo.resolve_revision(revision)?.tree()?;

    let blob = match tree.resolve_path(path)? {
        TreeObject::Blob(blob) => blob,
        other => bail!("{path} is a {}, not a file", other.kind()),
    };

    tracing::debug!(path, mimetype = blob.mimetype()?, "printing blob");
    std::io::stdout()
        .write_all(blob.content()?)
        .context("Cannot write to stdout")?;
    Ok(())
}
