use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use plumbline_git::{Commit, Config, Repository};
use serde::Serialize;

use super::GlobalArgs;

/// Config file used when `--config` is not given.
fn default_config_path(global: &GlobalArgs) -> PathBuf {
    global.dir.join(".git").join(plumbline_git::config::CONFIG_FILE)
}

/// Load the config, falling back to defaults when the file is absent.
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(global));
    Config::load(&path).with_context(|| format!("Cannot read config {}", path.display()))
}

/// Helper to open the repository and its config.
pub fn open_repo(global: &GlobalArgs) -> Result<(Repository, Config)> {
    let config = load_config(global)?;
    let repo = Repository::open_with_config(&global.dir, &config)
        .context("Not inside a git repository")?;
    Ok((repo, config))
}

/// Date in the form `git log --date=iso` prints.
#[must_use]
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y-%m-%d %H:%M:%S %z").to_string()
}

/// Serializable view of a commit.
#[derive(Debug, Serialize)]
pub struct CommitInfo {
    pub hash: String,
    pub parents: Vec<String>,
    pub author: String,
    pub author_email: String,
    pub author_date: DateTime<FixedOffset>,
    pub committer: String,
    pub committer_email: String,
    pub committer_date: DateTime<FixedOffset>,
    pub subject: String,
    pub body: String,
}

impl CommitInfo {
    pub fn from_commit(commit: &Commit) -> Result<Self> {
        let data = commit.data()?;
        Ok(Self {
            hash: commit.hash().to_string(),
            parents: data.parent_hashes.clone(),
            author: data.author_name.clone(),
            author_email: data.author_email.clone(),
            author_date: data.author_date,
            committer: data.committer_name.clone(),
            committer_email: data.committer_email.clone(),
            committer_date: data.committer_date,
            subject: commit.subject_message()?.to_string(),
            body: commit.body_message()?.to_string(),
        })
    }
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json_output = serde_json::to_string_pretty(value)?;
    crate::output::essential(&json_output);
    Ok(())
}
