//! Configuration loaded from `.git/plumbline.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name of the configuration, relative to the git directory.
pub const CONFIG_FILE: &str = "plumbline.toml";

/// Plumbline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// How git is invoked.
    #[serde(default)]
    pub git: GitConfig,

    /// Log defaults.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load config from a TOML file. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save config to a TOML file.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| std::io::Error::other(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Settings for the git subprocess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    /// git executable, looked up on `PATH` when relative.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Extra environment for every invocation.
    #[serde(default = "default_env")]
    pub env: BTreeMap<String, String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            env: default_env(),
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("git")
}

// Parsers match English plumbing messages and plain byte paths.
fn default_env() -> BTreeMap<String, String> {
    BTreeMap::from([("LC_ALL".to_string(), "C".to_string())])
}

/// Defaults for history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Commits shown when no explicit limit is given.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

const fn default_limit() -> usize {
    20
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.git.binary, PathBuf::from("git"));
        assert_eq!(config.git.env.get("LC_ALL").map(String::as_str), Some("C"));
        assert_eq!(config.log.limit, 20);
    }

    #[test]
    fn test_config_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);

        let mut config = Config::default();
        config.git.binary = PathBuf::from("/usr/local/bin/git");
        config.git.env.insert("GIT_CONFIG_NOSYSTEM".into(), "1".into());
        config.log.limit = 50;

        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[log]\nlimit = 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.log.limit, 5);
        assert_eq!(config.git, GitConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[log\nlimit = ").unwrap();
        assert!(matches!(Config::load(&path), Err(crate::Error::Toml(_))));
    }
}
