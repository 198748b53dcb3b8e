//! Running git subcommands.
//!
//! The [`CommandRunner`] trait is the only place this crate touches a
//! process. Everything above it works on captured output, so tests can
//! inject canned responses instead of a git binary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::GitConfig;
use crate::error::{Error, Result};

/// Runs one git subcommand in a repository and captures its output.
#[allow(clippy::missing_errors_doc)]
pub trait CommandRunner {
    /// Run `git <command> <args...>` and return stdout as bytes.
    ///
    /// A non-zero exit status is an [`Error::Process`].
    fn run_raw(&self, command: &str, args: &[&str]) -> Result<Vec<u8>>;

    /// Like [`run_raw`](Self::run_raw), decoding stdout as UTF-8.
    ///
    /// Decoding is lossy: bytes that are not valid UTF-8 (file content in
    /// another encoding, in diffs and blame output) come back as U+FFFD.
    /// Use `run_raw` where the exact bytes matter, as blobs do.
    fn run(&self, command: &str, args: &[&str]) -> Result<String> {
        let bytes = self.run_raw(command, args)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// [`CommandRunner`] backed by the git command line tool.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: PathBuf,
    workdir: PathBuf,
    env: BTreeMap<String, String>,
}

impl GitCli {
    /// Run git from `workdir` with the binary and environment of `config`.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>, config: &GitConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            workdir: workdir.into(),
            env: config.env.clone(),
        }
    }

    /// Directory git runs in.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl CommandRunner for GitCli {
    fn run_raw(&self, command: &str, args: &[&str]) -> Result<Vec<u8>> {
        let command_line = display_command(command, args);
        tracing::debug!(command = %command_line, "running git");

        let output = Command::new(&self.binary)
            .arg(command)
            .args(args)
            .current_dir(&self.workdir)
            .envs(&self.env)
            .output()
            .map_err(|source| Error::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::debug!(command = %command_line, code = ?output.status.code(), stderr = %stderr.trim(), "git failed");
            return Err(Error::Process {
                command: command_line,
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}

/// `command arg1 arg2`, the form used in logs, errors and test fixtures.
pub(crate) fn display_command(command: &str, args: &[&str]) -> String {
    std::iter::once(command)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
