//! Command definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

pub mod blame;
pub mod cat;
pub mod completions;
pub mod diff;
pub mod log;
pub mod refs;
pub mod show;
pub mod tree;
pub mod utils;

/// Browse git history through plumbing output.
#[derive(Debug, Parser)]
#[command(name = "plumbline", version, about, propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Run as if started in <DIR>.
    #[arg(short = 'C', global = true, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Config file (default: <repo>/.git/plumbline.toml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show commit history.
    Log {
        /// Revision to start from (all references when omitted).
        revision: Option<String>,

        /// Number of commits to show (default from config).
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Skip this many commits first.
        #[arg(long)]
        skip: Option<usize>,

        /// Include the files each commit touched.
        #[arg(long)]
        name_status: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Limit to commits touching these paths.
        #[arg(last = true)]
        paths: Vec<String>,
    },

    /// Show one commit with its diff.
    Show {
        /// Revision to show.
        #[arg(default_value = "HEAD")]
        revision: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List a tree.
    Tree {
        /// Revision whose tree to list.
        #[arg(default_value = "HEAD")]
        revision: String,

        /// Subdirectory to list.
        path: Option<String>,
    },

    /// Print a file as of a revision.
    Cat {
        /// Revision to read from.
        revision: String,

        /// Path of the file.
        path: String,
    },

    /// List branches and tags.
    Refs {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show who last changed each line of a file.
    Blame {
        /// File to blame.
        file: String,

        /// Revision to blame at.
        #[arg(long, default_value = "HEAD")]
        rev: String,

        /// Line range, as accepted by `git blame -L`.
        #[arg(short = 'L', value_name = "RANGE")]
        range: Option<String>,

        /// Print one header per run of lines from the same commit.
        #[arg(long)]
        grouped: bool,
    },

    /// Show changes between revisions or in the working copy.
    Diff {
        /// Revisions to compare (`a..b` or `a b`). Working copy when empty.
        revisions: Vec<String>,

        /// Compare the index against HEAD.
        #[arg(long, conflicts_with = "revisions")]
        staged: bool,

        /// Only list touched files.
        #[arg(long)]
        stat: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from(["plumbline", "refs", "-C", "/tmp", "-vv", "--json"]);
        assert_eq!(cli.global.dir, PathBuf::from("/tmp"));
        assert_eq!(cli.global.verbose, 2);
        assert!(matches!(cli.command, Commands::Refs { json: true }));
    }

    #[test]
    fn test_log_paths_after_separator() {
        let cli = Cli::parse_from(["plumbline", "log", "main", "-n", "3", "--", "src", "docs"]);
        match cli.command {
            Commands::Log {
                revision,
                limit,
                paths,
                ..
            } => {
                assert_eq!(revision.as_deref(), Some("main"));
                assert_eq!(limit, Some(3));
                assert_eq!(paths, vec!["src", "docs"]);
            }
            other => panic!("expected log, got {other:?}"),
        }
    }
}
