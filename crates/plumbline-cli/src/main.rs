//! Plumbline CLI - browse git history through plumbing output.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);
    output::set_quiet(cli.global.quiet);

    let global = &cli.global;
    let result = match cli.command {
        Commands::Log {
            revision,
            limit,
            skip,
            name_status,
            json,
            paths,
        } => commands::log::run(
            global,
            &commands::log::LogArgs {
                revision,
                limit,
                skip,
                name_status,
                json,
                paths,
            },
        ),
        Commands::Show { revision, json } => commands::show::run(global, &revision, json),
        Commands::Tree { revision, path } => {
            commands::tree::run(global, &revision, path.as_deref())
        }
        Commands::Cat { revision, path } => commands::cat::run(global, &revision, &path),
        Commands::Refs { json } => commands::refs::run(global, json),
        Commands::Blame {
            file,
            rev,
            range,
            grouped,
        } => commands::blame::run(global, &file, &rev, range.as_deref(), grouped),
        Commands::Diff {
            revisions,
            staged,
            stat,
            json,
        } => commands::diff::run(global, &revisions, staged, stat, json),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
