//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use plumbline_git::{EntryKind, LineKind, Reference};

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print a detail line without prefix (suppressed in quiet mode).
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential output (always prints).
///
/// Use for the data a command exists to show: hashes, file contents, JSON.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}

/// Abbreviated, colored commit hash.
#[must_use]
pub fn short_hash(hash: &str) -> String {
    hash.get(..7).unwrap_or(hash).yellow().to_string()
}

/// Decoration listing the references pointing at a commit.
#[must_use]
pub fn decorations(references: &[&Reference]) -> String {
    if references.is_empty() {
        return String::new();
    }

    let names: Vec<String> = references
        .iter()
        .map(|r| match r {
            Reference::Tag { .. } => format!("tag: {}", r.name()).yellow().to_string(),
            Reference::Branch { is_local: true, .. } => r.name().green().bold().to_string(),
            Reference::Branch { .. } => r.name().red().to_string(),
        })
        .collect();
    format!("({})", names.join(", "))
}

/// A hunk line with its diff prefix, colored by kind.
#[must_use]
pub fn diff_line(kind: LineKind, content: &str) -> String {
    match kind {
        LineKind::Add => format!("+{content}").green().to_string(),
        LineKind::Remove => format!("-{content}").red().to_string(),
        LineKind::Context => format!(" {content}"),
    }
}

/// Name of a tree entry, directories marked with a trailing slash.
#[must_use]
pub fn entry_name(kind: EntryKind, name: &str) -> String {
    match kind {
        EntryKind::Tree => format!("{name}/").blue().bold().to_string(),
        EntryKind::Commit => format!("{name}@").cyan().to_string(),
        EntryKind::Blob => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colored::Colorize;

    fn tag(name: &str) -> Reference {
        Reference::Tag {
            fullname: format!("refs/tags/{name}"),
            commit_hash: "a".repeat(40),
            tag_object: None,
        }
    }

    fn branch(fullname: &str, is_local: bool) -> Reference {
        Reference::Branch {
            fullname: fullname.to_string(),
            commit_hash: "a".repeat(40),
            is_local,
        }
    }

    #[test]
    fn test_short_hash() {
        assert!(short_hash("0123456789abcdef").contains("0123456"));
        assert!(!short_hash("0123456789abcdef").contains("0123456789"));
        assert!(short_hash("abc").contains("abc"));
    }

    #[test]
    fn test_decorations() {
        let main = branch("refs/heads/main", true);
        let remote = branch("refs/remotes/origin/main", false);
        let v1 = tag("v1.0");
        assert_eq!(decorations(&[]), "");

        let text = decorations(&[&main, &remote, &v1]);
        assert!(text.starts_with('('));
        assert!(text.contains("origin/main"));
        assert!(text.contains("tag: v1.0"));
    }

    #[test]
    fn test_diff_line_colors_match_kind() {
        colored::control::set_override(true);

        assert_eq!(diff_line(LineKind::Add, "x"), "+x".green().to_string());
        assert_eq!(diff_line(LineKind::Remove, "x"), "-x".red().to_string());
        assert_eq!(diff_line(LineKind::Context, "x"), " x");

        colored::control::set_override(false);
    }

    #[test]
    fn test_entry_name() {
        assert!(entry_name(EntryKind::Tree, "src").contains("src/"));
        assert!(entry_name(EntryKind::Commit, "vendor").contains("vendor@"));
        assert_eq!(entry_name(EntryKind::Blob, "README.md"), "README.md");
    }

    #[test]
    fn test_quiet_mode_enabled() {
        set_quiet(true);
        assert!(is_quiet());
        // Reset
        set_quiet(false);
    }
}
