//! `plumbline diff` command - changes between revisions or in the working copy.

use anyhow::Result;
use colored::Colorize;
use plumbline_git::{Diff, File};

use super::GlobalArgs;
use super::utils::{open_repo, print_json};
use crate::output;

/// Run the diff command.
pub fn run(
    global: &GlobalArgs,
    revisions: &[String],
    staged: bool,
    stat: bool,
    json: bool,
) -> Result<()> {
    let (repo, _) = open_repo(global)?;

    let diff = if staged || revisions.is_empty() {
        repo.working_copy_diff(staged)?
    } else {
        let revisions: Vec<&str> = revisions.iter().map(String::as_str).collect();
        repo.diff(&revisions)?
    };

    if json {
        return print_json(&diff.to_array()?);
    }

    if diff.files().is_empty() {
        output::warn("No changes");
        return Ok(());
    }
    if diff.is_degraded() {
        output::warn("Diff had no raw lines; modes and indexes may be incomplete");
    }

    print_diff(&diff, stat);
    Ok(())
}

/// Print every file of a diff, with or without its hunks.
pub fn print_diff(diff: &Diff, stat: bool) {
    for file in diff.files() {
        output::essential(&file_header(file));
        if stat || file.is_binary() {
            continue;
        }
        for change in file.changes() {
            output::essential(
                &format!(
                    "@@ -{},{} +{},{} @@",
                    change.range_old_start(),
                    change.range_old_count(),
                    change.range_new_start(),
                    change.range_new_count()
                )
                .cyan()
                .to_string(),
            );
            for line in change.lines() {
                output::essential(&output::diff_line(line.kind, &line.content));
            }
        }
    }
}

/// One summary line per file: status, name and line counts.
fn file_header(file: &File) -> String {
    let (status, name) = if file.is_creation() {
        ("A".green(), file.name().to_string())
    } else if file.is_deletion() {
        ("D".red(), file.name().to_string())
    } else if file.is_rename() {
        (
            "R".yellow(),
            format!(
                "{} -> {}",
                file.old_name().unwrap_or_default(),
                file.new_name().unwrap_or_default()
            ),
        )
    } else {
        ("M".blue(), file.name().to_string())
    };

    let counts = if file.is_binary() {
        "binary".dimmed().to_string()
    } else {
        format!(
            "{} {}",
            format!("+{}", file.additions()).green(),
            format!("-{}", file.deletions()).red()
        )
    };

    let mut header = format!("{status} {} {counts}", name.bold());
    if file.is_change_mode() {
        header.push_str(&format!(
            " ({} -> {})",
            file.old_mode().unwrap_or_default(),
            file.new_mode().unwrap_or_default()
        ));
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(old: Option<&str>, new: Option<&str>) -> File {
        File::new(
            old.map(String::from),
            new.map(String::from),
            Some("100644".to_string()),
            Some("100755".to_string()),
            None,
            None,
            false,
        )
    }

    #[test]
    fn test_file_header_rename() {
        let header = file_header(&file(Some("a.txt"), Some("b.txt")));
        assert!(header.contains("a.txt -> b.txt"));
        assert!(header.contains("100644 -> 100755"));
    }

    #[test]
    fn test_file_header_creation() {
        let header = file_header(&file(None, Some("new.txt")));
        assert!(header.contains("new.txt"));
        assert!(header.contains("+0"));
    }
}
