//! Unified diff output of `git diff` / `git diff-tree`, optionally preceded
//! by `--raw` lines.

use std::sync::LazyLock;

use regex::Regex;

use super::{ParseError, Scanner, is_null_hash, unquote_path};
use crate::diff::{Diff, File, FileChange, Line, LineKind};

#[allow(clippy::expect_used)]
static RAW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(\d{6}) (\d{6}) ([0-9a-f]+)(?:\.\.\.)? ([0-9a-f]+)(?:\.\.\.)? ([A-Z][0-9]*)\t([^\n]+)(?:\n|$)")
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^index ([0-9a-f]+)\.\.([0-9a-f]+)(?: (\d{6}))?(?:\n|$)").expect("valid regex")
});

#[allow(clippy::expect_used)]
static SIMILARITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:dis)?similarity index \d{1,3}%(?:\n|$)").expect("valid regex")
});

#[allow(clippy::expect_used)]
static BINARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Binary files (.+) and (.+) differ(?:\n|$)").expect("valid regex")
});

#[allow(clippy::expect_used)]
static HUNK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@[^\n]*(?:\n|$)").expect("valid regex")
});

const DEV_NULL: &str = "/dev/null";

/// A `--raw` line, waiting to be attached to its patch.
#[derive(Debug)]
struct RawEntry {
    old_mode: Option<String>,
    new_mode: Option<String>,
    old_index: Option<String>,
    new_index: Option<String>,
    paths: Vec<String>,
    /// File blocks this line still describes: two for a typechange, which
    /// git prints as a deletion followed by a creation.
    remaining: u8,
}

impl RawEntry {
    fn matches(&self, old_path: &str, new_path: &str) -> bool {
        self.remaining > 0
            && self.paths.last().is_some_and(|p| p == new_path)
            && self.paths.first().is_some_and(|p| p == old_path)
    }
}

/// Modes, indexes and sides gathered from the extended headers of one file.
#[derive(Debug, Default)]
struct Headers {
    old_path: String,
    new_path: String,
    old_mode: Option<String>,
    new_mode: Option<String>,
    old_index: Option<String>,
    new_index: Option<String>,
    created: bool,
    deleted: bool,
    binary: bool,
}

/// Parse diff text into a [`Diff`].
///
/// Raw lines, when present, are the source of modes and blob indexes.
/// Without them the diff is still decoded from extended headers but flagged
/// as degraded.
///
/// # Errors
/// Returns a [`ParseError`] on any structure git would not emit. No partial
/// file list is ever returned.
pub fn parse_diff(input: &str) -> Result<Diff, ParseError> {
    let mut s = Scanner::new(input);
    let mut raw = Vec::new();
    let mut files = Vec::new();
    let mut degraded = false;

    loop {
        if s.is_finished() {
            break;
        }
        if s.expect("\n") {
            continue;
        }
        if s.peek(":") {
            raw.push(consume_raw(&mut s)?);
        } else if s.peek("diff --git ") {
            let (file, from_raw) = consume_file(&mut s, &mut raw)?;
            degraded |= !from_raw;
            files.push(file);
        } else {
            return Err(s.error("raw line or \"diff --git\"".to_string()));
        }
    }

    if degraded {
        tracing::warn!(
            files = files.len(),
            "diff parsed without raw mode/index information"
        );
    }

    Ok(Diff::with_degraded(files, degraded))
}

fn consume_raw(s: &mut Scanner<'_>) -> Result<RawEntry, ParseError> {
    let caps = s.consume_regex(&RAW)?;
    Ok(RawEntry {
        old_mode: non_null_mode(&caps[1]),
        new_mode: non_null_mode(&caps[2]),
        old_index: non_null_index(&caps[3]),
        new_index: non_null_index(&caps[4]),
        paths: caps[6]
            .split('\t')
            .map(|p| unquote_path(p).to_string())
            .collect(),
        remaining: if caps[5].starts_with('T') { 2 } else { 1 },
    })
}

/// Decode one `diff --git` block. The flag tells whether a raw line was
/// attached to it.
fn consume_file(s: &mut Scanner<'_>, raw: &mut [RawEntry]) -> Result<(File, bool), ParseError> {
    s.consume("diff --git ")?;
    let title_start = s.clone();
    let title = s.consume_line();
    let (old_path, new_path) =
        split_title(title).ok_or_else(|| title_start.error("a/<path> b/<path>".to_string()))?;

    let mut headers = Headers {
        old_path,
        new_path,
        ..Headers::default()
    };
    consume_extended_headers(s, &mut headers)?;

    let mut changes = Vec::new();
    if !headers.binary {
        while s.peek("@@ ") {
            changes.push(consume_hunk(s)?);
        }
    }

    let attached = raw
        .iter_mut()
        .find(|entry| entry.matches(&headers.old_path, &headers.new_path));
    let from_raw = attached.is_some();

    let (old_mode, new_mode, old_index, new_index) = match attached {
        Some(entry) => {
            entry.remaining -= 1;
            (
                entry.old_mode.clone(),
                entry.new_mode.clone(),
                entry.old_index.clone(),
                entry.new_index.clone(),
            )
        }
        None => (headers.old_mode.take(), headers.new_mode.take(), None, None),
    };

    let old_name = (!headers.created).then_some(headers.old_path);
    let new_name = (!headers.deleted).then_some(headers.new_path);
    let old_index = side_index(old_name.is_some(), old_index, headers.old_index);
    let new_index = side_index(new_name.is_some(), new_index, headers.new_index);
    let mut file = File::new(
        old_name.clone(),
        new_name.clone(),
        old_name.and(old_mode),
        new_name.and(new_mode),
        old_index,
        new_index,
        headers.binary,
    );
    for change in changes {
        file.add_change(change);
    }

    Ok((file, from_raw))
}

fn consume_extended_headers(s: &mut Scanner<'_>, h: &mut Headers) -> Result<(), ParseError> {
    loop {
        if s.expect("old mode ") {
            h.old_mode = Some(s.consume_line().to_string());
        } else if s.expect("new mode ") {
            h.new_mode = Some(s.consume_line().to_string());
        } else if s.expect("new file mode ") {
            h.new_mode = Some(s.consume_line().to_string());
            h.created = true;
        } else if s.expect("deleted file mode ") {
            h.old_mode = Some(s.consume_line().to_string());
            h.deleted = true;
        } else if s.peek("similarity index ") || s.peek("dissimilarity index ") {
            s.consume_regex(&SIMILARITY)?;
        } else if s.expect("rename from ") || s.expect("copy from ") {
            h.old_path = unquote_path(s.consume_line()).to_string();
        } else if s.expect("rename to ") || s.expect("copy to ") {
            h.new_path = unquote_path(s.consume_line()).to_string();
        } else if s.peek("index ") {
            let caps = s.consume_regex(&INDEX)?;
            h.old_index = Some(caps[1].to_string());
            h.new_index = Some(caps[2].to_string());
            if let Some(mode) = caps.get(3) {
                h.old_mode = Some(mode.as_str().to_string());
                h.new_mode = Some(mode.as_str().to_string());
            }
        } else if s.expect("--- ") {
            match patch_path(s.consume_line(), "a/") {
                Some(path) => h.old_path = path,
                None => h.created = true,
            }
        } else if s.expect("+++ ") {
            match patch_path(s.consume_line(), "b/") {
                Some(path) => h.new_path = path,
                None => h.deleted = true,
            }
        } else if s.peek("Binary files ") {
            let caps = s.consume_regex(&BINARY)?;
            h.created |= &caps[1] == DEV_NULL;
            h.deleted |= &caps[2] == DEV_NULL;
            h.binary = true;
        } else {
            return Ok(());
        }
    }
}

fn consume_hunk(s: &mut Scanner<'_>) -> Result<FileChange, ParseError> {
    let start = s.clone();
    let caps = s.consume_regex(&HUNK)?;
    let number = |i: usize, default: usize| -> Result<usize, ParseError> {
        caps.get(i).map_or(Ok(default), |m| {
            m.as_str()
                .parse()
                .map_err(|_| start.error("hunk range".to_string()))
        })
    };
    let old_start = number(1, 0)?;
    let old_count = number(2, 1)?;
    let new_start = number(3, 0)?;
    let new_count = number(4, 1)?;

    let mut old_remaining = old_count;
    let mut new_remaining = new_count;
    let mut lines = Vec::new();

    while old_remaining > 0 || new_remaining > 0 {
        let kind = if s.expect(" ") || s.peek("\n") {
            LineKind::Context
        } else if s.expect("+") {
            LineKind::Add
        } else if s.expect("-") {
            LineKind::Remove
        } else if s.expect("\\") {
            s.consume_line();
            continue;
        } else {
            return Err(s.error("hunk line starting with ' ', '+' or '-'".to_string()));
        };

        match kind {
            LineKind::Context => {
                old_remaining = old_remaining.saturating_sub(1);
                new_remaining = new_remaining.saturating_sub(1);
            }
            LineKind::Add => new_remaining = new_remaining.saturating_sub(1),
            LineKind::Remove => old_remaining = old_remaining.saturating_sub(1),
        }
        lines.push(Line {
            kind,
            content: s.consume_line().to_string(),
        });
    }

    // "\ No newline at end of file" after the last line
    while s.expect("\\") {
        s.consume_line();
    }

    Ok(FileChange::new(old_start, old_count, new_start, new_count, lines))
}

/// Split `a/<old> b/<new>` (either side possibly quoted).
fn split_title(title: &str) -> Option<(String, String)> {
    if let Some(rest) = title.strip_prefix('"') {
        let end = find_closing_quote(rest)?;
        let old = &rest[..end];
        let new = unquote_path(rest[end + 1..].trim_start());
        return Some((old.strip_prefix("a/")?.to_string(), new.strip_prefix("b/")?.to_string()));
    }

    if let Some(pos) = title.find(" \"b/") {
        let new = unquote_path(&title[pos + 1..]);
        return Some((title[..pos].strip_prefix("a/")?.to_string(), new.strip_prefix("b/")?.to_string()));
    }

    // Same path on both sides: "a/X b/X", the common case even with spaces.
    let half = title.len().checked_sub(1)? / 2;
    if title.len() % 2 == 1 && title.is_char_boundary(half) {
        let (old, new) = (&title[..half], &title[half + 1..]);
        if let (Some(o), Some(n)) = (old.strip_prefix("a/"), new.strip_prefix("b/")) {
            if o == n {
                return Some((o.to_string(), n.to_string()));
            }
        }
    }

    let pos = title.find(" b/")?;
    Some((title[..pos].strip_prefix("a/")?.to_string(), title[pos + 3..].to_string()))
}

fn find_closing_quote(quoted: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in quoted.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(i),
            _ => escaped = false,
        }
    }
    None
}

/// Path of a `---`/`+++` line, `None` for `/dev/null`.
fn patch_path(line: &str, prefix: &str) -> Option<String> {
    // git appends a tab to names containing spaces
    let line = line.strip_suffix('\t').unwrap_or(line);
    if line == DEV_NULL {
        return None;
    }
    let path = unquote_path(line);
    Some(path.strip_prefix(prefix).unwrap_or(path).to_string())
}

/// Blob index of one side: `None` when the side does not exist, the first
/// known hash from the raw line or the `index` header, `""` when neither
/// knows it (worktree content has a null raw hash).
fn side_index(exists: bool, raw: Option<String>, header: Option<String>) -> Option<String> {
    exists.then(|| {
        raw.into_iter()
            .chain(header)
            .find(|index| !index.is_empty() && !is_null_hash(index))
            .unwrap_or_default()
    })
}

fn non_null_index(value: &str) -> Option<String> {
    (!is_null_hash(value)).then(|| value.to_string())
}

fn non_null_mode(value: &str) -> Option<String> {
    (value != "000000").then(|| value.to_string())
}
