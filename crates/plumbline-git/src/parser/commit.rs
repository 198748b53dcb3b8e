//! Commit header grammar, shared by `cat-file commit` and `log --format=raw`.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ParseError, Scanner};

#[allow(clippy::expect_used)]
static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\n]*) <([^\n]*)> (-?\d+) ([+-])(\d{2})(\d{2})").expect("valid regex")
});

/// Decoded commit object (everything but its own hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitData {
    /// Hash of the root tree.
    pub tree_hash: String,
    /// Parent hashes in recorded order. Empty for a root commit.
    pub parent_hashes: Vec<String>,
    /// Author name.
    pub author_name: String,
    /// Author email, without angle brackets.
    pub author_email: String,
    /// Author date in the author's recorded timezone.
    pub author_date: DateTime<FixedOffset>,
    /// Committer name.
    pub committer_name: String,
    /// Committer email, without angle brackets.
    pub committer_email: String,
    /// Committer date in the committer's recorded timezone.
    pub committer_date: DateTime<FixedOffset>,
    /// Raw message. Empty when the commit has none.
    pub message: String,
    /// Armored signature from a `gpgsig` header, if signed.
    pub signature: Option<String>,
}

/// Parse a `cat-file commit <hash>` payload.
///
/// # Errors
/// Returns a [`ParseError`] when the payload does not follow the commit grammar.
pub fn parse_commit(input: &str) -> Result<CommitData, ParseError> {
    let mut scanner = Scanner::new(input);
    let mut data = parse_header(&mut scanner)?;
    data.message = scanner.consume_all().to_string();
    Ok(data)
}

/// Parse the header block of a commit, up to and including the blank line
/// that separates it from the message.
pub(crate) fn parse_header(s: &mut Scanner<'_>) -> Result<CommitData, ParseError> {
    s.consume("tree ")?;
    let tree_hash = s.consume_hash()?.to_string();
    s.consume_newline()?;

    let mut parent_hashes = Vec::new();
    while s.expect("parent ") {
        parent_hashes.push(s.consume_hash()?.to_string());
        s.consume_newline()?;
    }

    s.consume("author ")?;
    let (author_name, author_email, author_date) = consume_signature(s)?;
    s.consume_newline()?;

    s.consume("committer ")?;
    let (committer_name, committer_email, committer_date) = consume_signature(s)?;
    if !s.is_finished() {
        s.consume_newline()?;
    }

    let signature = consume_extension_headers(s);

    Ok(CommitData {
        tree_hash,
        parent_hashes,
        author_name,
        author_email,
        author_date,
        committer_name,
        committer_email,
        committer_date,
        message: String::new(),
        signature,
    })
}

/// Skip `gpgsig`, `mergetag`, `encoding` and any unknown header (with its
/// space-indented continuation lines) until the blank separator line.
fn consume_extension_headers(s: &mut Scanner<'_>) -> Option<String> {
    let mut signature = None;

    while !s.is_finished() && !s.peek("commit ") {
        if s.expect("\n") {
            break;
        }

        let line = s.consume_line();
        let (key, first) = line.split_once(' ').unwrap_or((line, ""));
        let mut value = first.to_string();
        while s.peek(" ") {
            value.push('\n');
            value.push_str(&s.consume_line()[1..]);
        }

        if key == "gpgsig" || key == "gpgsig-sha256" {
            signature = Some(value);
        } else {
            tracing::trace!(header = key, "skipping commit header");
        }
    }

    signature
}

/// `Name <email> epoch +hhmm`
fn consume_signature(
    s: &mut Scanner<'_>,
) -> Result<(String, String, DateTime<FixedOffset>), ParseError> {
    let start = s.clone();
    let caps = s.consume_regex(&SIGNATURE)?;

    let invalid_date = || start.error("valid date".to_string());
    let epoch: i64 = caps[3].parse().map_err(|_| invalid_date())?;
    let hours: i32 = caps[5].parse().map_err(|_| invalid_date())?;
    let minutes: i32 = caps[6].parse().map_err(|_| invalid_date())?;
    let sign = if &caps[4] == "-" { -1 } else { 1 };

    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid_date)?;
    let date = DateTime::from_timestamp(epoch, 0)
        .ok_or_else(invalid_date)?
        .with_timezone(&offset);

    Ok((caps[1].to_string(), caps[2].to_string(), date))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
    const PARENT: &str = "1040d331549f2a6a4ba9f06bf6ba3b8e2b2c2d43";

    fn header() -> String {
        format!(
            "tree {TREE}\n\
             parent {PARENT}\n\
             author Alice Example <alice@example.com> 1700000000 +0200\n\
             committer Bob <bob@example.com> 1700003600 -0530\n"
        )
    }

    #[test]
    fn test_parse_plain_commit() {
        let input = format!("{}\nAdd README\n\nLonger body.\n", header());
        let commit = parse_commit(&input).unwrap();

        assert_eq!(commit.tree_hash, TREE);
        assert_eq!(commit.parent_hashes, vec![PARENT.to_string()]);
        assert_eq!(commit.author_name, "Alice Example");
        assert_eq!(commit.author_email, "alice@example.com");
        assert_eq!(commit.author_date.timestamp(), 1_700_000_000);
        assert_eq!(commit.author_date.offset().local_minus_utc(), 7200);
        assert_eq!(commit.committer_name, "Bob");
        assert_eq!(commit.committer_date.offset().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(commit.message, "Add README\n\nLonger body.\n");
        assert!(commit.signature.is_none());
    }

    #[test]
    fn test_root_commit_has_no_parents() {
        let input = format!(
            "tree {TREE}\n\
             author A <a@x> 1 +0000\n\
             committer A <a@x> 1 +0000\n\
             \n\
             init\n"
        );
        let commit = parse_commit(&input).unwrap();
        assert!(commit.parent_hashes.is_empty());
        assert_eq!(commit.message, "init\n");
    }

    #[test]
    fn test_merge_commit_keeps_parent_order() {
        let second = "a".repeat(40);
        let input = format!(
            "tree {TREE}\nparent {PARENT}\nparent {second}\n\
             author A <a@x> 1 +0000\ncommitter A <a@x> 1 +0000\n\nMerge\n"
        );
        let commit = parse_commit(&input).unwrap();
        assert_eq!(commit.parent_hashes, vec![PARENT.to_string(), second]);
    }

    #[test]
    fn test_empty_message() {
        let input = header();
        let commit = parse_commit(&input).unwrap();
        assert_eq!(commit.message, "");

        let with_blank = format!("{}\n", header());
        assert_eq!(parse_commit(&with_blank).unwrap().message, "");
    }

    #[test]
    fn test_gpg_signature_is_not_the_message() {
        let signed = format!(
            "{}gpgsig -----BEGIN PGP SIGNATURE-----\n \n iQEzBAABCAAdFiEE\n -----END PGP SIGNATURE-----\n\nSigned change\n",
            header()
        );
        let unsigned = format!("{}\nSigned change\n", header());

        let signed = parse_commit(&signed).unwrap();
        let unsigned = parse_commit(&unsigned).unwrap();

        assert_eq!(signed.message, unsigned.message);
        assert_eq!(signed.parent_hashes, unsigned.parent_hashes);
        let signature = signed.signature.unwrap();
        assert!(signature.starts_with("-----BEGIN PGP SIGNATURE-----\n"));
        assert!(signature.ends_with("-----END PGP SIGNATURE-----"));
    }

    #[test]
    fn test_unknown_headers_are_skipped() {
        let input = format!(
            "{}encoding ISO-8859-1\ngitbutler-headers-version 2\nchange-id 1234\n\nBody\n",
            header()
        );
        let commit = parse_commit(&input).unwrap();
        assert_eq!(commit.message, "Body\n");
    }

    #[test]
    fn test_mergetag_block_is_skipped() {
        let input = format!(
            "{}mergetag object {PARENT}\n type commit\n tag v1.0\n\nMerge tag 'v1.0'\n",
            header()
        );
        let commit = parse_commit(&input).unwrap();
        assert_eq!(commit.message, "Merge tag 'v1.0'\n");
    }

    #[test]
    fn test_email_with_angle_in_name() {
        let input = format!(
            "tree {TREE}\nauthor Jo <Jo> Doe <jo@x.org> 5 +0100\ncommitter C <c@x> 5 +0100\n\nm\n"
        );
        let commit = parse_commit(&input).unwrap();
        assert_eq!(commit.author_name, "Jo <Jo> Doe");
        assert_eq!(commit.author_email, "jo@x.org");
    }

    #[test]
    fn test_missing_tree_is_an_error() {
        let err = parse_commit("author A <a@x> 1 +0000\n").unwrap_err();
        assert_eq!(err.position, 0);
        assert_eq!(err.expected, "\"tree \"");
    }

    #[test]
    fn test_malformed_date_is_an_error() {
        let input = format!("tree {TREE}\nauthor A <a@x> yesterday\n");
        let err = parse_commit(&input).unwrap_err();
        assert_eq!(err.position, 53);
    }
}
