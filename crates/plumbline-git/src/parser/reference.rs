//! `show-ref` listings.

use super::{ParseError, Scanner};

/// One `<hash> <fullname>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLine {
    /// Object the reference points to.
    pub hash: String,
    /// Full reference name, e.g. `refs/heads/main`.
    pub fullname: String,
}

/// Parse `show-ref` output into lines, in emission order.
///
/// Classification by namespace is left to the caller, so unknown namespaces
/// never fail here.
///
/// # Errors
/// Returns a [`ParseError`] when a line is not `<hash> <fullname>`.
pub fn parse_references(input: &str) -> Result<Vec<ReferenceLine>, ParseError> {
    let mut s = Scanner::new(input);
    let mut references = Vec::new();

    while !s.is_finished() {
        let hash = s.consume_hash()?.to_string();
        s.consume(" ")?;
        let fullname = s.consume_line();
        if fullname.is_empty() {
            return Err(s.error("reference name".to_string()));
        }
        references.push(ReferenceLine {
            hash,
            fullname: fullname.to_string(),
        });
    }

    Ok(references)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let input = "\
1111111111111111111111111111111111111111 refs/heads/main
2222222222222222222222222222222222222222 refs/pull/1/head
3333333333333333333333333333333333333333 refs/tags/v1.0
";
        let refs = parse_references(input).unwrap();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].fullname, "refs/heads/main");
        assert_eq!(refs[1].fullname, "refs/pull/1/head");
        assert_eq!(refs[2].hash, "3".repeat(40));
    }

    #[test]
    fn test_empty_listing() {
        assert!(parse_references("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let input = format!("{} \n", "1".repeat(40));
        assert!(parse_references(&input).is_err());
        assert!(parse_references("main 1234\n").is_err());
    }
}
