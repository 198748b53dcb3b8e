use std::cell::OnceCell;
use std::rc::Weak;

use super::attach;
use crate::error::Result;
use crate::repository::Session;

/// How far into the content binary detection looks, same window as git.
const SNIFF_LEN: usize = 8000;

/// Leading bytes of common formats, checked in order.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"BZh", "application/x-bzip2"),
    (b"\xfd7zXZ\x00", "application/x-xz"),
    (b"\x7fELF", "application/x-executable"),
    (b"<?xml", "text/xml"),
    (b"<svg", "image/svg+xml"),
];

/// File content, fetched with `cat-file -p` on first use.
#[derive(Debug)]
pub struct Blob {
    hash: String,
    session: Weak<Session>,
    content: OnceCell<Vec<u8>>,
}

impl Blob {
    pub(crate) const fn new(hash: String, session: Weak<Session>) -> Self {
        Self {
            hash,
            session,
            content: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.content.get().is_some()
    }

    /// Raw bytes.
    ///
    /// # Errors
    /// Returns error if git fails or the repository was dropped.
    pub fn content(&self) -> Result<&[u8]> {
        if let Some(content) = self.content.get() {
            return Ok(content);
        }

        let repository = attach(&self.session)?;
        let content = repository.run_raw("cat-file", &["-p", &self.hash])?;
        Ok(self.content.get_or_init(|| content))
    }

    /// Content decoded as UTF-8, invalid sequences replaced.
    ///
    /// # Errors
    /// See [`Blob::content`].
    pub fn text(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(self.content()?).into_owned())
    }

    /// Size in bytes.
    ///
    /// # Errors
    /// See [`Blob::content`].
    pub fn size(&self) -> Result<usize> {
        Ok(self.content()?.len())
    }

    /// Binary when a NUL byte shows up in the first 8000 bytes.
    ///
    /// # Errors
    /// See [`Blob::content`].
    pub fn is_binary(&self) -> Result<bool> {
        Ok(looks_binary(self.content()?))
    }

    /// # Errors
    /// See [`Blob::content`].
    pub fn is_text(&self) -> Result<bool> {
        Ok(!self.is_binary()?)
    }

    /// Media type guessed from magic bytes, falling back to
    /// `text/plain` or `application/octet-stream`.
    ///
    /// # Errors
    /// See [`Blob::content`].
    pub fn mimetype(&self) -> Result<&'static str> {
        Ok(sniff(self.content()?))
    }
}

fn looks_binary(content: &[u8]) -> bool {
    content.iter().take(SNIFF_LEN).any(|&b| b == 0)
}

fn sniff(content: &[u8]) -> &'static str {
    if let Some(&(_, mime)) = SIGNATURES
        .iter()
        .find(|(magic, _)| content.starts_with(magic))
    {
        return mime;
    }
    if content.is_empty() {
        "inode/x-empty"
    } else if looks_binary(content) {
        "application/octet-stream"
    } else {
        "text/plain"
    }
}
