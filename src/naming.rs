//! Output file naming for signed documents.

use crate::document::{Document, DocumentKind};
use crate::error::{Result, SignError};
use std::path::Path;

/// Number of key id characters infixed into output file names.
pub const KEYID_INFIX_LEN: usize = 8;

/// How the output file of a sign operation is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming<'a> {
    /// The document's own default name (`root.layout`, `{step}.link`).
    Default,
    /// `{base}.{keyid:8}.{kind}`, where `base` is `destination` if given
    /// and the source file name otherwise.
    Infix {
        keyid: &'a str,
        destination: Option<&'a str>,
    },
}

/// The first [`KEYID_INFIX_LEN`] characters of `keyid`, or all of it if
/// shorter.
pub fn short_keyid(keyid: &str) -> &str {
    match keyid.char_indices().nth(KEYID_INFIX_LEN) {
        Some((end, _)) => &keyid[..end],
        None => keyid,
    }
}

/// `{base}.{keyid:8}.{layout|link}`.
pub fn infixed_filename(base: &str, keyid: &str, kind: DocumentKind) -> String {
    format!("{base}.{}.{}", short_keyid(keyid), kind.extension())
}

/// The file name of `source` without its directory.
pub fn source_file_name(source: &Path) -> Result<String> {
    source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            SignError::MalformedDocument(format!("{} has no file name", source.display()))
        })
}

/// Name the output file for `document`, which was read from `source`.
pub fn output_filename(document: &Document, source: &Path, naming: Naming<'_>) -> Result<String> {
    match naming {
        Naming::Default => Ok(document.default_filename()),
        Naming::Infix {
            keyid,
            destination: Some(base),
        } => Ok(infixed_filename(base, keyid, document.kind())),
        Naming::Infix {
            keyid,
            destination: None,
        } => Ok(infixed_filename(
            &source_file_name(source)?,
            keyid,
            document.kind(),
        )),
    }
}
