//! Error types for in-toto-sign.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for signing, verification and document handling.
#[derive(Error, Debug)]
pub enum SignError {
    /// The document carries no recognisable `_type`.
    #[error("unknown document kind in {}: expected a layout or link", path.display())]
    UnknownDocumentKind { path: PathBuf },

    /// Key content does not match the key schema.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// A key file could not be read.
    #[error("unable to load key {}: {source}", path.display())]
    KeyLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Error reading or writing a document file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error with JSON serialization/deserialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed as JSON but not as metadata.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// One of the document's signatures did not verify.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// Failure inside the cryptographic backend.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Why a document failed signature verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("no signatures found")]
    NoSignature,

    #[error("signature key not found, key id is '{keyid}'")]
    KeyNotFound { keyid: String },

    #[error("invalid signature for key id '{keyid}'")]
    InvalidSignature { keyid: String },
}

impl SignError {
    /// True for the expected verification failures, as opposed to faults.
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, SignError::Verification(_))
    }

    pub(crate) fn key_load(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SignError::KeyLoad {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for in-toto-sign operations.
pub type Result<T> = std::result::Result<T, SignError>;
