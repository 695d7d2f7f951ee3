//! Signature verification.
//!
//! Every signature on a document must verify against a trusted key. There
//! is no threshold or majority mode: the first bad signature fails the
//! document.

use crate::document::{classify_and_load, Document};
use crate::error::{Result, VerificationError};
use crate::keys::{load_public_keys, PublicKey};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Trusted public keys by key id.
pub type KeyMap = BTreeMap<String, PublicKey>;

/// Verifier for document signatures.
pub struct Verifier;

impl Verifier {
    /// Check every signature on `document` against `keys`.
    pub fn verify(document: &Document, keys: &KeyMap) -> Result<()> {
        let signatures = document.signatures();
        if signatures.is_empty() {
            return Err(VerificationError::NoSignature.into());
        }

        let payload = document.signed_bytes()?;
        for (index, entry) in signatures.iter().enumerate() {
            let key = keys
                .get(&entry.keyid)
                .ok_or_else(|| VerificationError::KeyNotFound {
                    keyid: entry.keyid.clone(),
                })?;

            let valid = match entry.signature_bytes() {
                Ok(sig) => key.verify(&payload, &sig),
                Err(_) => false,
            };
            if !valid {
                return Err(VerificationError::InvalidSignature {
                    keyid: entry.keyid.clone(),
                }
                .into());
            }
            debug!(index, keyid = %entry.keyid, "signature verified");
        }

        Ok(())
    }

    /// Load the document at `path` and the public keys in `key_paths`, then
    /// verify.
    pub fn verify_file<P: AsRef<Path>, Q: AsRef<Path>>(path: P, key_paths: &[Q]) -> Result<()> {
        let document = classify_and_load(path)?;
        let keys = load_public_keys(key_paths)?;
        Self::verify(&document, &keys)
    }
}

/// Convenience function to verify a loaded document.
pub fn verify_signatures(document: &Document, keys: &KeyMap) -> Result<()> {
    Verifier::verify(document, keys)
}

/// Convenience function to verify a document file against key files.
pub fn verify_file<P: AsRef<Path>, Q: AsRef<Path>>(path: P, key_paths: &[Q]) -> Result<()> {
    Verifier::verify_file(path, key_paths)
}
