//! Adding signatures to documents.
//!
//! Keys are applied strictly in the order given. The last key applied is
//! the one output naming uses (see [`SignedDocument::naming_key_id`]).

use crate::document::Document;
use crate::error::Result;
use crate::keys::{load_private_key, KeyPair};
use crate::signature::SignatureEntry;
use std::path::Path;
use tracing::debug;

/// Whether signing keeps or discards the signatures already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignMode {
    /// Keep existing signatures and add new ones after them.
    #[default]
    Append,
    /// Drop every existing signature before adding new ones.
    Replace,
}

/// A document after signing, with the key ids applied in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedDocument {
    pub document: Document,
    pub key_ids: Vec<String>,
}

impl SignedDocument {
    /// Key id that output naming is derived from: the last key applied.
    pub fn naming_key_id(&self) -> Option<&str> {
        self.key_ids.last().map(String::as_str)
    }
}

/// Signs documents with a single key.
#[derive(Debug)]
pub struct Signer<'a> {
    keypair: &'a KeyPair,
}

impl<'a> Signer<'a> {
    /// Create a new signer with the given keypair.
    pub fn new(keypair: &'a KeyPair) -> Self {
        Self { keypair }
    }

    /// Add a signature to the document, after any existing ones.
    pub fn cosign(&self, document: &mut Document) -> Result<()> {
        let payload = document.signed_bytes()?;
        let entry = SignatureEntry::create(self.keypair, &payload);
        debug!(keyid = %entry.keyid, kind = %document.kind(), "added signature");
        document.signatures_mut().push(entry);
        Ok(())
    }
}

/// Sign `document` with each key file in turn, keeping existing signatures.
pub fn append_sign<P: AsRef<Path>>(document: Document, key_paths: &[P]) -> Result<SignedDocument> {
    sign_document(document, key_paths, SignMode::Append)
}

/// Sign `document` with each key file in turn after removing all existing
/// signatures.
pub fn replace_sign<P: AsRef<Path>>(
    document: Document,
    key_paths: &[P],
) -> Result<SignedDocument> {
    sign_document(document, key_paths, SignMode::Replace)
}

/// Load every private key, then sign with them in order. Any key that
/// fails to load aborts the whole operation before the document changes.
pub fn sign_document<P: AsRef<Path>>(
    document: Document,
    key_paths: &[P],
    mode: SignMode,
) -> Result<SignedDocument> {
    let keypairs = key_paths
        .iter()
        .map(load_private_key)
        .collect::<Result<Vec<_>>>()?;
    let keys: Vec<&KeyPair> = keypairs.iter().collect();
    sign_with_keys(document, &keys, mode)
}

/// Sign with keys already in memory.
pub fn sign_with_keys(
    mut document: Document,
    keys: &[&KeyPair],
    mode: SignMode,
) -> Result<SignedDocument> {
    if mode == SignMode::Replace {
        document.signatures_mut().clear();
    }

    let mut key_ids = Vec::with_capacity(keys.len());
    for keypair in keys {
        Signer::new(keypair).cosign(&mut document)?;
        key_ids.push(keypair.key_id().to_string());
    }

    Ok(SignedDocument { document, key_ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Link;
    use crate::error::SignError;
    use crate::signature::Metablock;
    use tempfile::tempdir;

    fn signed_link(keys: &[&KeyPair]) -> Document {
        let mut document = Document::from(Metablock::new(Link::new("package")));
        for keypair in keys {
            Signer::new(keypair).cosign(&mut document).unwrap();
        }
        document
    }

    #[test]
    fn test_append_keeps_existing_signatures() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let carol = KeyPair::generate();

        let document = signed_link(&[&alice]);
        let before = document.signatures().to_vec();

        let signed = sign_with_keys(document, &[&bob, &carol], SignMode::Append).unwrap();
        let after = signed.document.signatures();

        assert_eq!(after.len(), before.len() + 2);
        assert_eq!(&after[..before.len()], &before[..]);
        assert_eq!(after[1].keyid, bob.key_id());
        assert_eq!(after[2].keyid, carol.key_id());
    }

    #[test]
    fn test_replace_drops_existing_signatures() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let document = signed_link(&[&alice, &alice]);
        let signed = sign_with_keys(document, &[&bob], SignMode::Replace).unwrap();

        assert_eq!(signed.document.signatures().len(), 1);
        assert_eq!(signed.document.signatures()[0].keyid, bob.key_id());
    }

    #[test]
    fn test_resigning_with_same_key_appends() {
        let alice = KeyPair::generate();
        let document = signed_link(&[&alice]);

        let signed = sign_with_keys(document, &[&alice], SignMode::Append).unwrap();
        let signatures = signed.document.signatures();

        assert_eq!(signatures.len(), 2);
        assert_eq!(signatures[0].keyid, signatures[1].keyid);
    }

    #[test]
    fn test_last_key_names_output() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let signed = sign_with_keys(signed_link(&[]), &[&alice, &bob], SignMode::Append).unwrap();
        assert_eq!(signed.naming_key_id(), Some(bob.key_id()));
    }

    #[test]
    fn test_sign_from_key_files() {
        let dir = tempdir().unwrap();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let alice_path = dir.path().join("alice");
        let bob_path = dir.path().join("bob");
        alice.save_to_file(&alice_path).unwrap();
        bob.save_to_file(&bob_path).unwrap();

        let signed = append_sign(signed_link(&[&bob]), &[&alice_path, &bob_path]).unwrap();
        assert_eq!(signed.key_ids, vec![alice.key_id(), bob.key_id()]);
        assert_eq!(signed.document.signatures().len(), 3);

        let signed = replace_sign(signed.document, &[&alice_path]).unwrap();
        assert_eq!(signed.document.signatures().len(), 1);
        assert_eq!(signed.naming_key_id(), Some(alice.key_id()));
    }

    #[test]
    fn test_bad_key_aborts() {
        let dir = tempdir().unwrap();
        let alice = KeyPair::generate();
        let alice_path = dir.path().join("alice");
        alice.save_to_file(&alice_path).unwrap();

        let err = append_sign(
            signed_link(&[]),
            &[alice_path, dir.path().join("bad-key")],
        )
        .unwrap_err();
        assert!(matches!(err, SignError::KeyLoad { .. }));
    }
}
