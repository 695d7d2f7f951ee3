//! Signature entries and the signed-metadata container.

use crate::canonical::{canonical_bytes, encode_value};
use crate::error::{Result, SignError};
use crate::keys::KeyPair;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A single signature over a document's `signed` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Key id of the signing key (hex).
    pub keyid: String,

    /// The Ed25519 signature bytes (hex encoded).
    pub sig: String,
}

impl SignatureEntry {
    /// Sign `payload` with `keypair`.
    pub fn create(keypair: &KeyPair, payload: &[u8]) -> Self {
        Self {
            keyid: keypair.key_id().to_string(),
            sig: hex::encode(keypair.sign(payload)),
        }
    }

    /// Get the signature bytes.
    pub fn signature_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.sig).map_err(|e| {
            SignError::MalformedDocument(format!("signature by '{}' is not hex: {e}", self.keyid))
        })
    }
}

/// On-disk shape before the payload is typed.
#[derive(Deserialize)]
struct RawBlock {
    signed: Value,
    #[serde(default)]
    signatures: Vec<SignatureEntry>,
}

/// A signed payload together with its ordered signature list.
///
/// This is the on-disk shape of every in-toto metadata file:
/// `{"signed": {...}, "signatures": [...]}`.
///
/// A block parsed from JSON keeps the `signed` object exactly as read.
/// Signing and dumping use that object, so formatting choices of whoever
/// wrote the file (timestamp style, explicit nulls) never alter the bytes
/// earlier signatures cover. Editing the payload through
/// [`Metablock::signed_mut`] drops the kept object.
#[derive(Debug, Clone, PartialEq)]
pub struct Metablock<T> {
    signed: T,
    source: Option<Value>,
    pub signatures: Vec<SignatureEntry>,
}

impl<T> Metablock<T> {
    /// Wrap an unsigned payload.
    pub fn new(signed: T) -> Self {
        Self {
            signed,
            source: None,
            signatures: Vec::new(),
        }
    }

    /// The typed payload.
    pub fn signed(&self) -> &T {
        &self.signed
    }

    /// Mutable access to the payload. The payload is re-encoded from the
    /// typed value from then on.
    pub fn signed_mut(&mut self) -> &mut T {
        self.source = None;
        &mut self.signed
    }
}

impl<T: Serialize> Metablock<T> {
    fn signed_value(&self) -> Result<Value> {
        match &self.source {
            Some(source) => Ok(source.clone()),
            None => Ok(serde_json::to_value(&self.signed)?),
        }
    }

    /// The canonical bytes covered by every signature.
    pub fn signed_bytes(&self) -> Result<Vec<u8>> {
        match &self.source {
            Some(source) => Ok(encode_value(source)),
            None => canonical_bytes(&self.signed),
        }
    }

    /// Append a signature by `keypair`. Existing signatures are kept.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<&SignatureEntry> {
        let payload = self.signed_bytes()?;
        self.signatures.push(SignatureEntry::create(keypair, &payload));
        Ok(&self.signatures[self.signatures.len() - 1])
    }

    /// Serialize the metadata to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        let mut block = serde_json::Map::new();
        block.insert("signed".to_string(), self.signed_value()?);
        block.insert(
            "signatures".to_string(),
            serde_json::to_value(&self.signatures)?,
        );
        Ok(serde_json::to_string_pretty(&block)?)
    }

    /// Save the metadata to a JSON file.
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl<T: DeserializeOwned> Metablock<T> {
    /// Type a parsed metadata tree, keeping its `signed` object as read.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawBlock = serde_json::from_value(value)?;
        let signed = T::deserialize(&raw.signed)?;
        Ok(Self {
            signed,
            source: Some(raw.signed),
            signatures: raw.signatures,
        })
    }
}
