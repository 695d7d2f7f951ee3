//! Ed25519 key material and key-file handling.
//!
//! Keys are stored as JSON objects in the securesystemslib layout used by
//! in-toto:
//!
//! ```json
//! {
//!   "keytype": "ed25519",
//!   "scheme": "ed25519",
//!   "keyid": "<hex sha256>",
//!   "keyid_hash_algorithms": ["sha256", "sha512"],
//!   "keyval": { "public": "<hex>", "private": "<hex>" }
//! }
//! ```
//!
//! Public key files omit `keyval.private`. The key id is the SHA-256 of the
//! canonical encoding of the public portion of the key.

use crate::canonical::{encode_value, sha256_hex};
use crate::error::{Result, SignError};
use ed25519_dalek::{Signature, Signer as DalekSigner, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const KEY_TYPE: &str = "ed25519";
pub const KEY_SCHEME: &str = "ed25519";

const KEY_SIZE: usize = 32;
const SIGNATURE_SIZE: usize = 64;

fn default_hash_algorithms() -> Vec<String> {
    vec!["sha256".to_string(), "sha512".to_string()]
}

/// On-disk form of a key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyFile {
    keytype: String,
    scheme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keyid: Option<String>,
    #[serde(default = "default_hash_algorithms")]
    keyid_hash_algorithms: Vec<String>,
    keyval: KeyVal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyVal {
    public: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    private: String,
}

impl KeyFile {
    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SignError::key_load(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| SignError::MalformedKey(format!("{}: {e}", path.display())))
    }

    /// Check the schema shape and return the decoded public half.
    fn check_public(&self) -> Result<VerifyingKey> {
        if self.keytype != KEY_TYPE {
            return Err(SignError::MalformedKey(format!(
                "unsupported keytype '{}', expected '{KEY_TYPE}'",
                self.keytype
            )));
        }
        if self.scheme != KEY_SCHEME {
            return Err(SignError::MalformedKey(format!(
                "unsupported scheme '{}', expected '{KEY_SCHEME}'",
                self.scheme
            )));
        }
        if self.keyid_hash_algorithms.is_empty() {
            return Err(SignError::MalformedKey(
                "keyid_hash_algorithms must not be empty".to_string(),
            ));
        }

        let public = decode_key_half("public", &self.keyval.public)?;
        let verifying_key = VerifyingKey::from_bytes(&public)
            .map_err(|e| SignError::MalformedKey(format!("invalid public key: {e}")))?;

        if let Some(declared) = &self.keyid {
            let computed = compute_key_id(&public, &self.keyid_hash_algorithms);
            if !declared.eq_ignore_ascii_case(&computed) {
                return Err(SignError::MalformedKey(format!(
                    "declared keyid '{declared}' does not match computed keyid '{computed}'"
                )));
            }
        }

        Ok(verifying_key)
    }
}

fn decode_key_half(field: &str, value: &str) -> Result<[u8; KEY_SIZE]> {
    let bytes = hex::decode(value)
        .map_err(|e| SignError::MalformedKey(format!("keyval.{field} is not hex: {e}")))?;
    bytes.as_slice().try_into().map_err(|_| {
        SignError::MalformedKey(format!(
            "keyval.{field} has invalid length: expected {KEY_SIZE}, got {}",
            bytes.len()
        ))
    })
}

fn compute_key_id(public: &[u8; KEY_SIZE], hash_algorithms: &[String]) -> String {
    let public_portion = json!({
        "keytype": KEY_TYPE,
        "scheme": KEY_SCHEME,
        "keyid_hash_algorithms": hash_algorithms,
        "keyval": { "public": hex::encode(public) },
    });
    sha256_hex(&encode_value(&public_portion))
}

/// An Ed25519 private key: the signing capability.
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
    keyid: String,
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let keyid = key_id_for(&signing_key.verifying_key());
        Self { signing_key, keyid }
    }

    /// Get the secret key bytes.
    pub fn secret_bytes(&self) -> [u8; KEY_SIZE] {
        self.signing_key.to_bytes()
    }

    /// The hex key id of this key.
    pub fn key_id(&self) -> &str {
        &self.keyid
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
            keyid: self.keyid.clone(),
        }
    }

    /// Sign a message and return the signature bytes.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Save the private key to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let key = KeyFile {
            keytype: KEY_TYPE.to_string(),
            scheme: KEY_SCHEME.to_string(),
            keyid: Some(self.keyid.clone()),
            keyid_hash_algorithms: default_hash_algorithms(),
            keyval: KeyVal {
                public: hex::encode(self.signing_key.verifying_key().to_bytes()),
                private: hex::encode(self.secret_bytes()),
            },
        };
        fs::write(path, serde_json::to_string_pretty(&key)?)?;
        Ok(())
    }

    /// Load a private key from a file, validating it against the key schema.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let key = KeyFile::read(path)?;
        let verifying_key = key.check_public()?;

        if key.keyval.private.is_empty() {
            return Err(SignError::MalformedKey(format!(
                "{} has no private key material",
                path.display()
            )));
        }
        let secret = decode_key_half("private", &key.keyval.private)?;
        let signing_key = SigningKey::from_bytes(&secret);
        if signing_key.verifying_key() != verifying_key {
            return Err(SignError::MalformedKey(
                "private key does not match public key".to_string(),
            ));
        }

        let keyid = compute_key_id(&verifying_key.to_bytes(), &key.keyid_hash_algorithms);
        debug!(path = %path.display(), keyid = %keyid, "loaded private key");
        Ok(Self { signing_key, keyid })
    }
}

fn key_id_for(verifying_key: &VerifyingKey) -> String {
    compute_key_id(&verifying_key.to_bytes(), &default_hash_algorithms())
}

/// An Ed25519 public key: the verification capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
    keyid: String,
}

impl PublicKey {
    /// Get the raw bytes of the public key.
    pub fn as_bytes(&self) -> [u8; KEY_SIZE] {
        self.verifying_key.to_bytes()
    }

    /// The hex key id of this key.
    pub fn key_id(&self) -> &str {
        &self.keyid
    }

    /// Check a signature over a message. Malformed signatures do not verify.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match Signature::from_slice(signature) {
            Ok(sig) => self.verifying_key.verify_strict(message, &sig).is_ok(),
            Err(_) => false,
        }
    }

    /// The public key object as embedded in a layout's `keys` map.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "keytype": KEY_TYPE,
            "scheme": KEY_SCHEME,
            "keyid": self.keyid,
            "keyid_hash_algorithms": default_hash_algorithms(),
            "keyval": { "public": hex::encode(self.as_bytes()) },
        })
    }

    /// Save the public key to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(&self.to_json())?)?;
        Ok(())
    }

    /// Load a public key from a file. Private key files are reduced to
    /// their public half.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let key = KeyFile::read(path)?;
        let verifying_key = key.check_public()?;
        let keyid = compute_key_id(&verifying_key.to_bytes(), &key.keyid_hash_algorithms);
        debug!(path = %path.display(), keyid = %keyid, "loaded public key");
        Ok(Self {
            verifying_key,
            keyid,
        })
    }
}

/// Load the private key used for signing.
pub fn load_private_key<P: AsRef<Path>>(path: P) -> Result<KeyPair> {
    KeyPair::load_from_file(path)
}

/// Load public keys from files into a map keyed by key id.
pub fn load_public_keys<P: AsRef<Path>>(paths: &[P]) -> Result<BTreeMap<String, PublicKey>> {
    let mut keys = BTreeMap::new();
    for path in paths {
        let key = PublicKey::load_from_file(path)?;
        keys.insert(key.key_id().to_string(), key);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_keypair_generation() {
        let keypair = KeyPair::generate();
        let public_key = keypair.public_key();

        let message = b"Test message";
        let signature = keypair.sign(message);

        assert!(public_key.verify(message, &signature));
        assert_eq!(keypair.key_id(), public_key.key_id());
        assert_eq!(keypair.key_id().len(), 64);
    }

    #[test]
    fn test_invalid_signature_fails() {
        let keypair = KeyPair::generate();
        let other_keypair = KeyPair::generate();

        let message = b"Test message";
        let signature = other_keypair.sign(message);

        assert!(!keypair.public_key().verify(message, &signature));
        assert!(!keypair.public_key().verify(message, &signature[..10]));
    }

    #[test]
    fn test_key_files_roundtrip() {
        let dir = tempdir().unwrap();
        let keypair = KeyPair::generate();
        keypair.save_to_file(dir.path().join("alice")).unwrap();
        keypair
            .public_key()
            .save_to_file(dir.path().join("alice.pub"))
            .unwrap();

        let private = load_private_key(dir.path().join("alice")).unwrap();
        assert_eq!(private.secret_bytes(), keypair.secret_bytes());
        assert_eq!(private.key_id(), keypair.key_id());

        let public = PublicKey::load_from_file(dir.path().join("alice.pub")).unwrap();
        assert_eq!(public, keypair.public_key());

        // A private key file serves as a public key too.
        let from_private = PublicKey::load_from_file(dir.path().join("alice")).unwrap();
        assert_eq!(from_private, keypair.public_key());
    }

    #[test]
    fn test_public_key_file_cannot_sign() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alice.pub");
        KeyPair::generate().public_key().save_to_file(&path).unwrap();

        let err = load_private_key(&path).unwrap_err();
        assert!(matches!(err, SignError::MalformedKey(_)));
    }

    #[test]
    fn test_missing_key_file() {
        let dir = tempdir().unwrap();
        let err = load_private_key(dir.path().join("non-existent-key")).unwrap_err();
        assert!(matches!(err, SignError::KeyLoad { .. }));

        let err = load_public_keys(&[dir.path().join("non-existent-key")]).unwrap_err();
        assert!(matches!(err, SignError::KeyLoad { .. }));
    }

    #[test]
    fn test_schema_violations_are_malformed() {
        let dir = tempdir().unwrap();
        let keypair = KeyPair::generate();
        let public = hex::encode(keypair.public_key().as_bytes());
        let private = hex::encode(keypair.secret_bytes());

        let cases = [
            "not json at all".to_string(),
            json!({"keytype": "rsa", "scheme": "rsassa-pss-sha256",
                   "keyval": {"public": public, "private": private}})
            .to_string(),
            json!({"keytype": "ed25519", "scheme": "ed25519",
                   "keyval": {"public": "zz", "private": private}})
            .to_string(),
            json!({"keytype": "ed25519", "scheme": "ed25519",
                   "keyval": {"public": public, "private": "abcd"}})
            .to_string(),
            json!({"keytype": "ed25519", "scheme": "ed25519", "keyid": "deadbeef",
                   "keyval": {"public": public, "private": private}})
            .to_string(),
            json!({"keytype": "ed25519", "scheme": "ed25519",
                   "keyval": {"public": hex::encode(KeyPair::generate().public_key().as_bytes()),
                              "private": private}})
            .to_string(),
        ];

        for (i, content) in cases.iter().enumerate() {
            let path = dir.path().join(format!("bad-{i}"));
            fs::write(&path, content).unwrap();
            let err = load_private_key(&path).unwrap_err();
            assert!(
                matches!(err, SignError::MalformedKey(_)),
                "case {i} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_load_public_keys_maps_by_keyid() {
        let dir = tempdir().unwrap();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let alice_path = dir.path().join("alice.pub");
        let bob_path = dir.path().join("bob.pub");
        alice.public_key().save_to_file(&alice_path).unwrap();
        bob.public_key().save_to_file(&bob_path).unwrap();

        let keys = load_public_keys(&[alice_path, bob_path]).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[alice.key_id()], alice.public_key());
        assert_eq!(keys[bob.key_id()], bob.public_key());
    }
}
