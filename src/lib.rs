//! # in-toto-sign
//!
//! Add, replace and verify signatures on in-toto metadata: layouts, which
//! describe a supply chain, and links, which record one executed step.
//!
//! ## Features
//!
//! - **Structural classification** of metadata files by their `_type`
//! - **Append or replace** signing with any number of keys, applied in order
//! - **All-or-nothing verification** against a set of trusted public keys
//! - **Deterministic output names**, optionally infixed with the signing key id
//!
//! ## Sign and Verify a Link
//!
//! ```rust
//! use in_toto_sign::{
//!     sign_with_keys, verify_signatures, Document, KeyPair, Link, Metablock, SignMode,
//! };
//! use std::collections::BTreeMap;
//!
//! let alice = KeyPair::generate();
//! let bob = KeyPair::generate();
//!
//! let document = Document::from(Metablock::new(Link::new("package")));
//! let signed = sign_with_keys(document, &[&alice, &bob], SignMode::Append).unwrap();
//! assert_eq!(signed.document.signatures().len(), 2);
//! assert_eq!(signed.naming_key_id(), Some(bob.key_id()));
//!
//! let mut trusted = BTreeMap::new();
//! trusted.insert(alice.key_id().to_string(), alice.public_key());
//! trusted.insert(bob.key_id().to_string(), bob.public_key());
//! verify_signatures(&signed.document, &trusted).unwrap();
//! ```
//!
//! ## Replace Signatures
//!
//! ```rust
//! use in_toto_sign::{sign_with_keys, Document, KeyPair, Link, Metablock, SignMode};
//!
//! let alice = KeyPair::generate();
//! let carol = KeyPair::generate();
//!
//! let document = Document::from(Metablock::new(Link::new("package")));
//! let signed = sign_with_keys(document, &[&alice], SignMode::Append).unwrap();
//! let resigned = sign_with_keys(signed.document, &[&carol], SignMode::Replace).unwrap();
//!
//! let signatures = resigned.document.signatures();
//! assert_eq!(signatures.len(), 1);
//! assert_eq!(signatures[0].keyid, carol.key_id());
//! ```

pub mod canonical;
pub mod document;
pub mod error;
pub mod keys;
pub mod naming;
pub mod signature;
pub mod signer;
pub mod verifier;
pub mod workflow;

// Re-export main types for convenience
pub use document::{
    classify, classify_and_load, Document, DocumentKind, Inspection, Layout, Link, Step,
};
pub use error::{Result, SignError, VerificationError};
pub use keys::{load_private_key, load_public_keys, KeyPair, PublicKey};
pub use naming::{output_filename, Naming};
pub use signature::{Metablock, SignatureEntry};
pub use signer::{
    append_sign, replace_sign, sign_document, sign_with_keys, SignMode, SignedDocument, Signer,
};
pub use verifier::{verify_file, verify_signatures, KeyMap, Verifier};
