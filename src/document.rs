//! Layout and link metadata, and classification of files on disk.
//!
//! A file's kind is resolved structurally from the `signed._type` field of
//! its JSON tree, never from its file name or from text elsewhere in the
//! document. Candidate kinds are checked in order of specificity.

use crate::error::{Result, SignError};
use crate::signature::{Metablock, SignatureEntry};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Fields a document carries that this crate does not model. They are kept
/// so that signatures over them stay verifiable.
pub type ExtraFields = BTreeMap<String, Value>;

/// Map of artifact path to `{hash algorithm: hex digest}`.
pub type ArtifactHashes = BTreeMap<String, BTreeMap<String, String>>;

/// The two kinds of signable metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Layout,
    Link,
}

impl DocumentKind {
    /// Candidates in the order classification tries them.
    pub const CANDIDATES: [DocumentKind; 2] = [DocumentKind::Layout, DocumentKind::Link];

    /// The `_type` value written for this kind.
    pub fn type_tag(self) -> &'static str {
        match self {
            DocumentKind::Layout => "layout",
            DocumentKind::Link => "link",
        }
    }

    /// File extension used when naming output files.
    pub fn extension(self) -> &'static str {
        self.type_tag()
    }

    /// Whether a `signed._type` value denotes this kind. Links written by
    /// older tooling use `"Link"`.
    pub fn matches_type_tag(self, tag: &str) -> bool {
        match self {
            DocumentKind::Layout => tag == "layout",
            DocumentKind::Link => tag == "link" || tag == "Link",
        }
    }

    /// Resolve the kind of a parsed metadata tree.
    pub fn of_value(value: &Value) -> Option<DocumentKind> {
        let tag = value.get("signed")?.get("_type")?.as_str()?;
        Self::CANDIDATES
            .into_iter()
            .find(|kind| kind.matches_type_tag(tag))
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

fn layout_tag() -> String {
    DocumentKind::Layout.type_tag().to_string()
}

fn link_tag() -> String {
    DocumentKind::Link.type_tag().to_string()
}

fn step_tag() -> String {
    "step".to_string()
}

fn inspection_tag() -> String {
    "inspection".to_string()
}

/// A supply-chain layout: the steps and inspections a product must pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(rename = "_type", default = "layout_tag")]
    pub type_tag: String,

    pub steps: Vec<Step>,

    pub inspect: Vec<Inspection>,

    /// Functionary public keys by key id.
    pub keys: BTreeMap<String, Value>,

    pub expires: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Layout {
    /// Default file name when no other name is requested.
    pub const DEFAULT_FILENAME: &'static str = "root.layout";

    /// An empty layout expiring at `expires`.
    pub fn new(expires: DateTime<Utc>) -> Self {
        Self {
            type_tag: layout_tag(),
            steps: Vec::new(),
            inspect: Vec::new(),
            keys: BTreeMap::new(),
            expires,
            readme: None,
            extra: ExtraFields::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "_type", default = "step_tag")]
    pub type_tag: String,

    pub name: String,

    pub expected_materials: Vec<Vec<String>>,

    pub expected_products: Vec<Vec<String>>,

    pub pubkeys: Vec<String>,

    pub expected_command: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            type_tag: step_tag(),
            name: name.into(),
            expected_materials: Vec::new(),
            expected_products: Vec::new(),
            pubkeys: Vec::new(),
            expected_command: Vec::new(),
            threshold: None,
            extra: ExtraFields::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    #[serde(rename = "_type", default = "inspection_tag")]
    pub type_tag: String,

    pub name: String,

    pub expected_materials: Vec<Vec<String>>,

    pub expected_products: Vec<Vec<String>>,

    pub run: Vec<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Inspection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            type_tag: inspection_tag(),
            name: name.into(),
            expected_materials: Vec::new(),
            expected_products: Vec::new(),
            run: Vec::new(),
            extra: ExtraFields::new(),
        }
    }
}

/// Evidence recorded for one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "_type", default = "link_tag")]
    pub type_tag: String,

    pub name: String,

    pub materials: ArtifactHashes,

    pub products: ArtifactHashes,

    pub byproducts: BTreeMap<String, Value>,

    pub command: Vec<String>,

    pub environment: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Link {
    /// An empty link for the step `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            type_tag: link_tag(),
            name: name.into(),
            materials: ArtifactHashes::new(),
            products: ArtifactHashes::new(),
            byproducts: BTreeMap::new(),
            command: Vec::new(),
            environment: BTreeMap::new(),
            extra: ExtraFields::new(),
        }
    }

    /// Default file name: `{step name}.link`.
    pub fn default_filename(&self) -> String {
        format!("{}.{}", self.name, DocumentKind::Link.extension())
    }
}

/// A loaded signable document of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Layout(Metablock<Layout>),
    Link(Metablock<Link>),
}

impl From<Metablock<Layout>> for Document {
    fn from(block: Metablock<Layout>) -> Self {
        Document::Layout(block)
    }
}

impl From<Metablock<Link>> for Document {
    fn from(block: Metablock<Link>) -> Self {
        Document::Link(block)
    }
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Layout(_) => DocumentKind::Layout,
            Document::Link(_) => DocumentKind::Link,
        }
    }

    pub fn signatures(&self) -> &[SignatureEntry] {
        match self {
            Document::Layout(block) => &block.signatures,
            Document::Link(block) => &block.signatures,
        }
    }

    pub(crate) fn signatures_mut(&mut self) -> &mut Vec<SignatureEntry> {
        match self {
            Document::Layout(block) => &mut block.signatures,
            Document::Link(block) => &mut block.signatures,
        }
    }

    /// The canonical bytes covered by every signature.
    pub fn signed_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Document::Layout(block) => block.signed_bytes(),
            Document::Link(block) => block.signed_bytes(),
        }
    }

    /// Where the document is written when no other name is requested.
    pub fn default_filename(&self) -> String {
        match self {
            Document::Layout(_) => Layout::DEFAULT_FILENAME.to_string(),
            Document::Link(block) => block.signed().default_filename(),
        }
    }

    /// Write the document as pretty-printed JSON.
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        match self {
            Document::Layout(block) => block.dump(path),
            Document::Link(block) => block.dump(path),
        }
    }

    /// Load a file whose kind is already known.
    pub fn read_from_file<P: AsRef<Path>>(kind: DocumentKind, path: P) -> Result<Self> {
        let value = read_tree(path.as_ref())?;
        Self::from_tree(kind, value)
    }

    fn from_tree(kind: DocumentKind, value: Value) -> Result<Self> {
        Ok(match kind {
            DocumentKind::Layout => Document::Layout(typed(kind, value)?),
            DocumentKind::Link => Document::Link(typed(kind, value)?),
        })
    }
}

fn typed<T: DeserializeOwned>(kind: DocumentKind, value: Value) -> Result<Metablock<T>> {
    Metablock::from_value(value).map_err(|e| match e {
        SignError::Json(e) => {
            SignError::MalformedDocument(format!("invalid {kind} metadata: {e}"))
        }
        other => other,
    })
}

fn read_tree(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Determine the kind of the metadata file at `path`. The file is only read.
pub fn classify<P: AsRef<Path>>(path: P) -> Result<DocumentKind> {
    let path = path.as_ref();
    let value = read_tree(path)?;
    DocumentKind::of_value(&value).ok_or_else(|| SignError::UnknownDocumentKind {
        path: path.to_path_buf(),
    })
}

/// Determine the kind of the metadata file at `path` and load it.
pub fn classify_and_load<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let value = read_tree(path)?;
    let kind = DocumentKind::of_value(&value).ok_or_else(|| SignError::UnknownDocumentKind {
        path: path.to_path_buf(),
    })?;
    debug!(path = %path.display(), %kind, "classified document");
    Document::from_tree(kind, value)
}
