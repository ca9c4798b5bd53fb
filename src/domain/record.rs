use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Opaque record identifier. Issued ids are UUID v4 strings; ids coming
/// back from callers are never parsed, an unknown one just matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn generate() -> Self { Self(Uuid::new_v4().to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self { Self(value) }
}

/// Body of a create request. Both families are created from text alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub text: String,
}

impl NewRecord {
    pub fn new(text: impl Into<String>) -> Self { Self { text: text.into() } }
}

/// Names a resource family goes by, on the wire and in messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    /// "todo"
    pub singular: &'static str,
    /// "todos", also the collection path segment
    pub plural: &'static str,
    /// "Todo"
    pub display: &'static str,
    /// what a user calls one item: "task"
    pub item: &'static str,
    /// "Task"
    pub item_display: &'static str,
}

/// A resource family: Todo or Feedback.
pub trait Resource: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Mutable fields accepted by an update. Absent fields are kept.
    type Patch: Clone + fmt::Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    const LABELS: Labels;

    fn id(&self) -> &RecordId;
    fn text(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;

    /// Patch that rewrites only the text.
    fn text_patch(text: String) -> Self::Patch;
    /// Text carried by a patch, if any.
    fn patch_text(patch: &Self::Patch) -> Option<&str>;
}

/// Families with a completion flag.
pub trait Completable: Resource {
    fn completed(&self) -> bool;

    /// The full set of mutable fields with `completed` inverted.
    fn toggled(&self) -> Self::Patch;
}
