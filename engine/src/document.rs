//! Document - the single root object holding all collections.
//!
//! The whole document is read and written as one JSON value; mutations are
//! whole-document replace. The permissive upsert/delete logic lives here so
//! callers never touch collections directly.

use crate::{
    error::Result,
    identity::{generate_id, Stamper},
    record::Record,
    Error, ImagePath, RecordId,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The four named record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Inspections,
    Observations,
    Requisitions,
    Users,
}

impl CollectionKind {
    /// Every collection, in document order.
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Inspections,
        CollectionKind::Observations,
        CollectionKind::Requisitions,
        CollectionKind::Users,
    ];

    /// Collection name as it appears in the document and on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Inspections => "inspections",
            CollectionKind::Observations => "observations",
            CollectionKind::Requisitions => "requisitions",
            CollectionKind::Users => "users",
        }
    }

    /// Prefix used for generated record ids in this collection.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            CollectionKind::Inspections => "INSP",
            CollectionKind::Observations => "OBS",
            CollectionKind::Requisitions => "REQ",
            CollectionKind::Users => "USR",
        }
    }

    /// Baseline/export file path for this collection.
    pub fn file_path(&self) -> String {
        format!("data/{}.json", self.as_str())
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an upsert: which branch was taken, and the record's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(RecordId),
    Updated(RecordId),
}

impl UpsertOutcome {
    /// The id of the affected record.
    pub fn id(&self) -> &str {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => id,
        }
    }
}

/// The root persisted object: four record collections plus the image map.
///
/// All fields default to empty so a document missing any of them still
/// deserializes; there is exactly one document per store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub inspections: Vec<Record>,
    #[serde(default)]
    pub observations: Vec<Record>,
    #[serde(default)]
    pub requisitions: Vec<Record>,
    #[serde(default)]
    pub users: Vec<Record>,
    /// Image blobs keyed by path-like strings; values are base64 data URLs.
    /// Keys are never garbage-collected when an owning record is deleted.
    #[serde(default)]
    pub images: BTreeMap<ImagePath, String>,
}

impl Document {
    /// Parse a document from its serialized form.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    /// Serialize the document for persistence.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    /// Records in the named collection.
    pub fn collection(&self, kind: CollectionKind) -> &[Record] {
        match kind {
            CollectionKind::Inspections => &self.inspections,
            CollectionKind::Observations => &self.observations,
            CollectionKind::Requisitions => &self.requisitions,
            CollectionKind::Users => &self.users,
        }
    }

    /// Mutable records in the named collection.
    pub fn collection_mut(&mut self, kind: CollectionKind) -> &mut Vec<Record> {
        match kind {
            CollectionKind::Inspections => &mut self.inspections,
            CollectionKind::Observations => &mut self.observations,
            CollectionKind::Requisitions => &mut self.requisitions,
            CollectionKind::Users => &mut self.users,
        }
    }

    /// Replace the named collection wholesale.
    pub fn set_collection(&mut self, kind: CollectionKind, rows: Vec<Record>) {
        *self.collection_mut(kind) = rows;
    }

    /// Find a record by id.
    pub fn find(&self, kind: CollectionKind, id: &str) -> Option<&Record> {
        self.collection(kind).iter().find(|r| r.id == id)
    }

    /// Insert or update a record by id.
    ///
    /// A payload whose id matches an existing record replaces that record
    /// with the merge of both field sets, keeping the existing id and
    /// restamping as an update. Any other payload is appended as a new
    /// record; a payload carrying an id not present in the collection is
    /// inserted under that id rather than rejected.
    pub fn upsert(
        &mut self,
        kind: CollectionKind,
        payload: Map<String, Value>,
        prefix: &str,
        stamper: &Stamper,
    ) -> UpsertOutcome {
        let requested_id = payload
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let rows = self.collection_mut(kind);

        if !requested_id.is_empty() {
            if let Some(idx) = rows.iter().position(|r| r.id == requested_id) {
                let mut merged = rows[idx].clone();
                merged.merge_fields(&payload);
                rows[idx] = stamper.stamp(merged, true);
                return UpsertOutcome::Updated(requested_id);
            }
        }

        let mut record = Record::from_payload(payload);
        if record.id.is_empty() {
            record.id = generate_id(prefix);
        }
        let record = stamper.stamp(record, false);
        let id = record.id.clone();
        rows.push(record);
        UpsertOutcome::Inserted(id)
    }

    /// Remove every record with the given id. Returns whether anything was
    /// removed; a miss is a no-op, not an error.
    pub fn delete(&mut self, kind: CollectionKind, id: &str) -> bool {
        let rows = self.collection_mut(kind);
        let before = rows.len();
        rows.retain(|r| r.id != id);
        rows.len() != before
    }

    /// Store an image blob at the exact caller-supplied path.
    pub fn insert_image(&mut self, path: impl Into<ImagePath>, data: impl Into<String>) {
        self.images.insert(path.into(), data.into());
    }

    /// The stored blob for a path, or empty if absent.
    pub fn image_data(&self, path: &str) -> &str {
        self.images.get(path).map(String::as_str).unwrap_or("")
    }

    /// Total record count across all collections.
    pub fn record_count(&self) -> usize {
        CollectionKind::ALL
            .iter()
            .map(|kind| self.collection(*kind).len())
            .sum()
    }
}
