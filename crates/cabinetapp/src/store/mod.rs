//! # Storage Layer
//!
//! Persistence and file storage belong to an external backend-as-a-service.
//! This module defines the two seams the rest of the crate talks to:
//!
//! - [`DataStore`]: row CRUD over named collections (`list`, `get`, `insert`,
//!   `update`). Soft delete and restore are updates of `deleted_at` and live
//!   in the command layer.
//! - [`FileStorage`]: upload bytes into a bucket and get back a public URL.
//!
//! Rows are untyped JSON objects. [`RecordStore`] adds typed access for any
//! [`Record`] on top of every `DataStore`.
//!
//! ## Implementations
//!
//! - [`memory::InMemoryStore`]: maps behind `RefCell`, for tests.
//! - [`fs::FileStore`]: one JSON file per collection under a data directory,
//!   uploads stored next to it. Used for local work and the CLI's tests.
//! - [`rest::RestStore`]: the hosted backend's REST and storage APIs.
//!
//! [`ConfiguredStore`] picks one of the production backends at runtime.
//!
//! ## Storage Layout (FileStore)
//!
//! ```text
//! <data_dir>/
//! ├── page_contents.json       # one JSON array of rows per collection
//! ├── properties.json
//! ├── ...
//! └── storage/
//!     ├── payment_receipts/<uuid>.<ext>
//!     └── property_media/properties/...
//! ```

use crate::error::{CabinetError, Result};
use crate::model::{row_id, Collection, Record, Row, CREATED_AT, ID};
use chrono::Utc;
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

pub mod filter;
pub mod fs;
pub mod memory;
pub mod rest;

pub use filter::Filter;

/// Bucket for appointment payment receipts.
pub const RECEIPTS_BUCKET: &str = "payment_receipts";
/// Bucket for listing photos and videos.
pub const MEDIA_BUCKET: &str = "property_media";

/// Row CRUD over the backend's collections.
pub trait DataStore {
    /// Rows of `collection` selected by `filter`.
    fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Row>>;

    /// One row by id, or `NotFound`.
    fn get(&self, collection: Collection, id: &Uuid) -> Result<Row>;

    /// Inserts `row` and returns it as stored. `id` and `created_at` are
    /// filled in when absent.
    fn insert(&mut self, collection: Collection, row: Row) -> Result<Row>;

    /// Overwrites the columns present in `patch` and returns the updated row.
    fn update(&mut self, collection: Collection, id: &Uuid, patch: Row) -> Result<Row>;
}

/// Object storage with public URLs.
pub trait FileStorage {
    /// Stores `bytes` at `bucket/path` and returns the public URL.
    fn upload(&mut self, bucket: &str, path: &str, bytes: &[u8]) -> Result<String>;

    fn remove(&mut self, bucket: &str, path: &str) -> Result<()>;
}

/// A file picked by the user, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Lowercased extension without the dot, or `bin`.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "bin".to_string())
    }

    /// A fresh `<prefix><uuid>.<ext>` object path.
    pub fn storage_path(&self, prefix: &str) -> String {
        format!("{}{}.{}", prefix, Uuid::new_v4(), self.extension())
    }
}

pub fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Fills `id` and `created_at` when the caller left them out.
pub(crate) fn stamp_new_row(mut row: Row) -> Row {
    if row.get(ID).map_or(true, Value::is_null) {
        row.insert(ID.into(), Value::String(Uuid::new_v4().to_string()));
    }
    if row.get(CREATED_AT).map_or(true, Value::is_null) {
        row.insert(CREATED_AT.into(), Value::String(Utc::now().to_rfc3339()));
    }
    row
}

/// Applies `patch` onto `row`; `id` is never changed.
pub(crate) fn merge_patch(row: &mut Row, patch: Row) {
    for (k, v) in patch {
        if k != ID {
            row.insert(k, v);
        }
    }
}

pub(crate) fn require_id(row: &Row) -> Result<Uuid> {
    row_id(row).ok_or_else(|| CabinetError::persistence("row has no valid id"))
}

pub(crate) fn not_found(collection: Collection, id: &Uuid) -> CabinetError {
    CabinetError::NotFound(format!("{} {}", collection, id))
}

/// Typed access on top of any [`DataStore`].
pub trait RecordStore: DataStore {
    fn list_records<R: Record>(&self, filter: &Filter) -> Result<Vec<R>> {
        self.list(R::COLLECTION, filter)?
            .into_iter()
            .map(R::from_row)
            .collect()
    }

    fn get_record<R: Record>(&self, id: &Uuid) -> Result<R> {
        R::from_row(self.get(R::COLLECTION, id)?)
    }

    fn insert_record<R: Record>(&mut self, record: &R) -> Result<R> {
        let row = self.insert(R::COLLECTION, record.to_row()?)?;
        R::from_row(row)
    }

    fn update_record<R: Record>(&mut self, id: &Uuid, patch: Row) -> Result<R> {
        R::from_row(self.update(R::COLLECTION, id, patch)?)
    }
}

impl<S: DataStore + ?Sized> RecordStore for S {}

/// The backend chosen by configuration.
pub enum ConfiguredStore {
    Fs(fs::FileStore),
    Rest(rest::RestStore),
}

impl DataStore for ConfiguredStore {
    fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Row>> {
        match self {
            ConfiguredStore::Fs(s) => s.list(collection, filter),
            ConfiguredStore::Rest(s) => s.list(collection, filter),
        }
    }

    fn get(&self, collection: Collection, id: &Uuid) -> Result<Row> {
        match self {
            ConfiguredStore::Fs(s) => s.get(collection, id),
            ConfiguredStore::Rest(s) => s.get(collection, id),
        }
    }

    fn insert(&mut self, collection: Collection, row: Row) -> Result<Row> {
        match self {
            ConfiguredStore::Fs(s) => s.insert(collection, row),
            ConfiguredStore::Rest(s) => s.insert(collection, row),
        }
    }

    fn update(&mut self, collection: Collection, id: &Uuid, patch: Row) -> Result<Row> {
        match self {
            ConfiguredStore::Fs(s) => s.update(collection, id, patch),
            ConfiguredStore::Rest(s) => s.update(collection, id, patch),
        }
    }
}

impl FileStorage for ConfiguredStore {
    fn upload(&mut self, bucket: &str, path: &str, bytes: &[u8]) -> Result<String> {
        match self {
            ConfiguredStore::Fs(s) => s.upload(bucket, path, bytes),
            ConfiguredStore::Rest(s) => s.upload(bucket, path, bytes),
        }
    }

    fn remove(&mut self, bucket: &str, path: &str) -> Result<()> {
        match self {
            ConfiguredStore::Fs(s) => s.remove(bucket, path),
            ConfiguredStore::Rest(s) => s.remove(bucket, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::into_row;
    use serde_json::json;

    #[test]
    fn stamping_keeps_given_identity() {
        let id = Uuid::new_v4();
        let row = stamp_new_row(into_row(json!({ "id": id, "created_at": "2024-01-01T00:00:00Z" })).unwrap());
        assert_eq!(row_id(&row), Some(id));
        assert_eq!(row[CREATED_AT], json!("2024-01-01T00:00:00Z"));

        let row = stamp_new_row(into_row(json!({ "id": null })).unwrap());
        assert!(row_id(&row).is_some());
        assert!(row[CREATED_AT].is_string());
    }

    #[test]
    fn patch_never_rewrites_id() {
        let id = Uuid::new_v4();
        let mut row = into_row(json!({ "id": id, "title": "a" })).unwrap();
        merge_patch(&mut row, into_row(json!({ "id": Uuid::new_v4(), "title": "b" })).unwrap());
        assert_eq!(row_id(&row), Some(id));
        assert_eq!(row["title"], json!("b"));
    }

    #[test]
    fn attachment_paths() {
        let receipt = Attachment::new("Reçu.PDF", vec![1, 2, 3]);
        assert_eq!(receipt.extension(), "pdf");
        let path = receipt.storage_path("");
        assert!(path.ends_with(".pdf"));
        assert_eq!(path.len(), 36 + 4);

        assert_eq!(Attachment::new("noext", vec![]).extension(), "bin");
        assert!(Attachment::new("a.jpg", vec![])
            .storage_path("properties/")
            .starts_with("properties/"));
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("x/y.PDF"), "application/pdf");
        assert_eq!(content_type_for("v.mp4"), "video/mp4");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }
}
