use super::{merge_patch, not_found, require_id, stamp_new_row, DataStore, FileStorage, Filter};
use crate::error::{CabinetError, Result};
use crate::model::{row_id, Collection, Row};
use std::fs;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Local backend: one JSON array per collection, uploads on disk.
pub struct FileStore {
    root: PathBuf,
    public_url: Option<String>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_url: None,
        }
    }

    /// Serve uploads under `base` (e.g. a static file server) instead of
    /// `file://` URLs.
    pub fn with_public_url(mut self, base: Option<String>) -> Self {
        self.public_url = base.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_file(&self, collection: Collection) -> PathBuf {
        self.root.join(format!("{}.json", collection.table_name()))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    fn load(&self, collection: Collection) -> Result<Vec<Row>> {
        let file = self.collection_file(collection);
        if !file.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&file)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, collection: Collection, rows: &[Row]) -> Result<()> {
        self.ensure_dir(&self.root)?;
        let content = serde_json::to_string_pretty(rows)?;

        let tmp_file = self
            .root
            .join(format!(".{}-{}.tmp", collection.table_name(), Uuid::new_v4()));
        fs::write(&tmp_file, content)?;
        fs::rename(&tmp_file, self.collection_file(collection))?;
        tracing::debug!(%collection, rows = rows.len(), "collection saved");
        Ok(())
    }

    /// Resolves `bucket/path` inside the storage directory, refusing keys
    /// that would climb out of it.
    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || bucket.is_empty() || path.is_empty() {
            return Err(CabinetError::persistence(format!(
                "invalid storage key '{}/{}'",
                bucket, path
            )));
        }
        Ok(self.root.join("storage").join(relative))
    }

    fn public_url_for(&self, bucket: &str, path: &str, file: &Path) -> Result<String> {
        match &self.public_url {
            Some(base) => Ok(format!("{}/{}/{}", base.trim_end_matches('/'), bucket, path)),
            None => Ok(format!("file://{}", fs::canonicalize(file)?.display())),
        }
    }
}

impl DataStore for FileStore {
    fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Row>> {
        Ok(filter.apply(self.load(collection)?))
    }

    fn get(&self, collection: Collection, id: &Uuid) -> Result<Row> {
        self.load(collection)?
            .into_iter()
            .find(|r| row_id(r) == Some(*id))
            .ok_or_else(|| not_found(collection, id))
    }

    fn insert(&mut self, collection: Collection, row: Row) -> Result<Row> {
        let row = stamp_new_row(row);
        let id = require_id(&row)?;
        let mut rows = self.load(collection)?;
        if rows.iter().any(|r| row_id(r) == Some(id)) {
            return Err(CabinetError::persistence(format!(
                "duplicate key: {} {}",
                collection, id
            )));
        }
        rows.push(row.clone());
        self.save(collection, &rows)?;
        Ok(row)
    }

    fn update(&mut self, collection: Collection, id: &Uuid, patch: Row) -> Result<Row> {
        let mut rows = self.load(collection)?;
        let row = rows
            .iter_mut()
            .find(|r| row_id(r) == Some(*id))
            .ok_or_else(|| not_found(collection, id))?;
        merge_patch(row, patch);
        let updated = row.clone();
        self.save(collection, &rows)?;
        Ok(updated)
    }
}

impl FileStorage for FileStore {
    fn upload(&mut self, bucket: &str, path: &str, bytes: &[u8]) -> Result<String> {
        let file = self.object_path(bucket, path)?;
        if let Some(parent) = file.parent() {
            self.ensure_dir(parent)?;
        }
        fs::write(&file, bytes)?;
        tracing::debug!(bucket, path, size = bytes.len(), "object stored");
        self.public_url_for(bucket, path, &file)
    }

    fn remove(&mut self, bucket: &str, path: &str) -> Result<()> {
        let file = self.object_path(bucket, path)?;
        if file.exists() {
            fs::remove_file(file)?;
        }
        Ok(())
    }
}
