use super::{merge_patch, not_found, require_id, stamp_new_row, DataStore, FileStorage, Filter};
use crate::error::{CabinetError, Result};
use crate::model::{row_id, Collection, Row};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory backend for tests.
///
/// Uses `RefCell` for interior mutability since the library is
/// single-threaded, so failure switches and counters can be flipped through
/// a shared reference while the store is owned by an API facade.
#[derive(Default)]
pub struct InMemoryStore {
    rows: RefCell<HashMap<Collection, Vec<Row>>>,
    objects: RefCell<HashMap<(String, String), Vec<u8>>>,
    simulate_write_error: Cell<bool>,
    simulate_upload_error: Cell<bool>,
    reads: Cell<usize>,
    writes: Cell<usize>,
    uploads: Cell<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `insert`/`update` fail with a retryable persistence error.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    pub fn set_simulate_upload_error(&self, simulate: bool) {
        self.simulate_upload_error.set(simulate);
    }

    /// Number of `list`/`get` calls made so far.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Number of `insert`/`update` calls attempted so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Number of `upload` calls attempted so far.
    pub fn upload_count(&self) -> usize {
        self.uploads.get()
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.objects
            .borrow()
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    pub fn object_count(&self, bucket: &str) -> usize {
        self.objects.borrow().keys().filter(|(b, _)| b == bucket).count()
    }

    pub fn row_count(&self, collection: Collection) -> usize {
        self.rows.borrow().get(&collection).map_or(0, Vec::len)
    }

    fn check_write(&self) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        if self.simulate_write_error.get() {
            return Err(CabinetError::retryable("Simulated write error"));
        }
        Ok(())
    }
}

impl DataStore for InMemoryStore {
    fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Row>> {
        self.reads.set(self.reads.get() + 1);
        let rows = self.rows.borrow();
        let all = rows.get(&collection).cloned().unwrap_or_default();
        Ok(filter.apply(all))
    }

    fn get(&self, collection: Collection, id: &Uuid) -> Result<Row> {
        self.reads.set(self.reads.get() + 1);
        self.rows
            .borrow()
            .get(&collection)
            .and_then(|rows| rows.iter().find(|r| row_id(r) == Some(*id)).cloned())
            .ok_or_else(|| not_found(collection, id))
    }

    fn insert(&mut self, collection: Collection, row: Row) -> Result<Row> {
        self.check_write()?;
        let row = stamp_new_row(row);
        let id = require_id(&row)?;
        let mut rows = self.rows.borrow_mut();
        let table = rows.entry(collection).or_default();
        if table.iter().any(|r| row_id(r) == Some(id)) {
            return Err(CabinetError::persistence(format!(
                "duplicate key: {} {}",
                collection, id
            )));
        }
        table.push(row.clone());
        Ok(row)
    }

    fn update(&mut self, collection: Collection, id: &Uuid, patch: Row) -> Result<Row> {
        self.check_write()?;
        let mut rows = self.rows.borrow_mut();
        let row = rows
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(*id)))
            .ok_or_else(|| not_found(collection, id))?;
        merge_patch(row, patch);
        Ok(row.clone())
    }
}

impl FileStorage for InMemoryStore {
    fn upload(&mut self, bucket: &str, path: &str, bytes: &[u8]) -> Result<String> {
        self.uploads.set(self.uploads.get() + 1);
        if self.simulate_upload_error.get() {
            return Err(CabinetError::retryable("Simulated upload error"));
        }
        self.objects
            .borrow_mut()
            .insert((bucket.to_string(), path.to_string()), bytes.to_vec());
        Ok(format!("memory://{}/{}", bucket, path))
    }

    fn remove(&mut self, bucket: &str, path: &str) -> Result<()> {
        self.objects
            .borrow_mut()
            .remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::into_row;
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};

    pub struct StoreFixture {
        pub store: InMemoryStore,
        step: i64,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
                step: 0,
            }
        }

        /// Strictly increasing creation times, so ordering tests are stable.
        fn next_created_at(&mut self) -> String {
            self.step += 1;
            (Utc::now() - Duration::hours(1000) + Duration::minutes(self.step)).to_rfc3339()
        }

        fn add(&mut self, collection: Collection, value: Value) -> Uuid {
            let mut row = into_row(value).unwrap();
            row.insert("created_at".into(), json!(self.next_created_at()));
            let row = self.store.insert(collection, row).unwrap();
            row_id(&row).unwrap()
        }

        pub fn with_document(mut self, page: &str, section: &str, content: Value) -> Self {
            self.add(
                Collection::PageContents,
                json!({ "page_name": page, "section_name": section, "content": content, "deleted_at": null }),
            );
            self
        }

        pub fn with_property(mut self, title: &str, listing: &str, kind: &str, price: f64, location: &str) -> Self {
            self.add(
                Collection::Properties,
                json!({
                    "title": title,
                    "description": format!("{} description", title),
                    "type": listing,
                    "property_type": kind,
                    "price": price,
                    "location": location,
                    "surface": 120.0,
                    "images": [],
                    "videos": [],
                    "deleted_at": null
                }),
            );
            self
        }

        pub fn with_property_type(mut self, name: &str) -> Self {
            self.add(
                Collection::PropertyTypes,
                json!({ "name": name, "deleted_at": null }),
            );
            self
        }

        pub fn with_deleted_property(mut self, title: &str) -> Self {
            self.add(
                Collection::Properties,
                json!({
                    "title": title,
                    "description": "gone",
                    "type": "vente",
                    "property_type": "terrain",
                    "price": 1.0,
                    "location": "Bingerville",
                    "surface": 500.0,
                    "deleted_at": Utc::now().to_rfc3339()
                }),
            );
            self
        }

        pub fn with_service(mut self, title: &str, lines: &[&str]) -> Self {
            self.add(
                Collection::Services,
                json!({ "title": title, "description": lines, "icon_name": "Scale", "deleted_at": null }),
            );
            self
        }

        pub fn with_social_link(mut self, name: &str, order_index: i64) -> Self {
            self.add(
                Collection::SocialLinks,
                json!({
                    "name": name,
                    "url": format!("https://{}.com/cabinet", name.to_lowercase()),
                    "icon_name": name,
                    "order_index": order_index,
                    "deleted_at": null
                }),
            );
            self
        }

        pub fn with_menu(mut self, title: &str, slug: &str, order_index: i64) -> Self {
            self.add(
                Collection::Menus,
                json!({ "title": title, "slug": slug, "content": null, "order_index": order_index, "deleted_at": null }),
            );
            self
        }

        pub fn with_appointment(mut self, full_name: &str, status: &str) -> Self {
            self.add(
                Collection::Appointments,
                json!({
                    "full_name": full_name,
                    "email": "client@example.com",
                    "phone": "0707070707",
                    "desired_date": "2030-05-06",
                    "appointment_time": "10:00",
                    "status": status
                }),
            );
            self
        }

        /// Id of the first row of `collection` matching `column == value`.
        pub fn id_of(&self, collection: Collection, column: &str, value: &str) -> Uuid {
            let rows = self
                .store
                .list(collection, &Filter::new().eq(column, value))
                .unwrap();
            row_id(&rows[0]).unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::StoreFixture;
    use super::*;
    use crate::model::into_row;
    use serde_json::json;

    #[test]
    fn insert_fills_identity() {
        let mut store = InMemoryStore::new();
        let row = store
            .insert(Collection::Menus, into_row(json!({ "title": "Accueil" })).unwrap())
            .unwrap();
        let id = row_id(&row).unwrap();
        assert!(row["created_at"].is_string());
        assert_eq!(store.get(Collection::Menus, &id).unwrap()["title"], json!("Accueil"));
    }

    #[test]
    fn update_merges_columns() {
        let f = StoreFixture::new().with_menu("Accueil", "accueil", 1);
        let id = f.id_of(Collection::Menus, "slug", "accueil");
        let mut store = f.store;
        let row = store
            .update(Collection::Menus, &id, into_row(json!({ "title": "Home" })).unwrap())
            .unwrap();
        assert_eq!(row["title"], json!("Home"));
        assert_eq!(row["slug"], json!("accueil"));
    }

    #[test]
    fn missing_rows_are_not_found() {
        let mut store = InMemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.get(Collection::Properties, &id), Err(CabinetError::NotFound(_))));
        assert!(matches!(
            store.update(Collection::Properties, &id, Row::new()),
            Err(CabinetError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = InMemoryStore::new();
        let row = into_row(json!({ "id": Uuid::new_v4(), "title": "x" })).unwrap();
        store.insert(Collection::Menus, row.clone()).unwrap();
        assert!(store.insert(Collection::Menus, row).unwrap_err().is_persistence());
    }

    #[test]
    fn simulated_write_errors_leave_rows_alone() {
        let f = StoreFixture::new().with_menu("Accueil", "accueil", 1);
        let id = f.id_of(Collection::Menus, "slug", "accueil");
        let mut store = f.store;
        store.set_simulate_write_error(true);
        let err = store
            .update(Collection::Menus, &id, into_row(json!({ "title": "Home" })).unwrap())
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.get(Collection::Menus, &id).unwrap()["title"], json!("Accueil"));
    }

    #[test]
    fn uploads_are_kept_per_bucket() {
        let mut store = InMemoryStore::new();
        let url = store.upload("payment_receipts", "a.pdf", b"%PDF").unwrap();
        assert_eq!(url, "memory://payment_receipts/a.pdf");
        assert_eq!(store.object("payment_receipts", "a.pdf").unwrap(), b"%PDF");
        store.remove("payment_receipts", "a.pdf").unwrap();
        assert_eq!(store.object_count("payment_receipts"), 0);
        assert_eq!(store.upload_count(), 1);
    }
}
