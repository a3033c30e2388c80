use crate::commands::{records, CmdMessage, CmdResult};
use crate::error::{CabinetError, Result};
use crate::model::{PageContent, Row};
use crate::store::{DataStore, Filter, RecordStore};
use crate::validation::Validator;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::records::RecordStatusFilter;

/// Page content sections ordered by page then section name.
pub fn list<S: DataStore>(store: &S, status: RecordStatusFilter) -> Result<CmdResult<PageContent>> {
    let mut docs: Vec<PageContent> = store.list_records(&status.apply(Filter::new()))?;
    docs.sort_by(|a, b| {
        (a.page_name.as_str(), a.section_name.as_str())
            .cmp(&(b.page_name.as_str(), b.section_name.as_str()))
    });
    Ok(CmdResult::with_records(docs))
}

/// The active document for one page section.
pub fn fetch<S: DataStore>(store: &S, page_name: &str, section_name: &str) -> Result<PageContent> {
    let (page_name, section_name) = (page_name.trim(), section_name.trim());
    let filter = Filter::new()
        .eq("page_name", page_name)
        .eq("section_name", section_name)
        .active()
        .order_desc("created_at")
        .limit(1);
    store
        .list_records::<PageContent>(&filter)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            CabinetError::NotFound(format!("content for {}/{}", page_name, section_name))
        })
}

/// Overwrites the whole document of row `id`.
pub fn save<S: DataStore>(store: &mut S, id: &Uuid, document: &Value) -> Result<PageContent> {
    let mut patch = Row::new();
    patch.insert("content".to_string(), document.clone());
    let saved = store.update_record::<PageContent>(id, patch)?;
    tracing::info!(%id, page = %saved.page_name, section = %saved.section_name, "content saved");
    Ok(saved)
}

/// Creates a section, or replaces the document of the active one.
pub fn put<S: DataStore>(
    store: &mut S,
    page_name: &str,
    section_name: &str,
    document: Value,
) -> Result<CmdResult<PageContent>> {
    let page_name = page_name.trim();
    let section_name = section_name.trim();
    let mut v = Validator::new();
    v.required("page_name", page_name);
    v.required("section_name", section_name);
    v.finish()?;

    match fetch(store, page_name, section_name) {
        Ok(existing) => {
            let saved = save(store, &existing.id, &document)?;
            Ok(CmdResult::single(
                saved,
                CmdMessage::success(format!("Replaced {}/{}", page_name, section_name)),
            ))
        }
        Err(CabinetError::NotFound(_)) => {
            let doc = PageContent {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                page_name: page_name.to_string(),
                section_name: section_name.to_string(),
                content: document,
                deleted_at: None,
            };
            let created = store.insert_record(&doc)?;
            tracing::info!(id = %created.id, page = page_name, section = section_name, "content created");
            Ok(CmdResult::single(
                created,
                CmdMessage::success(format!("Created {}/{}", page_name, section_name)),
            ))
        }
        Err(e) => Err(e),
    }
}

pub fn delete<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<PageContent>> {
    records::delete(store, id)
}

pub fn restore<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<PageContent>> {
    records::restore(store, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Collection;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;
    use serde_json::json;

    #[test]
    fn save_then_fetch_returns_saved_document() {
        let f = StoreFixture::new().with_document("home", "hero", json!({ "title": "Welcome" }));
        let mut store = f.store;
        let doc = fetch(&store, "home", "hero").unwrap();

        let edited = json!({ "title": "Bienvenue", "items": [1, { "deep": [true, null] }] });
        save(&mut store, &doc.id, &edited).unwrap();

        assert_eq!(fetch(&store, "home", "hero").unwrap().content, edited);
    }

    #[test]
    fn fetch_skips_deleted_sections() {
        let f = StoreFixture::new().with_document("home", "hero", json!({}));
        let id = f.id_of(Collection::PageContents, "section_name", "hero");
        let mut store = f.store;
        delete(&mut store, &id).unwrap();
        assert!(matches!(fetch(&store, "home", "hero"), Err(CabinetError::NotFound(_))));

        restore(&mut store, &id).unwrap();
        assert!(fetch(&store, "home", "hero").is_ok());
    }

    #[test]
    fn put_creates_then_replaces() {
        let mut store = InMemoryStore::new();
        put(&mut store, "about", "team", json!(["a"])).unwrap();
        put(&mut store, "about", "team", json!(["a", "b"])).unwrap();

        let all = list(&store, RecordStatusFilter::All).unwrap();
        assert_eq!(all.records.len(), 1);
        assert_eq!(all.records[0].content, json!(["a", "b"]));
    }

    #[test]
    fn put_trims_names_before_lookup() {
        let f = StoreFixture::new().with_document("home", "hero", json!({ "title": "Welcome" }));
        let mut store = f.store;
        let result = put(&mut store, "home ", " hero", json!({ "title": "Bienvenue" })).unwrap();
        assert_eq!(result.messages[0].content, "Replaced home/hero");

        let all = list(&store, RecordStatusFilter::All).unwrap();
        assert_eq!(all.records.len(), 1);
        assert_eq!(fetch(&store, "home", "hero").unwrap().content, json!({ "title": "Bienvenue" }));
    }

    #[test]
    fn put_requires_identity() {
        let mut store = InMemoryStore::new();
        let err = put(&mut store, " ", "hero", json!({})).unwrap_err();
        assert!(matches!(err, CabinetError::Validation(ref v) if v.has("page_name")));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn list_orders_by_page_then_section() {
        let f = StoreFixture::new()
            .with_document("services", "intro", json!("x"))
            .with_document("home", "stats", json!(1))
            .with_document("home", "hero", json!({}));
        let names: Vec<String> = list(&f.store, RecordStatusFilter::Active)
            .unwrap()
            .records
            .iter()
            .map(|d| format!("{}/{}", d.page_name, d.section_name))
            .collect();
        assert_eq!(names, ["home/hero", "home/stats", "services/intro"]);
    }

    #[test]
    fn failed_save_reports_persistence_error() {
        let f = StoreFixture::new().with_document("home", "hero", json!({ "a": 1 }));
        let mut store = f.store;
        let doc = fetch(&store, "home", "hero").unwrap();
        store.set_simulate_write_error(true);
        let err = save(&mut store, &doc.id, &json!({ "a": 2 })).unwrap_err();
        assert!(err.is_persistence());
        store.set_simulate_write_error(false);
        assert_eq!(fetch(&store, "home", "hero").unwrap().content, json!({ "a": 1 }));
    }
}
