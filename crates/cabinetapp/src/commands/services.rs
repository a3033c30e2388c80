use crate::commands::records::{self, RecordStatusFilter};
use crate::commands::{non_empty_lines, CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{Row, Service};
use crate::store::{DataStore, Filter, RecordStore};
use crate::validation::Validator;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

/// Fields of a service entry as typed by an admin. `description` is free
/// text with one bullet per line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceInput {
    pub title: String,
    pub icon_name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServicePatch {
    pub title: Option<String>,
    pub icon_name: Option<String>,
    pub description: Option<String>,
}

fn check_lines(v: &mut Validator, lines: &[String]) {
    v.check(
        !lines.is_empty(),
        "description",
        "at least one description line is required",
    );
}

/// Services in the order they were added.
pub fn list<S: DataStore>(store: &S, status: RecordStatusFilter) -> Result<CmdResult<Service>> {
    let filter = status.apply(Filter::new().order_asc("created_at"));
    Ok(CmdResult::with_records(store.list_records(&filter)?))
}

pub fn add<S: DataStore>(store: &mut S, input: ServiceInput) -> Result<CmdResult<Service>> {
    let lines = non_empty_lines(&input.description);
    let mut v = Validator::new();
    v.required("title", &input.title);
    v.required("icon_name", &input.icon_name);
    check_lines(&mut v, &lines);
    v.finish()?;

    let service = Service {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        title: input.title.trim().to_string(),
        description: lines,
        icon_name: input.icon_name.trim().to_string(),
        deleted_at: None,
    };
    let created = store.insert_record(&service)?;
    tracing::info!(id = %created.id, title = %created.title, "service added");
    let message = CmdMessage::success(format!("Service added: {}", created.title));
    Ok(CmdResult::single(created, message))
}

pub fn update<S: DataStore>(store: &mut S, id: &Uuid, patch: ServicePatch) -> Result<CmdResult<Service>> {
    let lines = patch.description.as_deref().map(non_empty_lines);
    let mut v = Validator::new();
    if let Some(title) = &patch.title {
        v.required("title", title);
    }
    if let Some(icon) = &patch.icon_name {
        v.required("icon_name", icon);
    }
    if let Some(lines) = &lines {
        check_lines(&mut v, lines);
    }
    v.finish()?;

    let mut row = Row::new();
    if let Some(title) = patch.title {
        row.insert("title".into(), json!(title.trim()));
    }
    if let Some(icon) = patch.icon_name {
        row.insert("icon_name".into(), json!(icon.trim()));
    }
    if let Some(lines) = lines {
        row.insert("description".into(), json!(lines));
    }
    if row.is_empty() {
        let current: Service = store.get_record(id)?;
        return Ok(CmdResult::single(current, CmdMessage::info("Nothing to update")));
    }

    let updated: Service = store.update_record(id, row)?;
    tracing::info!(%id, "service updated");
    let message = CmdMessage::success(format!("Service updated: {}", updated.title));
    Ok(CmdResult::single(updated, message))
}

pub fn delete<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<Service>> {
    records::delete(store, id)
}

pub fn restore<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<Service>> {
    records::restore(store, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CabinetError;
    use crate::model::Collection;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn add_splits_description_lines() {
        let mut store = InMemoryStore::new();
        let result = add(
            &mut store,
            ServiceInput {
                title: "Droit immobilier".into(),
                icon_name: "Building".into(),
                description: "Transactions\n\n  Baux commerciaux  \n".into(),
            },
        )
        .unwrap();
        assert_eq!(result.records[0].description, ["Transactions", "Baux commerciaux"]);
    }

    #[test]
    fn add_requires_a_line() {
        let mut store = InMemoryStore::new();
        let err = add(
            &mut store,
            ServiceInput {
                title: "Conseil".into(),
                icon_name: "Scale".into(),
                description: " \n ".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CabinetError::Validation(ref v) if v.has("description")));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn list_is_oldest_first_and_hides_deleted() {
        let f = StoreFixture::new()
            .with_service("Contentieux", &["Litiges"])
            .with_service("Conseil", &["Audit"])
            .with_service("Fiscalité", &["TVA"]);
        let id = f.id_of(Collection::Services, "title", "Conseil");
        let mut store = f.store;
        delete(&mut store, &id).unwrap();

        let titles: Vec<String> = list(&store, RecordStatusFilter::Active)
            .unwrap()
            .records
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, ["Contentieux", "Fiscalité"]);
    }

    #[test]
    fn update_replaces_lines_only() {
        let f = StoreFixture::new().with_service("Conseil", &["Audit"]);
        let id = f.id_of(Collection::Services, "title", "Conseil");
        let mut store = f.store;

        let result = update(
            &mut store,
            &id,
            ServicePatch {
                description: Some("Audit\nDue diligence".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let service = &result.records[0];
        assert_eq!(service.title, "Conseil");
        assert_eq!(service.description, ["Audit", "Due diligence"]);
    }

    #[test]
    fn empty_patch_does_not_write() {
        let f = StoreFixture::new().with_service("Conseil", &["Audit"]);
        let id = f.id_of(Collection::Services, "title", "Conseil");
        let mut store = f.store;
        let writes = store.write_count();
        update(&mut store, &id, ServicePatch::default()).unwrap();
        assert_eq!(store.write_count(), writes);
    }
}
