use crate::commands::records::{self, RecordStatusFilter};
use crate::commands::{optional_text, CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{MenuItem, Row};
use crate::store::{DataStore, Filter, RecordStore};
use crate::validation::Validator;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuInput {
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub order_index: i64,
}

/// `content: Some("")` clears the content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub order_index: Option<i64>,
}

pub fn list<S: DataStore>(store: &S, status: RecordStatusFilter) -> Result<CmdResult<MenuItem>> {
    let filter = status.apply(Filter::new().order_asc("order_index"));
    Ok(CmdResult::with_records(store.list_records(&filter)?))
}

pub fn add<S: DataStore>(store: &mut S, input: MenuInput) -> Result<CmdResult<MenuItem>> {
    let mut v = Validator::new();
    v.required("title", &input.title);
    v.required("slug", &input.slug);
    v.finish()?;

    let item = MenuItem {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        title: input.title.trim().to_string(),
        slug: input.slug.trim().to_string(),
        content: optional_text(input.content.as_deref()),
        order_index: input.order_index,
        deleted_at: None,
    };
    let created = store.insert_record(&item)?;
    tracing::info!(id = %created.id, slug = %created.slug, "menu added");
    let message = CmdMessage::success(format!("Menu added: {}", created.title));
    Ok(CmdResult::single(created, message))
}

pub fn update<S: DataStore>(store: &mut S, id: &Uuid, patch: MenuPatch) -> Result<CmdResult<MenuItem>> {
    let mut v = Validator::new();
    if let Some(title) = &patch.title {
        v.required("title", title);
    }
    if let Some(slug) = &patch.slug {
        v.required("slug", slug);
    }
    v.finish()?;

    let mut row = Row::new();
    if let Some(title) = patch.title {
        row.insert("title".into(), json!(title.trim()));
    }
    if let Some(slug) = patch.slug {
        row.insert("slug".into(), json!(slug.trim()));
    }
    if let Some(content) = patch.content {
        let content = optional_text(Some(content.as_str())).map_or(Value::Null, Value::String);
        row.insert("content".into(), content);
    }
    if let Some(order) = patch.order_index {
        row.insert("order_index".into(), json!(order));
    }
    if row.is_empty() {
        let current: MenuItem = store.get_record(id)?;
        return Ok(CmdResult::single(current, CmdMessage::info("Nothing to update")));
    }

    let updated: MenuItem = store.update_record(id, row)?;
    tracing::info!(%id, "menu updated");
    let message = CmdMessage::success(format!("Menu updated: {}", updated.title));
    Ok(CmdResult::single(updated, message))
}

pub fn delete<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<MenuItem>> {
    records::delete(store, id)
}

pub fn restore<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<MenuItem>> {
    records::restore(store, id)
}
