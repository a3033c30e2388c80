//! The catalog of property types listings pick from.
//!
//! Listings store the type by name rather than by id, so removing a type
//! from the catalog leaves existing listings untouched; only new listings
//! and type changes are checked against the active entries.

use crate::commands::records::{self, RecordStatusFilter};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::PropertyType;
use crate::store::{DataStore, Filter, RecordStore};
use crate::validation::Validator;
use chrono::Utc;
use uuid::Uuid;

/// Catalog entries by name.
pub fn list<S: DataStore>(store: &S, status: RecordStatusFilter) -> Result<CmdResult<PropertyType>> {
    let filter = status.apply(Filter::new().order_asc("name"));
    Ok(CmdResult::with_records(store.list_records(&filter)?))
}

/// Names of the active entries, alphabetical.
pub fn names<S: DataStore>(store: &S) -> Result<Vec<String>> {
    Ok(list(store, RecordStatusFilter::Active)?
        .records
        .into_iter()
        .map(|t| t.name)
        .collect())
}

/// The catalog spelling of `name`, matched case-insensitively.
pub fn canonical<'a>(known: &'a [String], name: &str) -> Option<&'a str> {
    let name = name.trim();
    known
        .iter()
        .find(|k| k.to_lowercase() == name.to_lowercase())
        .map(String::as_str)
}

/// Records a `property_type` error unless `name` is in the catalog, and
/// returns the catalog spelling otherwise.
pub(crate) fn check(v: &mut Validator, known: &[String], name: &str) -> Option<String> {
    if name.trim().is_empty() {
        v.fail("property_type", "a property type is required");
        return None;
    }
    match canonical(known, name) {
        Some(found) => Some(found.to_string()),
        None if known.is_empty() => {
            v.fail("property_type", "no property types are defined yet");
            None
        }
        None => {
            v.fail(
                "property_type",
                format!("'{}' is not one of: {}", name.trim(), known.join(", ")),
            );
            None
        }
    }
}

pub fn add<S: DataStore>(store: &mut S, name: &str) -> Result<CmdResult<PropertyType>> {
    let known = names(store)?;
    let mut v = Validator::new();
    v.required("name", name);
    v.check(
        canonical(&known, name).is_none(),
        "name",
        &format!("'{}' already exists", name.trim()),
    );
    v.finish()?;

    let entry = PropertyType {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        name: name.trim().to_string(),
        deleted_at: None,
    };
    let created = store.insert_record(&entry)?;
    tracing::info!(id = %created.id, name = %created.name, "property type added");
    let message = CmdMessage::success(format!("Property type added: {}", created.name));
    Ok(CmdResult::single(created, message))
}

pub fn delete<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<PropertyType>> {
    records::delete(store, id)
}

pub fn restore<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<PropertyType>> {
    records::restore(store, id)
}
