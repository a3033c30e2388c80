use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CabinetError, Result};
use crate::model::{Collection, Row, SoftDeletable, DELETED_AT};
use crate::store::{DataStore, Filter, RecordStore};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

/// Which side of the soft-delete line to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordStatusFilter {
    #[default]
    Active,
    Deleted,
    All,
}

impl RecordStatusFilter {
    pub fn apply(&self, filter: Filter) -> Filter {
        match self {
            RecordStatusFilter::Active => filter.active(),
            RecordStatusFilter::Deleted => filter.deleted(),
            RecordStatusFilter::All => filter,
        }
    }
}

fn deleted_at_patch(value: Value) -> Row {
    let mut patch = Row::new();
    patch.insert(DELETED_AT.to_string(), value);
    patch
}

fn ensure_soft_deletable(collection: Collection) -> Result<()> {
    if collection.soft_deletable() {
        Ok(())
    } else {
        Err(CabinetError::Precondition(format!(
            "{} rows cannot be soft-deleted",
            collection
        )))
    }
}

/// Sets `deleted_at` on one row.
pub fn soft_delete_row<S: DataStore>(store: &mut S, collection: Collection, id: &Uuid) -> Result<Row> {
    ensure_soft_deletable(collection)?;
    store.update(collection, id, deleted_at_patch(Value::String(Utc::now().to_rfc3339())))
}

/// Clears `deleted_at` on one row.
pub fn restore_row<S: DataStore>(store: &mut S, collection: Collection, id: &Uuid) -> Result<Row> {
    ensure_soft_deletable(collection)?;
    store.update(collection, id, deleted_at_patch(Value::Null))
}

/// Soft-deletes a record. Deleting an already deleted record changes nothing
/// and reports a warning.
pub fn delete<R: SoftDeletable, S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<R>> {
    let current: R = store.get_record(id)?;
    if !current.is_active() {
        let label = current.label();
        return Ok(CmdResult::single(
            current,
            CmdMessage::warning(format!("Already deleted: {}", label)),
        ));
    }
    let deleted = R::from_row(soft_delete_row(store, R::COLLECTION, id)?)?;
    tracing::info!(collection = %R::COLLECTION, %id, "soft-deleted");
    let message = CmdMessage::success(format!("Deleted: {}", deleted.label()));
    Ok(CmdResult::single(deleted, message))
}

/// Brings a soft-deleted record back.
pub fn restore<R: SoftDeletable, S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<R>> {
    let current: R = store.get_record(id)?;
    if current.is_active() {
        let label = current.label();
        return Ok(CmdResult::single(
            current,
            CmdMessage::warning(format!("Not deleted: {}", label)),
        ));
    }
    let restored = R::from_row(restore_row(store, R::COLLECTION, id)?)?;
    tracing::info!(collection = %R::COLLECTION, %id, "restored");
    let message = CmdMessage::success(format!("Restored: {}", restored.label()));
    Ok(CmdResult::single(restored, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Property;
    use crate::store::memory::fixtures::StoreFixture;

    fn titles(store: &impl DataStore, status: RecordStatusFilter) -> Vec<String> {
        store
            .list_records::<Property>(&status.apply(Filter::new().order_asc("title")))
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect()
    }

    #[test]
    fn delete_then_restore_moves_between_sets() {
        let f = StoreFixture::new()
            .with_property("Villa Cocody", "vente", "maison", 9e7, "Cocody")
            .with_property("Studio Plateau", "location", "appartement", 2.5e5, "Plateau");
        let id = f.id_of(Collection::Properties, "title", "Villa Cocody");
        let mut store = f.store;

        let result = delete::<Property, _>(&mut store, &id).unwrap();
        assert!(result.records[0].deleted_at.is_some());
        assert_eq!(titles(&store, RecordStatusFilter::Active), ["Studio Plateau"]);
        assert_eq!(titles(&store, RecordStatusFilter::Deleted), ["Villa Cocody"]);

        restore::<Property, _>(&mut store, &id).unwrap();
        assert_eq!(
            titles(&store, RecordStatusFilter::Active),
            ["Studio Plateau", "Villa Cocody"]
        );
        assert!(titles(&store, RecordStatusFilter::Deleted).is_empty());
        assert_eq!(titles(&store, RecordStatusFilter::All).len(), 2);
    }

    #[test]
    fn repeated_delete_is_a_warning_without_write() {
        let f = StoreFixture::new().with_deleted_property("Terrain Bingerville");
        let id = f.id_of(Collection::Properties, "title", "Terrain Bingerville");
        let mut store = f.store;
        let writes = store.write_count();

        let result = delete::<Property, _>(&mut store, &id).unwrap();
        assert!(result.has_warning());
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn restoring_active_record_is_a_warning() {
        let f = StoreFixture::new().with_property("Villa", "vente", "maison", 1.0, "Cocody");
        let id = f.id_of(Collection::Properties, "title", "Villa");
        let mut store = f.store;
        assert!(restore::<Property, _>(&mut store, &id).unwrap().has_warning());
    }

    #[test]
    fn appointments_cannot_be_soft_deleted() {
        let f = StoreFixture::new().with_appointment("Awa Traoré", "pending");
        let id = f.id_of(Collection::Appointments, "full_name", "Awa Traoré");
        let mut store = f.store;
        let err = soft_delete_row(&mut store, Collection::Appointments, &id).unwrap_err();
        assert!(matches!(err, CabinetError::Precondition(_)));
    }

    #[test]
    fn failed_write_keeps_record_active() {
        let f = StoreFixture::new().with_property("Villa", "vente", "maison", 1.0, "Cocody");
        let id = f.id_of(Collection::Properties, "title", "Villa");
        let mut store = f.store;
        store.set_simulate_write_error(true);
        assert!(delete::<Property, _>(&mut store, &id).unwrap_err().is_retryable());
        store.set_simulate_write_error(false);
        assert_eq!(titles(&store, RecordStatusFilter::Active), ["Villa"]);
    }
}
