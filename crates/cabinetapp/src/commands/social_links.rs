//! Social network links shown in the site footer.
//!
//! Links are ordered by a 1-based `order_index`. New links go to the end;
//! moving a link swaps its index with the neighbour on that side.

use crate::commands::records::{self, RecordStatusFilter};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CabinetError, Result};
use crate::model::{Row, SocialLink};
use crate::store::{DataStore, Filter, RecordStore};
use crate::validation::Validator;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SocialLinkInput {
    pub name: String,
    pub url: String,
    pub icon_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SocialLinkPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub icon_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

fn ordered<S: DataStore>(store: &S) -> Result<Vec<SocialLink>> {
    store.list_records(&Filter::new().active().order_asc("order_index"))
}

pub fn list<S: DataStore>(store: &S, status: RecordStatusFilter) -> Result<CmdResult<SocialLink>> {
    let filter = status.apply(Filter::new().order_asc("order_index"));
    Ok(CmdResult::with_records(store.list_records(&filter)?))
}

/// Appends a link after the active ones.
pub fn add<S: DataStore>(store: &mut S, input: SocialLinkInput) -> Result<CmdResult<SocialLink>> {
    let mut v = Validator::new();
    v.required("name", &input.name);
    v.http_url("url", input.url.trim());
    v.required("icon_name", &input.icon_name);
    v.finish()?;

    let count = ordered(store)?.len() as i64;
    let link = SocialLink {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        name: input.name.trim().to_string(),
        url: input.url.trim().to_string(),
        icon_name: input.icon_name.trim().to_string(),
        order_index: count + 1,
        deleted_at: None,
    };
    let created = store.insert_record(&link)?;
    tracing::info!(id = %created.id, name = %created.name, order = created.order_index, "social link added");
    let message = CmdMessage::success(format!("Social link added: {}", created.name));
    Ok(CmdResult::single(created, message))
}

pub fn update<S: DataStore>(
    store: &mut S,
    id: &Uuid,
    patch: SocialLinkPatch,
) -> Result<CmdResult<SocialLink>> {
    let mut v = Validator::new();
    if let Some(name) = &patch.name {
        v.required("name", name);
    }
    if let Some(url) = &patch.url {
        v.http_url("url", url.trim());
    }
    if let Some(icon) = &patch.icon_name {
        v.required("icon_name", icon);
    }
    v.finish()?;

    let mut row = Row::new();
    for (column, value) in [
        ("name", patch.name),
        ("url", patch.url),
        ("icon_name", patch.icon_name),
    ] {
        if let Some(value) = value {
            row.insert(column.to_string(), json!(value.trim()));
        }
    }
    if row.is_empty() {
        let current: SocialLink = store.get_record(id)?;
        return Ok(CmdResult::single(current, CmdMessage::info("Nothing to update")));
    }

    let updated: SocialLink = store.update_record(id, row)?;
    tracing::info!(%id, "social link updated");
    let message = CmdMessage::success(format!("Social link updated: {}", updated.name));
    Ok(CmdResult::single(updated, message))
}

/// Swaps the link with its neighbour. At either end nothing changes.
///
/// The two index writes are separate calls; if the second fails the first
/// stays applied and both links share an index until the next move.
pub fn move_link<S: DataStore>(
    store: &mut S,
    id: &Uuid,
    direction: Direction,
) -> Result<CmdResult<SocialLink>> {
    let links = ordered(store)?;
    let pos = links
        .iter()
        .position(|l| l.id == *id)
        .ok_or_else(|| CabinetError::NotFound(format!("active social link {}", id)))?;

    let neighbour = match direction {
        Direction::Up => pos.checked_sub(1),
        Direction::Down => Some(pos + 1).filter(|n| *n < links.len()),
    };
    let Some(neighbour) = neighbour else {
        let link = links[pos].clone();
        let edge = if direction == Direction::Up { "first" } else { "last" };
        let message = CmdMessage::info(format!("{} is already {}", link.name, edge));
        return Ok(CmdResult::single(link, message));
    };

    let link = &links[pos];
    let other = &links[neighbour];
    let (mine, theirs) = (link.order_index, other.order_index);

    let mut patch = Row::new();
    patch.insert("order_index".into(), json!(theirs));
    let moved: SocialLink = store.update_record(&link.id, patch)?;
    let mut patch = Row::new();
    patch.insert("order_index".into(), json!(mine));
    store.update_record::<SocialLink>(&other.id, patch)?;

    tracing::info!(%id, from = mine, to = theirs, "social link moved");
    let message = CmdMessage::success(format!("Moved {} to position {}", moved.name, theirs));
    Ok(CmdResult::single(moved, message))
}

pub fn move_up<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<SocialLink>> {
    move_link(store, id, Direction::Up)
}

pub fn move_down<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<SocialLink>> {
    move_link(store, id, Direction::Down)
}

pub fn delete<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<SocialLink>> {
    records::delete(store, id)
}

pub fn restore<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<SocialLink>> {
    records::restore(store, id)
}
