use crate::commands::records::{self, RecordStatusFilter};
use crate::commands::{optional_text, property_types, CmdMessage, CmdResult};
use crate::error::{CabinetError, Result};
use crate::model::{ListingType, Property, Row};
use crate::store::{Attachment, DataStore, FileStorage, Filter, RecordStore, MEDIA_BUCKET};
use crate::validation::Validator;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

const IMAGE_PREFIX: &str = "properties/";
const VIDEO_PREFIX: &str = "properties/videos/";

#[derive(Debug, Clone, PartialEq)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub listing_type: ListingType,
    /// A name from the property type catalog.
    pub property_type: String,
    pub price: f64,
    pub location: String,
    pub surface: f64,
    pub rooms: Option<u32>,
    pub architecture_style: Option<String>,
}

/// Columns to change; `None` leaves a column alone and `Some(None)` clears a
/// nullable one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub listing_type: Option<ListingType>,
    pub property_type: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub surface: Option<f64>,
    pub rooms: Option<Option<u32>>,
    pub architecture_style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    pub listing_type: Option<ListingType>,
    /// Case-insensitive type name.
    pub property_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    pub status: RecordStatusFilter,
}

impl PropertyFilter {
    pub fn matches(&self, p: &Property) -> bool {
        self.listing_type.map_or(true, |t| p.listing_type == t)
            && self
                .property_type
                .as_deref()
                .map_or(true, |t| p.property_type.to_lowercase() == t.trim().to_lowercase())
            && self.min_price.map_or(true, |min| p.price >= min)
            && self.max_price.map_or(true, |max| p.price <= max)
            && self
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map_or(true, |l| p.location.to_lowercase().contains(&l.to_lowercase()))
    }
}

fn check_price(v: &mut Validator, price: f64) {
    v.check(price.is_finite() && price >= 0.0, "price", "price must be zero or more");
}

fn check_surface(v: &mut Validator, surface: f64) {
    v.check(surface.is_finite() && surface > 0.0, "surface", "surface must be greater than zero");
}

/// Checks the form and returns the catalog spelling of its type.
fn validate_new<S: DataStore>(store: &S, input: &NewProperty) -> Result<String> {
    let known = property_types::names(store)?;
    let mut v = Validator::new();
    v.required("title", &input.title);
    v.required("description", &input.description);
    let property_type = property_types::check(&mut v, &known, &input.property_type);
    v.required("location", &input.location);
    check_price(&mut v, input.price);
    check_surface(&mut v, input.surface);
    v.finish()?;
    property_type.ok_or_else(|| CabinetError::InvalidState("property type not checked".into()))
}

/// Checks the patch and returns the catalog spelling of a changed type.
fn validate_patch<S: DataStore>(store: &S, patch: &PropertyPatch) -> Result<Option<String>> {
    let mut v = Validator::new();
    let property_type = match &patch.property_type {
        Some(name) => property_types::check(&mut v, &property_types::names(store)?, name),
        None => None,
    };
    for (field, value) in [
        ("title", &patch.title),
        ("description", &patch.description),
        ("location", &patch.location),
    ] {
        if let Some(value) = value {
            v.required(field, value);
        }
    }
    if let Some(price) = patch.price {
        check_price(&mut v, price);
    }
    if let Some(surface) = patch.surface {
        check_surface(&mut v, surface);
    }
    v.finish()?;
    Ok(property_type)
}

/// Uploads each file under `prefix` and returns the public URLs.
///
/// Files already uploaded when a later one fails stay in storage; they are
/// named in a warning.
fn upload_all<S: FileStorage>(store: &mut S, files: &[Attachment], prefix: &str) -> Result<Vec<String>> {
    let mut urls = Vec::with_capacity(files.len());
    let mut stored: Vec<String> = Vec::new();
    for file in files {
        let path = file.storage_path(prefix);
        match store.upload(MEDIA_BUCKET, &path, &file.bytes) {
            Ok(url) => {
                urls.push(url);
                stored.push(path);
            }
            Err(e) => {
                if !stored.is_empty() {
                    tracing::warn!(bucket = MEDIA_BUCKET, paths = ?stored, "upload failed midway; earlier files left in storage");
                }
                return Err(e);
            }
        }
    }
    Ok(urls)
}

pub fn create<S: DataStore + FileStorage>(
    store: &mut S,
    input: NewProperty,
    images: &[Attachment],
    videos: &[Attachment],
) -> Result<CmdResult<Property>> {
    let property_type = validate_new(store, &input)?;

    let image_urls = upload_all(store, images, IMAGE_PREFIX)?;
    let video_urls = upload_all(store, videos, VIDEO_PREFIX)?;

    let property = Property {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        listing_type: input.listing_type,
        property_type,
        price: input.price,
        location: input.location.trim().to_string(),
        surface: input.surface,
        rooms: input.rooms,
        architecture_style: optional_text(input.architecture_style.as_deref()),
        images: image_urls,
        videos: video_urls,
        deleted_at: None,
    };

    let created = store.insert_record(&property).inspect_err(|_| {
        let orphans: Vec<&String> = property.images.iter().chain(&property.videos).collect();
        if !orphans.is_empty() {
            tracing::warn!(urls = ?orphans, "property insert failed; uploaded media left in storage");
        }
    })?;
    tracing::info!(id = %created.id, title = %created.title, "property created");
    let message = CmdMessage::success(format!("Property added: {}", created.title));
    Ok(CmdResult::single(created, message))
}

/// Applies `patch` and appends any newly uploaded media.
pub fn update<S: DataStore + FileStorage>(
    store: &mut S,
    id: &Uuid,
    patch: PropertyPatch,
    new_images: &[Attachment],
    new_videos: &[Attachment],
) -> Result<CmdResult<Property>> {
    let property_type = validate_patch(store, &patch)?;
    let current: Property = store.get_record(id)?;

    let mut row = Row::new();
    let mut set = |column: &str, value: Value| {
        row.insert(column.to_string(), value);
    };
    if let Some(title) = patch.title {
        set("title", json!(title.trim()));
    }
    if let Some(description) = patch.description {
        set("description", json!(description.trim()));
    }
    if let Some(t) = patch.listing_type {
        set("type", json!(t));
    }
    if let Some(name) = property_type {
        set("property_type", json!(name));
    }
    if let Some(price) = patch.price {
        set("price", json!(price));
    }
    if let Some(location) = patch.location {
        set("location", json!(location.trim()));
    }
    if let Some(surface) = patch.surface {
        set("surface", json!(surface));
    }
    if let Some(rooms) = patch.rooms {
        set("rooms", json!(rooms));
    }
    if let Some(style) = patch.architecture_style {
        set("architecture_style", json!(optional_text(Some(style.as_str()))));
    }

    if !new_images.is_empty() {
        let mut images = current.images.clone();
        images.extend(upload_all(store, new_images, IMAGE_PREFIX)?);
        row.insert("images".to_string(), json!(images));
    }
    if !new_videos.is_empty() {
        let mut videos = current.videos.clone();
        videos.extend(upload_all(store, new_videos, VIDEO_PREFIX)?);
        row.insert("videos".to_string(), json!(videos));
    }

    if row.is_empty() {
        return Ok(CmdResult::single(current, CmdMessage::info("Nothing to update")));
    }

    let updated: Property = store.update_record(id, row)?;
    tracing::info!(%id, "property updated");
    let message = CmdMessage::success(format!("Property updated: {}", updated.title));
    Ok(CmdResult::single(updated, message))
}

pub fn get<S: DataStore>(store: &S, id: &Uuid) -> Result<Property> {
    store.get_record(id)
}

/// Listings newest first, narrowed by `filter`.
pub fn list<S: DataStore>(store: &S, filter: &PropertyFilter) -> Result<CmdResult<Property>> {
    let query = filter.status.apply(Filter::new().order_desc("created_at"));
    let properties: Vec<Property> = store
        .list_records::<Property>(&query)?
        .into_iter()
        .filter(|p| filter.matches(p))
        .collect();
    Ok(CmdResult::with_records(properties))
}

pub fn delete<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<Property>> {
    records::delete(store, id)
}

pub fn restore<S: DataStore>(store: &mut S, id: &Uuid) -> Result<CmdResult<Property>> {
    records::restore(store, id)
}
