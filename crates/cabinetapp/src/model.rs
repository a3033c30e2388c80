//! # Data Model
//!
//! Every record lives in a named [`Collection`] owned by the external store.
//! Stores speak in untyped [`Row`]s (JSON objects), the same shape the
//! backend's REST API returns; typed records convert to and from rows through
//! the [`Record`] trait.
//!
//! ## Identity and timestamps
//!
//! Each row carries `id` (UUID) and `created_at`. Both are generated on the
//! client when a record is built, and stores fill them in when a raw row
//! arrives without them.
//!
//! ## Soft delete
//!
//! Collections flagged by [`Collection::soft_deletable`] carry a nullable
//! `deleted_at`. Deleting sets it to the current time; restoring clears it.
//! A row is *active* when `deleted_at` is null.
//!
//! ## Content documents
//!
//! `page_contents.content` is an arbitrary JSON value with no schema. It is
//! handled by the [`crate::content`] editor and always written back whole.

use crate::error::{CabinetError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One stored row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

pub const ID: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const DELETED_AT: &str = "deleted_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    PageContents,
    Properties,
    PropertyTypes,
    Appointments,
    Services,
    SocialLinks,
    Menus,
    SiteVisits,
    PropertySearchStats,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::PageContents,
        Collection::Properties,
        Collection::PropertyTypes,
        Collection::Appointments,
        Collection::Services,
        Collection::SocialLinks,
        Collection::Menus,
        Collection::SiteVisits,
        Collection::PropertySearchStats,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::PageContents => "page_contents",
            Collection::Properties => "properties",
            Collection::PropertyTypes => "property_types",
            Collection::Appointments => "appointments",
            Collection::Services => "services",
            Collection::SocialLinks => "social_links",
            Collection::Menus => "menus",
            Collection::SiteVisits => "site_visits",
            Collection::PropertySearchStats => "property_search_stats",
        }
    }

    pub fn soft_deletable(&self) -> bool {
        !matches!(
            self,
            Collection::Appointments | Collection::SiteVisits | Collection::PropertySearchStats
        )
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for Collection {
    type Err = CabinetError;

    fn from_str(s: &str) -> Result<Self> {
        Collection::ALL
            .into_iter()
            .find(|c| c.table_name() == s)
            .ok_or_else(|| CabinetError::NotFound(format!("collection '{}'", s)))
    }
}

/// A typed view over the rows of one collection.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;

    fn to_row(&self) -> Result<Row> {
        into_row(serde_json::to_value(self)?)
    }

    fn from_row(row: Row) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(row))?)
    }
}

pub trait SoftDeletable: Record {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Short human name used in messages.
    fn label(&self) -> String;

    fn is_active(&self) -> bool {
        self.deleted_at().is_none()
    }
}

/// Converts a serialized struct into a row.
pub fn into_row(value: Value) -> Result<Row> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CabinetError::persistence(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Reads the `id` column of a row.
pub fn row_id(row: &Row) -> Option<Uuid> {
    row.get(ID)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, String> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "'{}' is not one of: {}",
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

// --- Properties ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Vente,
    Location,
}

string_enum!(ListingType { Vente => "vente", Location => "location" });

/// An entry of the admin-managed catalog of property types ("maison",
/// "terrain", ...). Listings store the type by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyType {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for PropertyType {
    const COLLECTION: Collection = Collection::PropertyTypes;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl SoftDeletable for PropertyType {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub property_type: String,
    pub price: f64,
    pub location: String,
    pub surface: f64,
    pub rooms: Option<u32>,
    pub architecture_style: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for Property {
    const COLLECTION: Collection = Collection::Properties;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl SoftDeletable for Property {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

/// The property fields shown next to an appointment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySummary {
    pub title: String,
    pub location: String,
    pub listing_type: ListingType,
}

impl From<&Property> for PropertySummary {
    fn from(p: &Property) -> Self {
        Self {
            title: p.title.clone(),
            location: p.location.clone(),
            listing_type: p.listing_type,
        }
    }
}

// --- Appointments ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

string_enum!(AppointmentStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    #[default]
    Particulier,
    Professionnel,
}

string_enum!(ClientType { Particulier => "particulier", Professionnel => "professionnel" });

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    #[default]
    Presentiel,
    EnLigne,
}

string_enum!(ConsultationType { Presentiel => "presentiel", EnLigne => "en_ligne" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlinePlatform {
    Whatsapp,
    Zoom,
    GoogleMeet,
}

string_enum!(OnlinePlatform {
    Whatsapp => "whatsapp",
    Zoom => "zoom",
    GoogleMeet => "google_meet",
});

/// Either a consultation booking or a property visit request; the two share
/// one table and differ in which optional columns are filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub client_type: Option<ClientType>,
    pub consultation_type: Option<ConsultationType>,
    pub online_platform: Option<OnlinePlatform>,
    pub consultation_object: Option<String>,
    pub consultation_summary: Option<String>,
    pub desired_date: NaiveDate,
    pub appointment_time: Option<String>,
    pub payment_receipt_url: Option<String>,
    pub property_id: Option<Uuid>,
    pub message: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
}

impl Record for Appointment {
    const COLLECTION: Collection = Collection::Appointments;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Appointment {
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().filter(|s| !s.trim().is_empty()) {
            return full.to_string();
        }
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// --- Services ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    /// Bullet lines shown under the title.
    #[serde(default)]
    pub description: Vec<String>,
    pub icon_name: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for Service {
    const COLLECTION: Collection = Collection::Services;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl SoftDeletable for Service {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

// --- Social links ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub url: String,
    pub icon_name: String,
    pub order_index: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for SocialLink {
    const COLLECTION: Collection = Collection::SocialLinks;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl SoftDeletable for SocialLink {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

// --- Menus ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub order_index: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for MenuItem {
    const COLLECTION: Collection = Collection::Menus;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl SoftDeletable for MenuItem {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

// --- Page contents ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub page_name: String,
    pub section_name: String,
    #[serde(default)]
    pub content: Value,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for PageContent {
    const COLLECTION: Collection = Collection::PageContents;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl SoftDeletable for PageContent {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn label(&self) -> String {
        format!("{}/{}", self.page_name, self.section_name)
    }
}

// --- Statistics ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteVisit {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub visited_at: DateTime<Utc>,
    pub page: Option<String>,
}

impl Record for SiteVisit {
    const COLLECTION: Collection = Collection::SiteVisits;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySearchStat {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub property_id: Option<Uuid>,
    pub search_date: DateTime<Utc>,
    pub search_type: String,
    pub architecture_preference: Option<String>,
    pub location_preference: Option<String>,
    pub price_range_min: Option<f64>,
    pub price_range_max: Option<f64>,
}

impl Record for PropertySearchStat {
    const COLLECTION: Collection = Collection::PropertySearchStats;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_names_round_trip() {
        for c in Collection::ALL {
            assert_eq!(c.table_name().parse::<Collection>().unwrap(), c);
        }
        assert!("pads".parse::<Collection>().is_err());
    }

    #[test]
    fn status_collections_are_not_soft_deletable() {
        assert!(!Collection::Appointments.soft_deletable());
        assert!(!Collection::SiteVisits.soft_deletable());
        assert!(Collection::Properties.soft_deletable());
        assert!(Collection::PageContents.soft_deletable());
    }

    #[test]
    fn property_uses_type_column() {
        let row = into_row(json!({
            "id": "6f1c8a4e-2b7d-4c7e-9a51-0d3f5e6a7b80",
            "created_at": "2024-03-01T10:00:00.123456+00:00",
            "title": "Villa Cocody",
            "description": "4 pièces",
            "type": "vente",
            "property_type": "maison",
            "price": 120000000,
            "location": "Cocody, Abidjan",
            "surface": 350.5,
            "deleted_at": null
        }))
        .unwrap();

        let property = Property::from_row(row).unwrap();
        assert_eq!(property.listing_type, ListingType::Vente);
        assert_eq!(property.property_type, "maison");
        assert!(property.images.is_empty());
        assert!(property.is_active());

        let back = property.to_row().unwrap();
        assert_eq!(back["type"], json!("vente"));
        assert!(!back.contains_key("listing_type"));
    }

    #[test]
    fn property_type_outside_catalog_still_loads() {
        let row = into_row(json!({
            "id": Uuid::new_v4(),
            "created_at": "2024-03-01T10:00:00Z",
            "title": "Villa Assinie",
            "description": "Pieds dans l'eau",
            "type": "vente",
            "property_type": "villa",
            "price": 250000000,
            "location": "Assinie",
            "surface": 600,
            "deleted_at": null
        }))
        .unwrap();
        assert_eq!(Property::from_row(row).unwrap().property_type, "villa");
    }

    #[test]
    fn appointment_status_defaults_to_pending() {
        let row = into_row(json!({
            "id": Uuid::new_v4(),
            "created_at": "2024-03-01T10:00:00Z",
            "full_name": "Awa Traoré",
            "desired_date": "2024-04-02",
            "property_id": Uuid::new_v4(),
        }))
        .unwrap();
        let appt = Appointment::from_row(row).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.display_name(), "Awa Traoré");
    }

    #[test]
    fn display_name_falls_back_to_parts() {
        let row = into_row(json!({
            "id": Uuid::new_v4(),
            "created_at": "2024-03-01T10:00:00Z",
            "first_name": "Awa",
            "last_name": "Traoré",
            "desired_date": "2024-04-02",
        }))
        .unwrap();
        assert_eq!(Appointment::from_row(row).unwrap().display_name(), "Awa Traoré");
    }

    #[test]
    fn enum_text_forms() {
        assert_eq!(ConsultationType::EnLigne.as_str(), "en_ligne");
        assert_eq!("google_meet".parse::<OnlinePlatform>().unwrap(), OnlinePlatform::GoogleMeet);
        let err = "skype".parse::<OnlinePlatform>().unwrap_err();
        assert!(err.contains("whatsapp, zoom, google_meet"));
        assert_eq!(
            serde_json::to_value(ConsultationType::EnLigne).unwrap(),
            json!("en_ligne")
        );
    }

    #[test]
    fn into_row_rejects_non_objects() {
        assert!(into_row(json!([1, 2])).is_err());
    }
}
