//! Consultation bookings, property visit requests and the admin status
//! workflow.
//!
//! A booking is validated in full before anything leaves the process. Only
//! then is the payment receipt uploaded, and only after the upload succeeds
//! is the appointment row written with the receipt's public URL. If that
//! insert fails the receipt stays in storage; the path is logged so it can be
//! cleaned up by hand.

use crate::commands::{optional_text, CmdMessage, CmdResult};
use crate::error::{CabinetError, Result};
use crate::model::{
    Appointment, AppointmentStatus, ClientType, ConsultationType, OnlinePlatform, Property,
    PropertySummary,
};
use crate::store::{Attachment, DataStore, FileStorage, Filter, RecordStore, RECEIPTS_BUCKET};
use crate::validation::Validator;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

/// Bookable hours, on the hour from 9:00 to 17:00.
pub const TIME_SLOTS: [&str; 9] = [
    "9:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub client_type: ClientType,
    pub consultation_type: ConsultationType,
    pub online_platform: Option<OnlinePlatform>,
    pub consultation_object: String,
    pub consultation_summary: String,
    pub desired_date: Option<NaiveDate>,
    pub appointment_time: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitRequest {
    pub property_id: Uuid,
    pub desired_date: Option<NaiveDate>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub message: Option<String>,
}

/// An appointment with the listing it concerns, when there is one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentEntry {
    pub appointment: Appointment,
    pub property: Option<PropertySummary>,
}

/// The payment receipt as it reached the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Receipt<'a> {
    Missing,
    /// The client picked a file that could not be read.
    Unreadable(String),
    File(&'a Attachment),
}

/// Accepts `9:00` and `09:00` for the same slot.
fn normalize_slot(time: &str) -> Option<&'static str> {
    let time = time.trim();
    let time = time.strip_prefix('0').filter(|t| t.len() == 4).unwrap_or(time);
    TIME_SLOTS.iter().copied().find(|slot| *slot == time)
}

/// The parts of a request that are optional until validated.
struct Checked<'a> {
    receipt: &'a Attachment,
    desired_date: NaiveDate,
    slot: &'static str,
}

fn validate_request<'a>(
    request: &AppointmentRequest,
    receipt: &Receipt<'a>,
    today: NaiveDate,
) -> Result<Checked<'a>> {
    let mut v = Validator::new();
    v.min_chars("first_name", &request.first_name, 2, "first name must have at least 2 characters");
    v.min_chars("last_name", &request.last_name, 2, "last name must have at least 2 characters");
    v.email("email", &request.email);
    v.min_chars("phone", &request.phone, 8, "phone number must have at least 8 characters");
    v.min_chars(
        "consultation_object",
        &request.consultation_object,
        5,
        "consultation object must have at least 5 characters",
    );
    v.min_chars(
        "consultation_summary",
        &request.consultation_summary,
        10,
        "consultation summary must have at least 10 characters",
    );
    match request.desired_date {
        None => v.fail("desired_date", "a date is required"),
        Some(date) => {
            v.check(date >= today, "desired_date", "the date cannot be in the past");
        }
    }
    let slot = normalize_slot(&request.appointment_time);
    if slot.is_none() {
        v.fail(
            "appointment_time",
            format!("choose one of: {}", TIME_SLOTS.join(", ")),
        );
    }
    let file = match receipt {
        Receipt::Missing => {
            v.fail("receipt", "a payment receipt is required");
            None
        }
        Receipt::Unreadable(reason) => {
            v.fail("receipt", format!("the payment receipt cannot be read: {}", reason));
            None
        }
        Receipt::File(file) => {
            v.check(!file.bytes.is_empty(), "receipt", "the payment receipt is empty");
            Some(*file)
        }
    };
    v.finish()?;
    match (file, request.desired_date, slot) {
        (Some(receipt), Some(desired_date), Some(slot)) => Ok(Checked {
            receipt,
            desired_date,
            slot,
        }),
        _ => Err(CabinetError::InvalidState("incomplete appointment request".into())),
    }
}

/// Books a consultation: validate, upload the receipt, insert the row.
pub fn submit<S: DataStore + FileStorage>(
    store: &mut S,
    request: AppointmentRequest,
    receipt: Receipt<'_>,
    today: NaiveDate,
) -> Result<CmdResult<Appointment>> {
    let Checked {
        receipt,
        desired_date,
        slot,
    } = validate_request(&request, &receipt, today)?;

    let path = receipt.storage_path("");
    let receipt_url = store.upload(RECEIPTS_BUCKET, &path, &receipt.bytes)?;
    tracing::debug!(bucket = RECEIPTS_BUCKET, %path, "receipt uploaded");

    let first_name = request.first_name.trim().to_string();
    let last_name = request.last_name.trim().to_string();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        full_name: Some(format!("{} {}", first_name, last_name)),
        first_name: Some(first_name),
        last_name: Some(last_name),
        email: Some(request.email.trim().to_string()),
        phone: Some(request.phone.trim().to_string()),
        client_type: Some(request.client_type),
        consultation_type: Some(request.consultation_type),
        online_platform: request.online_platform,
        consultation_object: Some(request.consultation_object.trim().to_string()),
        consultation_summary: Some(request.consultation_summary.trim().to_string()),
        desired_date,
        appointment_time: Some(slot.to_string()),
        payment_receipt_url: Some(receipt_url),
        property_id: None,
        message: None,
        status: AppointmentStatus::Pending,
    };

    let created = store.insert_record(&appointment).inspect_err(|e| {
        tracing::warn!(
            bucket = RECEIPTS_BUCKET,
            %path,
            "appointment insert failed ({}); uploaded receipt left in storage",
            e
        );
    })?;
    tracing::info!(id = %created.id, date = %created.desired_date, "appointment booked");
    Ok(CmdResult::single(
        created,
        CmdMessage::success("Your appointment request has been sent"),
    ))
}

/// Asks for a visit of one listing.
pub fn request_visit<S: DataStore>(
    store: &mut S,
    request: VisitRequest,
) -> Result<CmdResult<Appointment>> {
    let mut v = Validator::new();
    if request.desired_date.is_none() {
        v.fail("desired_date", "a date is required");
    }
    v.required("full_name", &request.full_name);
    v.required("email", &request.email);
    v.required("phone", &request.phone);
    v.finish()?;
    let desired_date = request
        .desired_date
        .ok_or_else(|| CabinetError::InvalidState("visit request without a date".into()))?;

    let property: Property = store.get_record(&request.property_id)?;

    let appointment = Appointment {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        first_name: None,
        last_name: None,
        full_name: Some(request.full_name.trim().to_string()),
        email: Some(request.email.trim().to_string()),
        phone: Some(request.phone.trim().to_string()),
        client_type: None,
        consultation_type: None,
        online_platform: None,
        consultation_object: None,
        consultation_summary: None,
        desired_date,
        appointment_time: None,
        payment_receipt_url: None,
        property_id: Some(property.id),
        message: optional_text(request.message.as_deref()),
        status: AppointmentStatus::Pending,
    };
    let created = store.insert_record(&appointment)?;
    tracing::info!(id = %created.id, property = %property.id, "visit requested");
    Ok(CmdResult::single(
        created,
        CmdMessage::success(format!("Visit request sent for {}", property.title)),
    ))
}

/// All appointments, newest first, each with its listing summary.
pub fn list<S: DataStore>(store: &S) -> Result<Vec<AppointmentEntry>> {
    let appointments: Vec<Appointment> =
        store.list_records(&Filter::new().order_desc("created_at"))?;

    let linked = appointments.iter().any(|a| a.property_id.is_some());
    let properties: HashMap<Uuid, PropertySummary> = if linked {
        store
            .list_records::<Property>(&Filter::new())?
            .iter()
            .map(|p| (p.id, PropertySummary::from(p)))
            .collect()
    } else {
        HashMap::new()
    };

    Ok(appointments
        .into_iter()
        .map(|appointment| AppointmentEntry {
            property: appointment
                .property_id
                .and_then(|id| properties.get(&id).cloned()),
            appointment,
        })
        .collect())
}

pub fn get<S: DataStore>(store: &S, id: &Uuid) -> Result<Appointment> {
    store.get_record(id)
}

/// Approves or rejects. Setting the status an appointment already has is a
/// no-op with a warning.
pub fn set_status<S: DataStore>(
    store: &mut S,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<CmdResult<Appointment>> {
    let current: Appointment = store.get_record(id)?;
    if current.status == status {
        let name = current.display_name();
        return Ok(CmdResult::single(
            current,
            CmdMessage::warning(format!("Appointment for {} is already {}", name, status)),
        ));
    }

    let mut patch = crate::model::Row::new();
    patch.insert("status".to_string(), json!(status));
    let updated: Appointment = store.update_record(id, patch)?;
    tracing::info!(%id, from = %current.status, to = %status, "appointment status changed");
    let message = CmdMessage::success(format!(
        "Appointment for {} {}",
        updated.display_name(),
        status
    ));
    Ok(CmdResult::single(updated, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Collection;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 10).unwrap()
    }

    fn request() -> AppointmentRequest {
        AppointmentRequest {
            first_name: "Awa".into(),
            last_name: "Traoré".into(),
            email: "awa@example.ci".into(),
            phone: "0707843777".into(),
            client_type: ClientType::Professionnel,
            consultation_type: ConsultationType::EnLigne,
            online_platform: Some(OnlinePlatform::Zoom),
            consultation_object: "Bail commercial".into(),
            consultation_summary: "Litige avec le bailleur sur le renouvellement.".into(),
            desired_date: NaiveDate::from_ymd_opt(2030, 1, 15),
            appointment_time: "09:00".into(),
        }
    }

    fn receipt() -> Attachment {
        Attachment::new("recu.png", vec![0x89, 0x50, 0x4e, 0x47])
    }

    #[test]
    fn submit_uploads_then_inserts() {
        let mut store = InMemoryStore::new();
        let result = submit(&mut store, request(), Receipt::File(&receipt()), today()).unwrap();
        let appt = &result.records[0];

        assert_eq!(appt.full_name.as_deref(), Some("Awa Traoré"));
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.appointment_time.as_deref(), Some("9:00"));
        let url = appt.payment_receipt_url.as_deref().unwrap();
        assert!(url.starts_with("memory://payment_receipts/") && url.ends_with(".png"));
        assert_eq!(store.object_count(RECEIPTS_BUCKET), 1);

        let row = store.get(Collection::Appointments, &appt.id).unwrap();
        assert_eq!(row["desired_date"], json!("2030-01-15"));
        assert_eq!(row["consultation_type"], json!("en_ligne"));
    }

    #[test]
    fn missing_receipt_makes_no_calls() {
        let mut store = InMemoryStore::new();
        let err = submit(&mut store, request(), Receipt::Missing, today()).unwrap_err();

        let CabinetError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 1);
        assert!(errors.has("receipt"));
        assert_eq!(store.upload_count(), 0);
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.row_count(Collection::Appointments), 0);
    }

    #[test]
    fn unreadable_receipt_is_a_field_error() {
        let mut store = InMemoryStore::new();
        let bad = AppointmentRequest {
            phone: "0707".into(),
            ..request()
        };
        let unreadable = Receipt::Unreadable("No such file or directory".into());
        let err = submit(&mut store, bad, unreadable, today()).unwrap_err();

        assert!(!err.is_persistence());
        assert!(!err.is_retryable());
        let CabinetError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.has("phone"));
        assert!(errors.message_for("receipt").unwrap().contains("cannot be read"));
        assert_eq!(store.upload_count(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn every_field_error_is_reported() {
        let mut store = InMemoryStore::new();
        let bad = AppointmentRequest {
            first_name: "A".into(),
            last_name: "".into(),
            email: "awa@".into(),
            phone: "0707".into(),
            consultation_object: "Bail".into(),
            consultation_summary: "Court".into(),
            desired_date: NaiveDate::from_ymd_opt(2030, 1, 9),
            appointment_time: "18:00".into(),
            ..request()
        };
        let err = submit(&mut store, bad, Receipt::File(&receipt()), today()).unwrap_err();
        let CabinetError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        for field in [
            "first_name",
            "last_name",
            "email",
            "phone",
            "consultation_object",
            "consultation_summary",
            "desired_date",
            "appointment_time",
        ] {
            assert!(errors.has(field), "missing error for {field}");
        }
        assert_eq!(store.upload_count(), 0);
    }

    #[test]
    fn today_is_bookable() {
        let mut store = InMemoryStore::new();
        let req = AppointmentRequest {
            desired_date: Some(today()),
            appointment_time: "17:00".into(),
            ..request()
        };
        assert!(submit(&mut store, req, Receipt::File(&receipt()), today()).is_ok());
    }

    #[test]
    fn insert_failure_leaves_receipt_in_storage() {
        let mut store = InMemoryStore::new();
        store.set_simulate_write_error(true);
        let err = submit(&mut store, request(), Receipt::File(&receipt()), today()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.object_count(RECEIPTS_BUCKET), 1);
        assert_eq!(store.row_count(Collection::Appointments), 0);
    }

    #[test]
    fn upload_failure_skips_insert() {
        let mut store = InMemoryStore::new();
        store.set_simulate_upload_error(true);
        assert!(submit(&mut store, request(), Receipt::File(&receipt()), today()).is_err());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn slots_accept_leading_zero() {
        assert_eq!(normalize_slot("09:00"), Some("9:00"));
        assert_eq!(normalize_slot("10:00"), Some("10:00"));
        assert_eq!(normalize_slot("8:00"), None);
        assert_eq!(normalize_slot("9:30"), None);
    }

    #[test]
    fn visit_request_links_property() {
        let f = StoreFixture::new().with_property("Villa Riviera", "vente", "maison", 1e8, "Riviera");
        let property_id = f.id_of(Collection::Properties, "title", "Villa Riviera");
        let mut store = f.store;

        let result = request_visit(
            &mut store,
            VisitRequest {
                property_id,
                desired_date: NaiveDate::from_ymd_opt(2030, 2, 1),
                full_name: "Koffi Yao".into(),
                email: "koffi@example.ci".into(),
                phone: "0102030405".into(),
                message: Some("   ".into()),
            },
        )
        .unwrap();
        assert_eq!(result.records[0].property_id, Some(property_id));
        assert_eq!(result.records[0].message, None);

        let entries = list(&store).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].property.as_ref().unwrap().title, "Villa Riviera");
    }

    #[test]
    fn visit_request_requires_contact_and_date() {
        let mut store = InMemoryStore::new();
        let err = request_visit(
            &mut store,
            VisitRequest {
                property_id: Uuid::new_v4(),
                ..Default::default()
            },
        )
        .unwrap_err();
        let CabinetError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn list_is_newest_first() {
        let f = StoreFixture::new()
            .with_appointment("First", "pending")
            .with_appointment("Second", "approved");
        let names: Vec<String> = list(&f.store)
            .unwrap()
            .into_iter()
            .map(|e| e.appointment.display_name())
            .collect();
        assert_eq!(names, ["Second", "First"]);
    }

    #[test]
    fn status_changes_and_repeats_warn() {
        let f = StoreFixture::new().with_appointment("Awa", "pending");
        let id = f.id_of(Collection::Appointments, "full_name", "Awa");
        let mut store = f.store;

        let approved = set_status(&mut store, &id, AppointmentStatus::Approved).unwrap();
        assert_eq!(approved.records[0].status, AppointmentStatus::Approved);
        assert!(!approved.has_warning());

        let writes = store.write_count();
        let again = set_status(&mut store, &id, AppointmentStatus::Approved).unwrap();
        assert!(again.has_warning());
        assert_eq!(store.write_count(), writes);

        let rejected = set_status(&mut store, &id, AppointmentStatus::Rejected).unwrap();
        assert_eq!(rejected.records[0].status, AppointmentStatus::Rejected);
    }
}
