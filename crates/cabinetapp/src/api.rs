//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every client.
//!
//! It:
//! - **Dispatches** to the command functions
//! - **Normalizes inputs**: record ids given as a full UUID or a unique
//!   prefix, edit paths and values typed as text, files given as paths
//! - **Returns structured types** (`Result<CmdResult<_>>` and friends)
//!
//! It does no business logic, no printing and no formatting.
//!
//! ## Id Prefixes
//!
//! Listings print short ids (the first eight hex digits). Any id argument
//! accepts a full UUID or a prefix of at least [`MIN_ID_PREFIX`] characters
//! that matches exactly one row of the collection.
//!
//! ## Generic Over the Store
//!
//! `CabinetApi<S>` works with any backend implementing
//! [`DataStore`] + [`FileStorage`]: `ConfiguredStore` in production,
//! `InMemoryStore` in tests.

use crate::commands::appointments::{
    self, AppointmentEntry, AppointmentRequest, Receipt, VisitRequest,
};
use crate::commands::menus::{self, MenuInput, MenuPatch};
use crate::commands::properties::{self, NewProperty, PropertyFilter, PropertyPatch};
use crate::commands::property_types;
use crate::commands::records::RecordStatusFilter;
use crate::commands::services::{self, ServiceInput, ServicePatch};
use crate::commands::social_links::{self, SocialLinkInput, SocialLinkPatch};
use crate::commands::stats::{self, SearchBreakdown, SearchInput, Timeframe, VisitCount};
use crate::commands::{content, CmdMessage, CmdResult};
use crate::content::{ContentEditor, EditPath, FormNode};
use crate::error::{CabinetError, Result};
use crate::model::{
    row_id, Appointment, AppointmentStatus, Collection, MenuItem, PageContent, Property,
    PropertySearchStat, PropertyType, Service, SiteVisit, SocialLink,
};
use crate::store::{Attachment, DataStore, FileStorage, Filter};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const MIN_ID_PREFIX: usize = 4;

/// One `path=value` edit typed by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub path: String,
    pub value: String,
}

impl TextEdit {
    /// Splits `hero.title=Bonjour` on the first `=`.
    pub fn parse(input: &str) -> Result<Self> {
        let (path, value) = input.split_once('=').ok_or_else(|| {
            CabinetError::Precondition(format!("expected PATH=VALUE, got '{}'", input))
        })?;
        Ok(Self {
            path: path.trim().to_string(),
            value: value.to_string(),
        })
    }
}

pub struct CabinetApi<S: DataStore + FileStorage> {
    store: S,
}

impl<S: DataStore + FileStorage> CabinetApi<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves a full id or a unique id prefix within `collection`.
    pub fn resolve_id(&self, collection: Collection, input: &str) -> Result<Uuid> {
        resolve_id(&self.store, collection, input)
    }

    // --- Content ---

    pub fn list_documents(&self, status: RecordStatusFilter) -> Result<CmdResult<PageContent>> {
        content::list(&self.store, status)
    }

    pub fn fetch_document(&self, page: &str, section: &str) -> Result<PageContent> {
        content::fetch(&self.store, page, section)
    }

    pub fn document_form(&self, page: &str, section: &str) -> Result<FormNode> {
        let doc = content::fetch(&self.store, page, section)?;
        Ok(crate::content::render(&doc.content))
    }

    pub fn put_document(&mut self, page: &str, section: &str, document: Value) -> Result<CmdResult<PageContent>> {
        content::put(&mut self.store, page, section, document)
    }

    pub fn save_document(&mut self, id: &str, document: &Value) -> Result<CmdResult<PageContent>> {
        let id = self.resolve_id(Collection::PageContents, id)?;
        let saved = content::save(&mut self.store, &id, document)?;
        let message = CmdMessage::success(format!("Saved {}/{}", saved.page_name, saved.section_name));
        Ok(CmdResult::single(saved, message))
    }

    pub fn delete_document(&mut self, id: &str) -> Result<CmdResult<PageContent>> {
        let id = self.resolve_id(Collection::PageContents, id)?;
        content::delete(&mut self.store, &id)
    }

    pub fn restore_document(&mut self, id: &str) -> Result<CmdResult<PageContent>> {
        let id = self.resolve_id(Collection::PageContents, id)?;
        content::restore(&mut self.store, &id)
    }

    /// A loaded editor for one section.
    pub fn open_editor(&self, page: &str, section: &str) -> Result<ContentEditor> {
        let mut editor = ContentEditor::new(page, section);
        editor.load(&self.store)?;
        Ok(editor)
    }

    pub fn save_editor(&mut self, editor: &mut ContentEditor) -> Result<()> {
        editor.save(&mut self.store)
    }

    /// Applies every edit to one buffer and saves once. Nothing is written
    /// unless all edits apply.
    pub fn edit_document(&mut self, page: &str, section: &str, edits: &[TextEdit]) -> Result<CmdResult<PageContent>> {
        let mut editor = self.open_editor(page, section)?;
        editor.begin_edit()?;
        for edit in edits {
            let path: EditPath = edit.path.parse()?;
            editor.edit_text(&path, &edit.value)?;
        }
        if !editor.is_dirty() {
            let current = editor.persisted().cloned();
            editor.cancel()?;
            let mut result = CmdResult::with_records(current.into_iter().collect());
            result.add_message(CmdMessage::info("No changes"));
            return Ok(result);
        }
        self.save_editor(&mut editor)?;
        let saved = editor
            .persisted()
            .cloned()
            .ok_or_else(|| CabinetError::InvalidState("editor lost its document after saving".into()))?;
        let message = CmdMessage::success(format!(
            "Saved {} change(s) to {}/{}",
            edits.len(),
            page,
            section
        ));
        Ok(CmdResult::single(saved, message))
    }

    // --- Properties ---

    pub fn create_property(&mut self, input: NewProperty, images: &[PathBuf], videos: &[PathBuf]) -> Result<CmdResult<Property>> {
        let images = read_attachments(images)?;
        let videos = read_attachments(videos)?;
        properties::create(&mut self.store, input, &images, &videos)
    }

    pub fn update_property(
        &mut self,
        id: &str,
        patch: PropertyPatch,
        images: &[PathBuf],
        videos: &[PathBuf],
    ) -> Result<CmdResult<Property>> {
        let id = self.resolve_id(Collection::Properties, id)?;
        let images = read_attachments(images)?;
        let videos = read_attachments(videos)?;
        properties::update(&mut self.store, &id, patch, &images, &videos)
    }

    pub fn get_property(&self, id: &str) -> Result<Property> {
        let id = self.resolve_id(Collection::Properties, id)?;
        properties::get(&self.store, &id)
    }

    pub fn list_properties(&self, filter: &PropertyFilter) -> Result<CmdResult<Property>> {
        properties::list(&self.store, filter)
    }

    pub fn delete_property(&mut self, id: &str) -> Result<CmdResult<Property>> {
        let id = self.resolve_id(Collection::Properties, id)?;
        properties::delete(&mut self.store, &id)
    }

    pub fn restore_property(&mut self, id: &str) -> Result<CmdResult<Property>> {
        let id = self.resolve_id(Collection::Properties, id)?;
        properties::restore(&mut self.store, &id)
    }

    // --- Property types ---

    pub fn list_property_types(&self, status: RecordStatusFilter) -> Result<CmdResult<PropertyType>> {
        property_types::list(&self.store, status)
    }

    pub fn add_property_type(&mut self, name: &str) -> Result<CmdResult<PropertyType>> {
        property_types::add(&mut self.store, name)
    }

    pub fn delete_property_type(&mut self, id: &str) -> Result<CmdResult<PropertyType>> {
        let id = self.resolve_id(Collection::PropertyTypes, id)?;
        property_types::delete(&mut self.store, &id)
    }

    pub fn restore_property_type(&mut self, id: &str) -> Result<CmdResult<PropertyType>> {
        let id = self.resolve_id(Collection::PropertyTypes, id)?;
        property_types::restore(&mut self.store, &id)
    }

    // --- Appointments ---

    /// Books a consultation against today's date.
    pub fn book_appointment(&mut self, request: AppointmentRequest, receipt: Option<&Path>) -> Result<CmdResult<Appointment>> {
        let today = Utc::now().date_naive();
        self.book_appointment_on(request, receipt, today)
    }

    pub fn book_appointment_on(
        &mut self,
        request: AppointmentRequest,
        receipt: Option<&Path>,
        today: NaiveDate,
    ) -> Result<CmdResult<Appointment>> {
        let loaded = receipt.map(|path| (path, Attachment::from_path(path)));
        let receipt = match &loaded {
            None => Receipt::Missing,
            Some((_, Ok(file))) => Receipt::File(file),
            Some((path, Err(e))) => {
                tracing::debug!(path = %path.display(), "receipt unreadable: {}", e);
                let reason = match e {
                    CabinetError::Io(io) => io.to_string(),
                    other => other.to_string(),
                };
                Receipt::Unreadable(reason)
            }
        };
        appointments::submit(&mut self.store, request, receipt, today)
    }

    pub fn request_visit(
        &mut self,
        property: &str,
        desired_date: Option<NaiveDate>,
        full_name: &str,
        email: &str,
        phone: &str,
        message: Option<&str>,
    ) -> Result<CmdResult<Appointment>> {
        let property_id = self.resolve_id(Collection::Properties, property)?;
        appointments::request_visit(
            &mut self.store,
            VisitRequest {
                property_id,
                desired_date,
                full_name: full_name.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                message: message.map(str::to_string),
            },
        )
    }

    pub fn list_appointments(&self) -> Result<Vec<AppointmentEntry>> {
        appointments::list(&self.store)
    }

    pub fn get_appointment(&self, id: &str) -> Result<Appointment> {
        let id = self.resolve_id(Collection::Appointments, id)?;
        appointments::get(&self.store, &id)
    }

    pub fn approve_appointment(&mut self, id: &str) -> Result<CmdResult<Appointment>> {
        self.set_appointment_status(id, AppointmentStatus::Approved)
    }

    pub fn reject_appointment(&mut self, id: &str) -> Result<CmdResult<Appointment>> {
        self.set_appointment_status(id, AppointmentStatus::Rejected)
    }

    fn set_appointment_status(&mut self, id: &str, status: AppointmentStatus) -> Result<CmdResult<Appointment>> {
        let id = self.resolve_id(Collection::Appointments, id)?;
        appointments::set_status(&mut self.store, &id, status)
    }

    // --- Services ---

    pub fn list_services(&self, status: RecordStatusFilter) -> Result<CmdResult<Service>> {
        services::list(&self.store, status)
    }

    pub fn add_service(&mut self, input: ServiceInput) -> Result<CmdResult<Service>> {
        services::add(&mut self.store, input)
    }

    pub fn update_service(&mut self, id: &str, patch: ServicePatch) -> Result<CmdResult<Service>> {
        let id = self.resolve_id(Collection::Services, id)?;
        services::update(&mut self.store, &id, patch)
    }

    pub fn delete_service(&mut self, id: &str) -> Result<CmdResult<Service>> {
        let id = self.resolve_id(Collection::Services, id)?;
        services::delete(&mut self.store, &id)
    }

    pub fn restore_service(&mut self, id: &str) -> Result<CmdResult<Service>> {
        let id = self.resolve_id(Collection::Services, id)?;
        services::restore(&mut self.store, &id)
    }

    // --- Social links ---

    pub fn list_social_links(&self, status: RecordStatusFilter) -> Result<CmdResult<SocialLink>> {
        social_links::list(&self.store, status)
    }

    pub fn add_social_link(&mut self, input: SocialLinkInput) -> Result<CmdResult<SocialLink>> {
        social_links::add(&mut self.store, input)
    }

    pub fn update_social_link(&mut self, id: &str, patch: SocialLinkPatch) -> Result<CmdResult<SocialLink>> {
        let id = self.resolve_id(Collection::SocialLinks, id)?;
        social_links::update(&mut self.store, &id, patch)
    }

    pub fn move_social_link_up(&mut self, id: &str) -> Result<CmdResult<SocialLink>> {
        let id = self.resolve_id(Collection::SocialLinks, id)?;
        social_links::move_up(&mut self.store, &id)
    }

    pub fn move_social_link_down(&mut self, id: &str) -> Result<CmdResult<SocialLink>> {
        let id = self.resolve_id(Collection::SocialLinks, id)?;
        social_links::move_down(&mut self.store, &id)
    }

    pub fn delete_social_link(&mut self, id: &str) -> Result<CmdResult<SocialLink>> {
        let id = self.resolve_id(Collection::SocialLinks, id)?;
        social_links::delete(&mut self.store, &id)
    }

    pub fn restore_social_link(&mut self, id: &str) -> Result<CmdResult<SocialLink>> {
        let id = self.resolve_id(Collection::SocialLinks, id)?;
        social_links::restore(&mut self.store, &id)
    }

    // --- Menus ---

    pub fn list_menus(&self, status: RecordStatusFilter) -> Result<CmdResult<MenuItem>> {
        menus::list(&self.store, status)
    }

    pub fn add_menu(&mut self, input: MenuInput) -> Result<CmdResult<MenuItem>> {
        menus::add(&mut self.store, input)
    }

    pub fn update_menu(&mut self, id: &str, patch: MenuPatch) -> Result<CmdResult<MenuItem>> {
        let id = self.resolve_id(Collection::Menus, id)?;
        menus::update(&mut self.store, &id, patch)
    }

    pub fn delete_menu(&mut self, id: &str) -> Result<CmdResult<MenuItem>> {
        let id = self.resolve_id(Collection::Menus, id)?;
        menus::delete(&mut self.store, &id)
    }

    pub fn restore_menu(&mut self, id: &str) -> Result<CmdResult<MenuItem>> {
        let id = self.resolve_id(Collection::Menus, id)?;
        menus::restore(&mut self.store, &id)
    }

    // --- Statistics ---

    pub fn record_visit(&mut self, page: Option<&str>) -> Result<CmdResult<SiteVisit>> {
        stats::record_visit(&mut self.store, page, Utc::now())
    }

    pub fn visit_counts(&self, timeframe: Timeframe) -> Result<Vec<VisitCount>> {
        stats::visit_counts(&self.store, timeframe)
    }

    pub fn record_search(&mut self, input: SearchInput) -> Result<CmdResult<PropertySearchStat>> {
        stats::record_search(&mut self.store, input)
    }

    pub fn search_breakdown(&self) -> Result<SearchBreakdown> {
        stats::search_breakdown(&self.store)
    }

    // --- Storage ---

    /// Deletes one stored file, e.g. a receipt orphaned by a failed booking.
    pub fn remove_file(&mut self, bucket: &str, path: &str) -> Result<CmdResult<String>> {
        self.store.remove(bucket, path)?;
        tracing::info!(%bucket, %path, "file removed");
        Ok(CmdResult::single(
            format!("{}/{}", bucket, path),
            CmdMessage::success(format!("Removed {}/{}", bucket, path)),
        ))
    }
}

fn read_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>> {
    paths.iter().map(|p| Attachment::from_path(p)).collect()
}

fn resolve_id<S: DataStore>(store: &S, collection: Collection, input: &str) -> Result<Uuid> {
    let input = input.trim();
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }
    let prefix = input.to_ascii_lowercase();
    let is_hex = prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
    if prefix.len() < MIN_ID_PREFIX || !is_hex {
        return Err(CabinetError::Precondition(format!(
            "'{}' is not an id (give a UUID or at least {} of its first characters)",
            input, MIN_ID_PREFIX
        )));
    }

    let matches: Vec<Uuid> = store
        .list(collection, &Filter::new())?
        .iter()
        .filter_map(row_id)
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CabinetError::NotFound(format!("{} {}", collection, input))),
        many => Err(CabinetError::Precondition(format!(
            "id prefix '{}' matches {} {} rows",
            input,
            many.len(),
            collection
        ))),
    }
}
