//! The editing session for one page section.
//!
//! ```text
//! Idle ──load──▶ Loading ──ok──▶ Viewing
//!                         └─err─▶ LoadError ──load──▶ Loading
//! Viewing ──begin_edit──▶ Editing ──edit──▶ Editing
//! Editing ──cancel──▶ Viewing (original)
//! Editing ──save──▶ Saving ──ok──▶ Viewing (saved)
//!                           └─err─▶ SaveError (buffer kept)
//! SaveError ──save──▶ Saving ; ──edit──▶ Editing ; ──cancel──▶ Viewing
//! ```
//!
//! Loading and saving are split in two steps (`start_*` then `*_finished`)
//! so a client can run the store call wherever it likes and feed the outcome
//! back. [`ContentEditor::load`] and [`ContentEditor::save`] do both steps
//! against a store directly.
//!
//! An operation that is not valid in the current state fails with
//! [`CabinetError::InvalidState`] and changes nothing. In particular no edit
//! is accepted while a save is in flight.

use super::edit::{edit_leaf, Scalar};
use super::form::{render, FormNode};
use super::path::EditPath;
use crate::commands::content;
use crate::error::{CabinetError, Result};
use crate::model::PageContent;
use crate::store::DataStore;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Idle,
    Loading,
    Viewing {
        doc: PageContent,
    },
    LoadError {
        message: String,
        retryable: bool,
    },
    Editing {
        original: PageContent,
        buffer: Value,
    },
    Saving {
        original: PageContent,
        buffer: Value,
    },
    SaveError {
        original: PageContent,
        buffer: Value,
        message: String,
        retryable: bool,
    },
}

impl EditorState {
    pub fn name(&self) -> &'static str {
        match self {
            EditorState::Idle => "idle",
            EditorState::Loading => "loading",
            EditorState::Viewing { .. } => "viewing",
            EditorState::LoadError { .. } => "load-error",
            EditorState::Editing { .. } => "editing",
            EditorState::Saving { .. } => "saving",
            EditorState::SaveError { .. } => "save-error",
        }
    }
}

/// What to persist: the whole buffer for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub id: Uuid,
    pub document: Value,
}

#[derive(Debug, Clone)]
pub struct ContentEditor {
    page_name: String,
    section_name: String,
    state: EditorState,
}

impl ContentEditor {
    pub fn new(page_name: impl Into<String>, section_name: impl Into<String>) -> Self {
        Self {
            page_name: page_name.into(),
            section_name: section_name.into(),
            state: EditorState::Idle,
        }
    }

    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    pub fn section_name(&self) -> &str {
        &self.section_name
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// The document as last loaded or saved.
    pub fn persisted(&self) -> Option<&PageContent> {
        match &self.state {
            EditorState::Viewing { doc } => Some(doc),
            EditorState::Editing { original, .. }
            | EditorState::Saving { original, .. }
            | EditorState::SaveError { original, .. } => Some(original),
            _ => None,
        }
    }

    /// The edit buffer, while one exists.
    pub fn buffer(&self) -> Option<&Value> {
        match &self.state {
            EditorState::Editing { buffer, .. }
            | EditorState::Saving { buffer, .. }
            | EditorState::SaveError { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    /// The document currently shown: the buffer while editing, otherwise the
    /// persisted content.
    pub fn current(&self) -> Option<&Value> {
        self.buffer()
            .or_else(|| self.persisted().map(|doc| &doc.content))
    }

    /// True when the buffer differs from the persisted document.
    pub fn is_dirty(&self) -> bool {
        match (self.buffer(), self.persisted()) {
            (Some(buffer), Some(doc)) => *buffer != doc.content,
            _ => false,
        }
    }

    pub fn form(&self) -> Option<FormNode> {
        self.current().map(render)
    }

    fn invalid(&self, operation: &str) -> CabinetError {
        CabinetError::InvalidState(format!(
            "cannot {} {}/{} while {}",
            operation,
            self.page_name,
            self.section_name,
            self.state.name()
        ))
    }

    pub fn start_load(&mut self) -> Result<()> {
        match self.state {
            EditorState::Idle | EditorState::LoadError { .. } | EditorState::Viewing { .. } => {
                self.state = EditorState::Loading;
                Ok(())
            }
            _ => Err(self.invalid("load")),
        }
    }

    /// Feeds the fetch outcome back. A failed fetch moves to `LoadError` and
    /// is returned as is.
    pub fn load_finished(&mut self, outcome: Result<PageContent>) -> Result<()> {
        if !matches!(self.state, EditorState::Loading) {
            return Err(self.invalid("finish loading"));
        }
        match outcome {
            Ok(doc) => {
                self.state = EditorState::Viewing { doc };
                Ok(())
            }
            Err(e) => {
                self.state = EditorState::LoadError {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                };
                Err(e)
            }
        }
    }

    /// Deep-copies the document into a fresh edit buffer.
    pub fn begin_edit(&mut self) -> Result<()> {
        let EditorState::Viewing { doc } = &self.state else {
            return Err(self.invalid("edit"));
        };
        let original = doc.clone();
        let buffer = original.content.clone();
        self.state = EditorState::Editing { original, buffer };
        Ok(())
    }

    /// Replaces one leaf of the buffer. A path that does not resolve leaves
    /// buffer and state as they were.
    pub fn edit_leaf(&mut self, path: &EditPath, value: Scalar) -> Result<()> {
        let edited = match &self.state {
            EditorState::Editing { buffer, .. } | EditorState::SaveError { buffer, .. } => {
                edit_leaf(buffer, path, value)?
            }
            _ => return Err(self.invalid("edit")),
        };
        self.replace_buffer(edited);
        Ok(())
    }

    /// Like [`edit_leaf`](Self::edit_leaf), with `raw` coerced to the type
    /// of the leaf it replaces.
    pub fn edit_text(&mut self, path: &EditPath, raw: &str) -> Result<()> {
        let scalar = match &self.state {
            EditorState::Editing { buffer, .. } | EditorState::SaveError { buffer, .. } => {
                let existing = path.resolve(buffer).ok_or_else(|| {
                    tracing::error!(%path, "edit rejected: path does not resolve");
                    CabinetError::Precondition(format!("path '{}' does not resolve", path))
                })?;
                Scalar::parse_for(existing, raw, path)?
            }
            _ => return Err(self.invalid("edit")),
        };
        self.edit_leaf(path, scalar)
    }

    fn replace_buffer(&mut self, edited: Value) {
        let state = std::mem::replace(&mut self.state, EditorState::Idle);
        self.state = match state {
            EditorState::Editing { original, .. } | EditorState::SaveError { original, .. } => {
                EditorState::Editing {
                    original,
                    buffer: edited,
                }
            }
            other => other,
        };
    }

    /// Drops the buffer and shows the persisted document again.
    pub fn cancel(&mut self) -> Result<()> {
        if !matches!(
            self.state,
            EditorState::Editing { .. } | EditorState::SaveError { .. }
        ) {
            return Err(self.invalid("cancel"));
        }
        let state = std::mem::replace(&mut self.state, EditorState::Idle);
        self.state = match state {
            EditorState::Editing { original, .. } | EditorState::SaveError { original, .. } => {
                EditorState::Viewing { doc: original }
            }
            other => other,
        };
        Ok(())
    }

    /// Freezes the buffer and hands out what must be written.
    pub fn start_save(&mut self) -> Result<SaveRequest> {
        if !matches!(
            self.state,
            EditorState::Editing { .. } | EditorState::SaveError { .. }
        ) {
            return Err(self.invalid("save"));
        }
        let state = std::mem::replace(&mut self.state, EditorState::Idle);
        let (original, buffer) = match state {
            EditorState::Editing { original, buffer }
            | EditorState::SaveError {
                original, buffer, ..
            } => (original, buffer),
            other => {
                self.state = other;
                return Err(self.invalid("save"));
            }
        };
        let request = SaveRequest {
            id: original.id,
            document: buffer.clone(),
        };
        self.state = EditorState::Saving { original, buffer };
        Ok(request)
    }

    /// Feeds the write outcome back. On failure the buffer is kept in
    /// `SaveError` and the error is returned.
    pub fn save_finished(&mut self, outcome: Result<PageContent>) -> Result<()> {
        if !matches!(self.state, EditorState::Saving { .. }) {
            return Err(self.invalid("finish saving"));
        }
        let state = std::mem::replace(&mut self.state, EditorState::Idle);
        let EditorState::Saving { original, buffer } = state else {
            self.state = state;
            return Err(self.invalid("finish saving"));
        };
        match outcome {
            Ok(doc) => {
                self.state = EditorState::Viewing { doc };
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id = %original.id, retryable = e.is_retryable(), "content save failed; buffer kept");
                self.state = EditorState::SaveError {
                    original,
                    buffer,
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                };
                Err(e)
            }
        }
    }

    /// Fetches the active document for this section.
    pub fn load<S: DataStore>(&mut self, store: &S) -> Result<()> {
        self.start_load()?;
        let outcome = content::fetch(store, &self.page_name, &self.section_name);
        self.load_finished(outcome)
    }

    /// Writes the whole buffer back in one update.
    pub fn save<S: DataStore>(&mut self, store: &mut S) -> Result<()> {
        let request = self.start_save()?;
        let outcome = content::save(store, &request.id, &request.document);
        self.save_finished(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;
    use serde_json::json;

    fn hero_store() -> InMemoryStore {
        StoreFixture::new()
            .with_document(
                "home",
                "hero",
                json!({ "hero": { "title": "Welcome", "items": ["a", "b"] }, "count": 3 }),
            )
            .store
    }

    fn editing(store: &InMemoryStore) -> ContentEditor {
        let mut editor = ContentEditor::new("home", "hero");
        editor.load(store).unwrap();
        editor.begin_edit().unwrap();
        editor
    }

    fn path(text: &str) -> EditPath {
        text.parse().unwrap()
    }

    #[test]
    fn edit_then_save_persists_whole_document() {
        let mut store = hero_store();
        let mut editor = editing(&store);

        editor.edit_leaf(&path("hero.items.1"), "B".into()).unwrap();
        editor.edit_text(&path("count"), "4").unwrap();
        assert!(editor.is_dirty());
        editor.save(&mut store).unwrap();

        assert_eq!(editor.state().name(), "viewing");
        let expected = json!({ "hero": { "title": "Welcome", "items": ["a", "B"] }, "count": 4 });
        assert_eq!(content::fetch(&store, "home", "hero").unwrap().content, expected);
        assert_eq!(editor.current(), Some(&expected));
    }

    #[test]
    fn cancel_restores_persisted_document() {
        let store = hero_store();
        let mut editor = editing(&store);
        editor.edit_leaf(&path("hero.title"), "Bonjour".into()).unwrap();
        editor.cancel().unwrap();

        assert_eq!(editor.buffer(), None);
        assert_eq!(editor.current().unwrap()["hero"]["title"], json!("Welcome"));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn failed_save_keeps_buffer_for_retry() {
        let mut store = hero_store();
        let mut editor = editing(&store);
        editor.edit_leaf(&path("hero.title"), "Bonjour".into()).unwrap();

        store.set_simulate_write_error(true);
        let err = editor.save(&mut store).unwrap_err();
        assert!(err.is_retryable());
        let EditorState::SaveError { retryable, buffer, .. } = editor.state() else {
            panic!("expected save error, got {}", editor.state().name());
        };
        assert!(*retryable);
        assert_eq!(buffer["hero"]["title"], json!("Bonjour"));

        store.set_simulate_write_error(false);
        editor.save(&mut store).unwrap();
        assert_eq!(
            content::fetch(&store, "home", "hero").unwrap().content["hero"]["title"],
            json!("Bonjour")
        );
    }

    #[test]
    fn editing_after_failed_save_returns_to_editing() {
        let mut store = hero_store();
        let mut editor = editing(&store);
        store.set_simulate_write_error(true);
        let _ = editor.save(&mut store);

        editor.edit_leaf(&path("count"), Scalar::from(5)).unwrap();
        assert_eq!(editor.state().name(), "editing");
    }

    #[test]
    fn no_edits_while_saving() {
        let store = hero_store();
        let mut editor = editing(&store);
        let request = editor.start_save().unwrap();
        assert_eq!(request.document["count"], json!(3));

        let err = editor.edit_leaf(&path("count"), Scalar::from(9)).unwrap_err();
        assert!(matches!(err, CabinetError::InvalidState(_)));
        assert!(matches!(editor.cancel(), Err(CabinetError::InvalidState(_))));
        assert_eq!(editor.state().name(), "saving");
        assert_eq!(editor.buffer().unwrap()["count"], json!(3));
    }

    #[test]
    fn bad_path_leaves_buffer_untouched() {
        let store = hero_store();
        let mut editor = editing(&store);
        let before = editor.buffer().cloned();

        let err = editor.edit_leaf(&path("hero.items.7"), "x".into()).unwrap_err();
        assert!(matches!(err, CabinetError::Precondition(_)));
        let err = editor.edit_text(&path("hero.missing"), "x").unwrap_err();
        assert!(matches!(err, CabinetError::Precondition(_)));

        assert_eq!(editor.buffer().cloned(), before);
        assert_eq!(editor.state().name(), "editing");
    }

    #[test]
    fn typed_text_must_match_leaf_type() {
        let store = hero_store();
        let mut editor = editing(&store);
        let err = editor.edit_text(&path("count"), "three").unwrap_err();
        assert!(matches!(err, CabinetError::Validation(_)));
    }

    #[test]
    fn missing_section_is_a_load_error_then_retry() {
        let mut store = InMemoryStore::new();
        let mut editor = ContentEditor::new("home", "hero");
        assert!(matches!(editor.load(&store), Err(CabinetError::NotFound(_))));
        assert_eq!(editor.state().name(), "load-error");

        content::put(&mut store, "home", "hero", json!({ "title": "Hi" })).unwrap();
        editor.load(&store).unwrap();
        assert_eq!(editor.current(), Some(&json!({ "title": "Hi" })));
    }

    #[test]
    fn invalid_operations_change_nothing() {
        let mut editor = ContentEditor::new("home", "hero");
        assert!(matches!(editor.begin_edit(), Err(CabinetError::InvalidState(_))));
        assert!(matches!(editor.start_save(), Err(CabinetError::InvalidState(_))));
        assert!(matches!(
            editor.save_finished(Err(CabinetError::persistence("x"))),
            Err(CabinetError::InvalidState(_))
        ));
        assert_eq!(editor.state(), &EditorState::Idle);
    }

    #[test]
    fn form_follows_buffer() {
        let store = hero_store();
        let mut editor = editing(&store);
        editor.edit_leaf(&path("hero.title"), "x".repeat(101).into()).unwrap();
        let form = editor.form().unwrap();
        let field = form.find(&path("hero.title")).unwrap();
        assert!(matches!(
            field,
            FormNode::Field { control: super::super::form::Control::MultiLine, .. }
        ));
    }
}
