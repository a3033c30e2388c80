//! # Command Layer
//!
//! The business logic of the back office. Each area lives in its own
//! submodule as plain functions over a [`DataStore`](crate::store::DataStore)
//! (and a [`FileStorage`](crate::store::FileStorage) where files are
//! uploaded).
//!
//! Commands:
//! - validate input completely before touching the store,
//! - return structured [`CmdResult`]s carrying records and leveled messages,
//! - never print, prompt or exit.
//!
//! The UI layer decides how to render what they return.
//!
//! ## Testing Strategy
//!
//! This is where most tests live. Command tests run against
//! `InMemoryStore`, whose counters show exactly which store calls a
//! command made and whose failure switches exercise error paths.
//!
//! ## Command Modules
//!
//! - [`records`]: soft delete / restore shared by every soft-deletable collection
//! - [`content`]: page content documents
//! - [`properties`]: real-estate listings
//! - [`property_types`]: the catalog of property types listings pick from
//! - [`appointments`]: consultation bookings, visit requests, status workflow
//! - [`services`], [`social_links`], [`menus`]: site records
//! - [`stats`]: visit and search statistics

use serde::Serialize;

pub mod appointments;
pub mod content;
pub mod menus;
pub mod properties;
pub mod property_types;
pub mod records;
pub mod services;
pub mod social_links;
pub mod stats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Records a command touched or listed, plus messages for the user.
#[derive(Debug, Clone)]
pub struct CmdResult<T> {
    pub records: Vec<T>,
    pub messages: Vec<CmdMessage>,
}

impl<T> Default for CmdResult<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            messages: Vec::new(),
        }
    }
}

impl<T> CmdResult<T> {
    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records,
            messages: Vec::new(),
        }
    }

    pub fn single(record: T, message: CmdMessage) -> Self {
        Self {
            records: vec![record],
            messages: vec![message],
        }
    }

    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn first(&self) -> Option<&T> {
        self.records.first()
    }

    pub fn has_warning(&self) -> bool {
        self.messages.iter().any(|m| m.level == MessageLevel::Warning)
    }
}

/// Splits free text into trimmed non-empty lines.
pub(crate) fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trimmed value, or `None` when blank.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_drop_blanks() {
        assert_eq!(
            non_empty_lines("Conseil\n\n  Contentieux  \r\n \nRecouvrement"),
            ["Conseil", "Contentieux", "Recouvrement"]
        );
        assert!(non_empty_lines(" \n ").is_empty());
    }

    #[test]
    fn warnings_are_detected() {
        let mut result = CmdResult::with_records(vec![1]);
        assert!(!result.has_warning());
        result.add_message(CmdMessage::warning("already approved"));
        assert!(result.has_warning());
        assert_eq!(result.first(), Some(&1));
    }

    #[test]
    fn blank_optional_text_is_none() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" Cocody ")), Some("Cocody".to_string()));
        assert_eq!(optional_text(None), None);
    }
}
