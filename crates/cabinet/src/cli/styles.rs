//! Named terminal styles.
//!
//! Templates never pick colors. They tag text with a semantic name through
//! the `style` filter (`{{ title | style("title") }}`) and this module maps
//! each name to a [`console::Style`]. A name missing from the map renders
//! with [`MISSING_STYLE_INDICATOR`] in front, so typos show up in the output
//! instead of silently dropping the style.

use console::Style;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const MISSING_STYLE_INDICATOR: &str = "(!?)";

/// Style identifiers shared between templates and renderers.
pub mod names {
    pub const MUTED: &str = "muted";
    pub const FAINT: &str = "faint";
    pub const ERROR: &str = "error";
    pub const WARNING: &str = "warning";
    pub const SUCCESS: &str = "success";
    pub const INFO: &str = "info";
    pub const TITLE: &str = "title";
    pub const TIME: &str = "time";
    pub const ID: &str = "id";
    pub const DELETED: &str = "deleted";
    pub const LABEL: &str = "label";
    pub const PATH: &str = "path";
    pub const VALUE: &str = "value";
    pub const PENDING: &str = "pending";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
    pub const BAR: &str = "bar";
}

#[derive(Debug, Clone, Default)]
pub struct Styles {
    styles: HashMap<String, Style>,
}

impl Styles {
    pub fn add(mut self, name: &str, style: Style) -> Self {
        self.styles.insert(name.to_string(), style);
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    pub fn apply(&self, name: &str, text: &str) -> String {
        match self.styles.get(name) {
            Some(style) => style.apply_to(text).to_string(),
            None => format!("{} {}", MISSING_STYLE_INDICATOR, text),
        }
    }

    /// Like [`Styles::apply`] without escape codes; unknown names still get
    /// the indicator.
    pub fn apply_plain(&self, name: &str, text: &str) -> String {
        if self.has(name) {
            text.to_string()
        } else {
            format!("{} {}", MISSING_STYLE_INDICATOR, text)
        }
    }
}

pub static CABINET_STYLES: Lazy<Styles> = Lazy::new(|| {
    let muted = Style::new().color256(245);
    Styles::default()
        .add(names::MUTED, muted.clone())
        .add(names::FAINT, Style::new().color256(240))
        .add(names::ERROR, Style::new().red().bold())
        .add(names::WARNING, Style::new().yellow().bold())
        .add(names::SUCCESS, Style::new().green())
        .add(names::INFO, muted.clone())
        .add(names::TITLE, Style::new().bold())
        .add(names::TIME, muted.clone().italic())
        .add(names::ID, Style::new().yellow())
        .add(names::DELETED, Style::new().red())
        .add(names::LABEL, Style::new().cyan())
        .add(names::PATH, Style::new().cyan())
        .add(names::VALUE, Style::new())
        .add(names::PENDING, Style::new().yellow())
        .add(names::APPROVED, Style::new().green())
        .add(names::REJECTED, Style::new().red())
        .add(names::BAR, Style::new().blue())
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output_keeps_text() {
        assert_eq!(CABINET_STYLES.apply_plain(names::TITLE, "Villa"), "Villa");
    }

    #[test]
    fn unknown_style_is_flagged() {
        assert_eq!(CABINET_STYLES.apply_plain("titel", "Villa"), "(!?) Villa");
        assert!(CABINET_STYLES.apply("titel", "Villa").starts_with(MISSING_STYLE_INDICATOR));
    }
}
