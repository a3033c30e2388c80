//! # CLI Templates
//!
//! Output goes through minijinja templates kept as stand-alone files, so
//! they can be edited and diffed apart from the code, and included here as
//! string constants.
//!
//! Conventions:
//!
//! 1. Line breaks: the environment runs with `trim_blocks` and
//!    `lstrip_blocks`, so block tags sit on their own lines and every output
//!    line is a template line.
//! 2. Styles: templates tag text with semantic names through the `style`
//!    filter and never choose colors. When a style depends on data, the
//!    renderer (or a `{% set %}`) computes the name once.
//! 3. Layout: widths, truncation and padding are computed in Rust, where
//!    Unicode width is known. Templates only concatenate.

pub const MESSAGES_TEMPLATE: &str = include_str!("templates/messages.tmp");
pub const RECORD_LIST_TEMPLATE: &str = include_str!("templates/record_list.tmp");
pub const DETAIL_TEMPLATE: &str = include_str!("templates/detail.tmp");
pub const FORM_TEMPLATE: &str = include_str!("templates/form.tmp");
pub const APPOINTMENTS_TEMPLATE: &str = include_str!("templates/appointments.tmp");
pub const VISITS_TEMPLATE: &str = include_str!("templates/visits.tmp");
pub const SEARCHES_TEMPLATE: &str = include_str!("templates/searches.tmp");
