//! # CLI Behavior
//!
//! This is **one possible UI client** for cabinet, not the application
//! itself. It is the only place that knows about terminal I/O, exit codes
//! and output formatting.
//!
//! ## Ids
//!
//! Listings show the first eight characters of each record id. Every
//! command taking an id accepts that short form (or any unique prefix of at
//! least four characters).
//!
//! ## Content Editing
//!
//! `cabinet content form home hero` prints every editable leaf with its
//! path; `cabinet content edit home hero --set hero.title=Bienvenue` applies
//! one or more edits to a single buffer and saves the whole document once.
//!
//! ## Module Structure
//!
//! - `setup`: argument parsing via clap, grouped help
//! - `commands`: logging, context setup and per-command handlers
//! - `render`: template rendering with the `style` filter
//! - `styles`: named terminal styles
//! - `templates`: embedded template sources

mod commands;
mod render;
pub mod setup;
mod styles;
mod templates;

pub use commands::run;
