//! # Cabinet Architecture
//!
//! Cabinet is the **UI-agnostic back office** of a law and real-estate
//! cabinet website: page content, listings, services, social links, menus,
//! appointment bookings and visit statistics. The records themselves live in
//! an external store; this library validates, edits and moves them.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (crates/cabinet)                                       │
//! │  - Parses arguments, renders templates, owns exit codes     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Normalizes inputs (id prefixes, edit paths, file paths)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Validation and multi-step flows                          │
//! │  - Returns CmdResult values, never prints                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - DataStore + FileStorage traits                           │
//! │  - FileStore, RestStore, InMemoryStore (testing)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`content`] module sits beside the commands: a schema-less JSON
//! editor whose edits never disturb the rest of the document.
//!
//! ## No I/O Assumptions in Core
//!
//! From `api.rs` inward nothing writes to stdout/stderr, exits the process
//! or assumes a terminal. Diagnostics go through `tracing`; it is up to the
//! client to install a subscriber.
//!
//! ## Testing Strategy
//!
//! 1. **Commands**: thorough unit tests against `InMemoryStore`.
//! 2. **Content editor**: path, edit, form and session tests with plain
//!    `serde_json` values.
//! 3. **Stores**: `FileStore` against a temp dir; `RestStore` through its
//!    pure request/response helpers.
//! 4. **API**: dispatch and input normalization.
//! 5. **CLI**: end-to-end runs of the binary against the `fs` backend.
//!
//! ## Module Overview
//!
//! - [`api`]: the facade
//! - [`commands`]: business logic
//! - [`content`]: JSON content editor
//! - [`model`]: collections and typed records
//! - [`store`]: storage traits and backends
//! - [`validation`]: field-level form checks
//! - [`config`], [`init`]: configuration and wiring
//! - [`error`]: error types

pub mod api;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod init;
pub mod model;
pub mod store;
pub mod validation;
