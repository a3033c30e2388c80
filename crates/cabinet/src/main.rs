//! # Cabinet CLI
//!
//! The back office as a terminal tool. The binary is intentionally thin: the
//! CLI lives in `src/cli/`, this file only invokes `cli::run()` and handles
//! process termination.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/cabinet/src/cli/)                        │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - logging, context wiring, dispatch (commands.rs)          │
//! │  - minijinja templates + console styles (render.rs)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/cabinetapp/src/api.rs)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything user-facing happens here: argument parsing, configuration
//! overrides, rendering and exit codes. The library never prints.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
