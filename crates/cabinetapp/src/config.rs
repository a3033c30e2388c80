//! # Configuration
//!
//! Settings are loaded with [`confique`] from, in priority order:
//!
//! 1. **Environment variables**: `CABINET_BACKEND`, `CABINET_DATA_DIR`, ...
//! 2. **Working directory**: `./cabinet.toml`.
//! 3. **User config**: `cabinet.toml` in the OS config directory (via the
//!    `directories` crate).
//! 4. **Compiled defaults**.
//!
//! ## Available Settings
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | `backend` | `CABINET_BACKEND` | `fs` | `fs` (local JSON files) or `rest` (hosted API) |
//! | `data_dir` | `CABINET_DATA_DIR` | OS data dir | Root of the `fs` backend |
//! | `api_url` | `CABINET_API_URL` | | Base URL of the `rest` backend |
//! | `api_key` | `CABINET_API_KEY` | | Key sent with every `rest` request |
//! | `timeout_secs` | `CABINET_TIMEOUT_SECS` | `30` | Per-request timeout |
//! | `public_url` | `CABINET_PUBLIC_URL` | | Base URL for files served by the `fs` backend |

use crate::error::{CabinetError, Result};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_FILE: &str = "cabinet.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Fs,
    Rest,
}

impl FromStr for Backend {
    type Err = CabinetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fs" => Ok(Backend::Fs),
            "rest" => Ok(Backend::Rest),
            other => Err(CabinetError::Config(format!(
                "unknown backend '{}' (expected fs or rest)",
                other
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Fs => "fs",
            Backend::Rest => "rest",
        })
    }
}

/// Configuration for cabinet, stored in `cabinet.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CabinetConfig {
    /// Storage backend: "fs" or "rest".
    #[config(env = "CABINET_BACKEND", default = "fs")]
    pub backend: String,

    /// Directory holding the fs backend's files.
    #[config(env = "CABINET_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[config(env = "CABINET_API_URL")]
    pub api_url: Option<String>,

    #[config(env = "CABINET_API_KEY")]
    pub api_key: Option<String>,

    #[config(env = "CABINET_TIMEOUT_SECS", default = 30)]
    pub timeout_secs: u64,

    /// Base URL under which uploaded files are served, for the fs backend.
    #[config(env = "CABINET_PUBLIC_URL")]
    pub public_url: Option<String>,
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self {
            backend: "fs".to_string(),
            data_dir: None,
            api_url: None,
            api_key: None,
            timeout_secs: 30,
            public_url: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "cabinet", "cabinet")
}

impl CabinetConfig {
    /// Environment, then `<cwd>/cabinet.toml`, then the user config file.
    pub fn load(cwd: &Path) -> Result<Self> {
        let mut builder = Self::builder().env().file(cwd.join(CONFIG_FILE));
        if let Some(dirs) = project_dirs() {
            builder = builder.file(dirs.config_dir().join(CONFIG_FILE));
        }
        builder
            .load()
            .map_err(|e| CabinetError::Config(e.to_string()))
    }

    /// Files only, first one wins. Missing files are skipped.
    pub fn load_files(files: &[PathBuf]) -> Result<Self> {
        files
            .iter()
            .fold(Self::builder(), |builder, file| builder.file(file))
            .load()
            .map_err(|e| CabinetError::Config(e.to_string()))
    }

    pub fn backend(&self) -> Result<Backend> {
        self.backend.parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// The configured data directory, or the OS data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => project_dirs()
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| CabinetError::Config("could not determine a data directory".into())),
        }
    }

    /// The API key with all but its last four characters hidden.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask)
    }

    /// Resolved settings as `(key, value)` pairs for display; the API key is
    /// masked.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let show = |v: Option<&str>| v.unwrap_or("").to_string();
        vec![
            ("backend", self.backend.clone()),
            (
                "data_dir",
                self.data_dir()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            ),
            ("api_url", show(self.api_url.as_deref())),
            ("api_key", self.masked_api_key().unwrap_or_default()),
            ("timeout_secs", self.timeout_secs.to_string()),
            ("public_url", show(self.public_url.as_deref())),
        ]
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
