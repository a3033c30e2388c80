//! # Initialization
//!
//! Turns a loaded [`CabinetConfig`] into a ready [`CabinetApi`]:
//!
//! - `fs`: a [`FileStore`] rooted at `data_dir` (created on first write).
//! - `rest`: a [`RestStore`] pointed at `api_url`, which must be set.

use crate::api::CabinetApi;
use crate::config::{Backend, CabinetConfig};
use crate::error::{CabinetError, Result};
use crate::store::fs::FileStore;
use crate::store::rest::RestStore;
use crate::store::ConfiguredStore;
use std::path::Path;

pub struct CabinetContext {
    pub api: CabinetApi<ConfiguredStore>,
    pub config: CabinetConfig,
}

pub fn build_store(config: &CabinetConfig) -> Result<ConfiguredStore> {
    match config.backend()? {
        Backend::Fs => {
            let root = config.data_dir()?;
            tracing::debug!(root = %root.display(), "using file store");
            Ok(ConfiguredStore::Fs(
                FileStore::new(root).with_public_url(config.public_url.clone()),
            ))
        }
        Backend::Rest => {
            let url = config
                .api_url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| CabinetError::Config("backend 'rest' needs api_url".into()))?;
            tracing::debug!(%url, "using rest store");
            Ok(ConfiguredStore::Rest(RestStore::new(
                url,
                config.api_key.as_deref(),
                config.timeout(),
            )?))
        }
    }
}

/// Loads configuration for `cwd` and opens the configured store.
pub fn initialize(cwd: &Path) -> Result<CabinetContext> {
    let config = CabinetConfig::load(cwd)?;
    initialize_with(config)
}

pub fn initialize_with(config: CabinetConfig) -> Result<CabinetContext> {
    let store = build_store(&config)?;
    Ok(CabinetContext {
        api: CabinetApi::new(store),
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fs_backend_uses_data_dir() {
        let dir = tempdir().unwrap();
        let config = CabinetConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        match build_store(&config).unwrap() {
            ConfiguredStore::Fs(store) => assert_eq!(store.root(), dir.path()),
            ConfiguredStore::Rest(_) => panic!("expected file store"),
        }
    }

    #[test]
    fn rest_backend_requires_url() {
        let config = CabinetConfig {
            backend: "rest".into(),
            ..Default::default()
        };
        assert!(matches!(build_store(&config), Err(CabinetError::Config(_))));
    }

    #[test]
    fn rest_backend_builds_client() {
        let config = CabinetConfig {
            backend: "rest".into(),
            api_url: Some("https://db.example.com".into()),
            api_key: Some("anon-key".into()),
            ..Default::default()
        };
        assert!(matches!(build_store(&config).unwrap(), ConfiguredStore::Rest(_)));
    }
}
