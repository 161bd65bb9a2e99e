//! `workhist.toml`: a `[session]` table for the editing session and a
//! `[storage]` table for the local draft store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use workhist_session::SessionConfig;
use workhist_storage::{DEFAULT_MAX_DRAFT_BYTES, DEFAULT_SLOT};

pub(crate) const DEFAULT_CONFIG_FILE: &str = "workhist.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WorkhistConfig {
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct StorageConfig {
    pub dir: PathBuf,
    pub user: String,
    pub slot: String,
    pub max_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            dir: PathBuf::from(".workhist/drafts"),
            user: "local".to_string(),
            slot: DEFAULT_SLOT.to_string(),
            max_bytes: DEFAULT_MAX_DRAFT_BYTES,
        }
    }
}

impl WorkhistConfig {
    /// Read `path`, or `workhist.toml` in the working directory if it
    /// exists, or fall back to defaults.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, String> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::read(default)
                } else {
                    Ok(WorkhistConfig::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
    }

    pub(crate) fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workhist_validate::ValidationMode;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(WorkhistConfig::parse("").unwrap(), WorkhistConfig::default());
    }

    #[test]
    fn tables_override_individual_keys() {
        let config = WorkhistConfig::parse(
            r#"
            [session]
            validation_mode = "lenient"
            device = "ci-runner"

            [storage]
            user = "alice"
            max_bytes = 2048
            "#,
        )
        .unwrap();
        assert_eq!(config.session.validation_mode, ValidationMode::Lenient);
        assert_eq!(config.session.device, "ci-runner");
        assert_eq!(config.session.autosave_interval_secs, 30);
        assert_eq!(config.storage.user, "alice");
        assert_eq!(config.storage.max_bytes, 2048);
        assert_eq!(config.storage.slot, DEFAULT_SLOT);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(WorkhistConfig::parse("[session]\nvalidation_mode = \"loose\"").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = WorkhistConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.contains("error reading config"));
    }
}
