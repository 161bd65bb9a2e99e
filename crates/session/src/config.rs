use serde::{Deserialize, Serialize};
use workhist_storage::OriginFingerprint;
use workhist_validate::ValidationMode;

/// Settings for one editing session. Every field has a default, so a
/// partial `[session]` table is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet window before an autosave fires. Reset by every edit.
    pub autosave_interval_secs: u64,
    /// Drafts older than this are never offered for restore.
    pub max_draft_age_hours: u64,
    pub total_steps: u32,
    pub validation_mode: ValidationMode,
    pub enable_local_drafts: bool,
    pub enable_remote_drafts: bool,
    /// Descriptor of this device; only its fingerprint is stored.
    pub device: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            autosave_interval_secs: 30,
            max_draft_age_hours: 24,
            total_steps: 4,
            validation_mode: ValidationMode::Normal,
            enable_local_drafts: true,
            enable_remote_drafts: true,
            device: "default".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn autosave_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn max_draft_age(&self) -> time::Duration {
        time::Duration::hours(i64::try_from(self.max_draft_age_hours).unwrap_or(i64::MAX / 3600))
    }

    pub fn origin(&self) -> OriginFingerprint {
        OriginFingerprint::from_descriptor(&self.device)
    }

    /// `total_steps`, never below 1.
    pub fn steps(&self) -> u32 {
        self.total_steps.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SessionConfig = toml::from_str(
            r#"
            autosave_interval_secs = 5
            validation_mode = "strict"
            "#,
        )
        .unwrap();
        assert_eq!(config.autosave_interval_secs, 5);
        assert_eq!(config.validation_mode, ValidationMode::Strict);
        assert_eq!(config.max_draft_age_hours, 24);
        assert_eq!(config.total_steps, 4);
        assert!(config.enable_remote_drafts);
    }

    #[test]
    fn zero_steps_is_treated_as_one() {
        let config = SessionConfig {
            total_steps: 0,
            ..SessionConfig::default()
        };
        assert_eq!(config.steps(), 1);
    }
}
