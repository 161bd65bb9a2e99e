pub(crate) mod config;
pub(crate) mod draft;
pub(crate) mod rules;
pub(crate) mod validate;

use std::path::Path;

use workhist_record::DraftRecord;
use workhist_validate::ValidationRuleSet;

/// Built-in rules, or the file at `path` (JSON when the extension says so,
/// TOML otherwise).
pub(crate) fn load_rules(path: Option<&Path>) -> Result<ValidationRuleSet, String> {
    let Some(path) = path else {
        return Ok(ValidationRuleSet::work_history());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading rules '{}': {}", path.display(), e))?;
    let parsed = if path.extension().is_some_and(|ext| ext == "json") {
        ValidationRuleSet::from_json_str(&text)
    } else {
        ValidationRuleSet::from_toml_str(&text)
    };
    parsed.map_err(|e| format!("invalid rules in '{}': {}", path.display(), e))
}

pub(crate) fn read_record(path: &Path) -> Result<DraftRecord, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| format!("error parsing JSON in '{}': {}", path.display(), e))?;
    DraftRecord::from_json(&value)
        .map_err(|e| format!("invalid record in '{}': {}", path.display(), e))
}
