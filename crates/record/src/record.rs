//! The in-progress work-history record and typed patches over it.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::Date;

use crate::error::RecordError;
use crate::field::Field;
use crate::value::FieldValue;

// ──────────────────────────────────────────────
// DraftRecord
// ──────────────────────────────────────────────

/// A work-history draft. Holds a value for every [`Field`]; fields the
/// user has not filled carry the empty value for their kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRecord {
    values: BTreeMap<Field, FieldValue>,
}

impl Default for DraftRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftRecord {
    /// An empty record.
    pub fn new() -> Self {
        let values = Field::ALL
            .iter()
            .map(|f| (*f, FieldValue::empty(f.kind())))
            .collect();
        DraftRecord { values }
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        // Every field is populated by `new`, and `set` never removes one.
        static EMPTY_TEXT: FieldValue = FieldValue::Text(String::new());
        self.values.get(&field).unwrap_or(&EMPTY_TEXT)
    }

    /// Replace a field's value, returning the previous one.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<FieldValue, RecordError> {
        check_kind(field, &value)?;
        Ok(self
            .values
            .insert(field, value)
            .unwrap_or_else(|| FieldValue::empty(field.kind())))
    }

    /// Builder form of [`DraftRecord::set`].
    pub fn with(mut self, field: Field, value: FieldValue) -> Result<Self, RecordError> {
        self.set(field, value)?;
        Ok(self)
    }

    /// Apply a patch. Either every entry is written or none is.
    pub fn apply(&mut self, patch: &RecordPatch) -> Result<(), RecordError> {
        for (field, value) in patch.entries() {
            check_kind(*field, value)?;
        }
        for (field, value) in patch.entries() {
            self.values.insert(*field, value.clone());
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }

    pub fn text(&self, field: Field) -> &str {
        self.get(field).as_text().unwrap_or("")
    }

    pub fn number(&self, field: Field) -> Option<i64> {
        self.get(field).as_number()
    }

    pub fn date(&self, field: Field) -> Option<Date> {
        self.get(field).as_date()
    }

    /// Fields whose value differs from `other`.
    pub fn diff(&self, other: &DraftRecord) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| self.get(*f) != other.get(*f))
            .collect()
    }

    /// JSON object keyed by wire names.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(f, v)| (f.name().to_string(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Parse a JSON object. Missing keys keep their empty value and
    /// unknown keys are ignored.
    pub fn from_json(v: &serde_json::Value) -> Result<Self, RecordError> {
        let obj = v.as_object().ok_or(RecordError::NotAnObject)?;
        let mut record = DraftRecord::new();
        for field in Field::ALL {
            if let Some(raw) = obj.get(field.name()) {
                let value = FieldValue::from_json(field.kind(), raw)
                    .map_err(|message| RecordError::InvalidValue { field, message })?;
                record.values.insert(field, value);
            }
        }
        Ok(record)
    }
}

fn check_kind(field: Field, value: &FieldValue) -> Result<(), RecordError> {
    if value.kind() != field.kind() {
        return Err(RecordError::KindMismatch {
            field,
            expected: field.kind(),
            got: value.kind(),
        });
    }
    Ok(())
}

impl Serialize for DraftRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DraftRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        DraftRecord::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

// ──────────────────────────────────────────────
// RecordPatch
// ──────────────────────────────────────────────

/// An ordered set of field assignments. A later entry for the same field
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    entries: Vec<(Field, FieldValue)>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: Field, value: FieldValue) -> Self {
        self.entries.push((field, value));
        self
    }

    pub fn push(&mut self, field: Field, value: FieldValue) {
        self.entries.push((field, value));
    }

    pub fn entries(&self) -> &[(Field, FieldValue)] {
        &self.entries
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a patch from a JSON object of wire names. Unlike
    /// [`DraftRecord::from_json`], unknown keys are rejected.
    pub fn from_json(v: &serde_json::Value) -> Result<Self, RecordError> {
        let obj = v.as_object().ok_or(RecordError::NotAnObject)?;
        let mut patch = RecordPatch::new();
        for (key, raw) in obj {
            let field =
                Field::from_name(key).ok_or_else(|| RecordError::UnknownField(key.clone()))?;
            let value = FieldValue::from_json(field.kind(), raw)
                .map_err(|message| RecordError::InvalidValue { field, message })?;
            patch.push(field, value);
        }
        Ok(patch)
    }
}

impl FromIterator<(Field, FieldValue)> for RecordPatch {
    fn from_iter<I: IntoIterator<Item = (Field, FieldValue)>>(iter: I) -> Self {
        RecordPatch {
            entries: iter.into_iter().collect(),
        }
    }
}
