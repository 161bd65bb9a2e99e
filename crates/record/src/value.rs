//! Field values and the date helpers shared by validation.

use std::collections::BTreeSet;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::field::FieldKind;

/// Calendar date wire format (`YYYY-MM-DD`).
pub const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

// ──────────────────────────────────────────────
// FieldValue
// ──────────────────────────────────────────────

/// A typed field value. Each variant corresponds to one [`FieldKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(Option<i64>),
    Date(Option<Date>),
    TextSet(BTreeSet<String>),
    NumberSet(BTreeSet<i64>),
}

impl FieldValue {
    /// The empty value for a kind: `""`, null, or an empty set.
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Number => FieldValue::Number(None),
            FieldKind::Date => FieldValue::Date(None),
            FieldKind::TextSet => FieldValue::TextSet(BTreeSet::new()),
            FieldKind::NumberSet => FieldValue::NumberSet(BTreeSet::new()),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn number(value: i64) -> Self {
        FieldValue::Number(Some(value))
    }

    pub fn date(value: Date) -> Self {
        FieldValue::Date(Some(value))
    }

    pub fn text_set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::TextSet(items.into_iter().map(Into::into).collect())
    }

    pub fn number_set<I: IntoIterator<Item = i64>>(items: I) -> Self {
        FieldValue::NumberSet(items.into_iter().collect())
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::TextSet(_) => FieldKind::TextSet,
            FieldValue::NumberSet(_) => FieldKind::NumberSet,
        }
    }

    /// Filled means non-null, not a blank string and not an empty set.
    pub fn is_filled(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Number(n) => n.is_some(),
            FieldValue::Date(d) => d.is_some(),
            FieldValue::TextSet(items) => !items.is_empty(),
            FieldValue::NumberSet(items) => !items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => *n,
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            FieldValue::Date(d) => *d,
            _ => None,
        }
    }

    /// Item count for set values, `None` for scalars.
    pub fn item_count(&self) -> Option<usize> {
        match self {
            FieldValue::TextSet(items) => Some(items.len()),
            FieldValue::NumberSet(items) => Some(items.len()),
            _ => None,
        }
    }

    /// JSON form used in stored payloads.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Number(n) => match n {
                Some(n) => serde_json::Value::from(*n),
                None => serde_json::Value::Null,
            },
            FieldValue::Date(d) => match d.and_then(|d| d.format(DATE_FORMAT).ok()) {
                Some(s) => serde_json::Value::String(s),
                None => serde_json::Value::Null,
            },
            FieldValue::TextSet(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
            FieldValue::NumberSet(items) => {
                serde_json::Value::Array(items.iter().map(|n| (*n).into()).collect())
            }
        }
    }

    /// Parse a JSON value as the given kind. `null` is accepted for every
    /// kind and yields the empty value.
    pub fn from_json(kind: FieldKind, v: &serde_json::Value) -> Result<Self, String> {
        if v.is_null() {
            return Ok(FieldValue::empty(kind));
        }
        match kind {
            FieldKind::Text => v
                .as_str()
                .map(FieldValue::text)
                .ok_or_else(|| "expected a string".to_string()),
            FieldKind::Number => v
                .as_i64()
                .map(FieldValue::number)
                .ok_or_else(|| "expected an integer".to_string()),
            FieldKind::Date => {
                let s = v.as_str().ok_or_else(|| "expected a date string".to_string())?;
                if s.trim().is_empty() {
                    return Ok(FieldValue::Date(None));
                }
                parse_date(s).map(FieldValue::date)
            }
            FieldKind::TextSet => {
                let items = v.as_array().ok_or_else(|| "expected an array".to_string())?;
                items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| "expected an array of strings".to_string())
                    })
                    .collect::<Result<BTreeSet<_>, _>>()
                    .map(FieldValue::TextSet)
            }
            FieldKind::NumberSet => {
                let items = v.as_array().ok_or_else(|| "expected an array".to_string())?;
                items
                    .iter()
                    .map(|item| {
                        item.as_i64()
                            .ok_or_else(|| "expected an array of integers".to_string())
                    })
                    .collect::<Result<BTreeSet<_>, _>>()
                    .map(FieldValue::NumberSet)
            }
        }
    }
}

// ──────────────────────────────────────────────
// Date helpers
// ──────────────────────────────────────────────

/// Parse `YYYY-MM-DD`, or an RFC 3339 date-time truncated to its date.
pub fn parse_date(s: &str) -> Result<Date, String> {
    let s = s.trim();
    if let Ok(d) = Date::parse(s, DATE_FORMAT) {
        return Ok(d);
    }
    OffsetDateTime::parse(s, &Rfc3339)
        .map(|dt| dt.date())
        .map_err(|_| format!("invalid date '{}'", s))
}

/// Whole calendar months from `from` to `to`. Negative when `to` is
/// earlier. A partial month (day of month not yet reached) does not count.
pub fn months_between(from: Date, to: Date) -> i32 {
    let mut months = (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32);
    if months > 0 && to.day() < from.day() {
        months -= 1;
    } else if months < 0 && to.day() > from.day() {
        months += 1;
    }
    months
}

/// Whole years from `from` to `to`.
pub fn years_between(from: Date, to: Date) -> i32 {
    months_between(from, to) / 12
}

/// Shift a date by whole months, clamping the day to the target month.
/// `None` when the result falls outside the representable calendar.
pub fn add_months(date: Date, months: i32) -> Option<Date> {
    let zero_based = (date.year() * 12 + (date.month() as i32 - 1)).checked_add(months)?;
    let year = zero_based.div_euclid(12);
    let month = time::Month::try_from(zero_based.rem_euclid(12) as u8 + 1).ok()?;
    let max_day = time::util::days_in_year_month(year, month);
    Date::from_calendar_date(year, month, date.day().min(max_day)).ok()
}
