//! Typed model of a work-history draft.
//!
//! A [`DraftRecord`] maps every [`Field`] to a [`FieldValue`] of the
//! field's kind. Records are edited through [`DraftRecord::set`] or
//! atomically through a [`RecordPatch`], and convert to and from the JSON
//! object form used by the draft stores.

pub mod error;
pub mod field;
pub mod record;
pub mod value;

pub use error::RecordError;
pub use field::{Field, FieldKind};
pub use record::{DraftRecord, RecordPatch};
pub use value::{add_months, months_between, parse_date, years_between, FieldValue, DATE_FORMAT};
