//! Validation engine for work-history drafts.
//!
//! Rules are data ([`ValidationRuleSet`]); [`validate`] evaluates them
//! against a [`DraftRecord`](workhist_record::DraftRecord) and returns a
//! [`ValidationReport`] with per-field issues, an overall quality score
//! and a completion rate.

pub mod context;
pub mod engine;
pub mod error;
pub mod report;
pub mod rules;

pub use context::{ValidationContext, ValidationMode};
pub use engine::{completion_rate, validate, ValidationEngine};
pub use error::RuleSetError;
pub use report::{Severity, ValidationIssue, ValidationReport};
pub use rules::{Check, Completion, FieldRule, Subject, Test, TextPattern, ValidationRuleSet};
