//! Validation issues and the aggregate report.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious an issue is. Only `Error` blocks submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// A single finding, anchored to a field (or an aggregate anchor such as
/// `technologies`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
    pub code: String,
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Result of validating a whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub issues_by_field: BTreeMap<String, Vec<ValidationIssue>>,
    pub warnings: Vec<ValidationIssue>,
    pub overall_score: u8,
    pub completion_rate: u8,
}

impl ValidationReport {
    /// Assemble a report. `rule_fields` is the number of distinct anchors
    /// carrying rules, used as the score denominator.
    pub fn from_issues(
        issues: Vec<ValidationIssue>,
        rule_fields: usize,
        completion_rate: u8,
    ) -> Self {
        let mut issues_by_field: BTreeMap<String, Vec<ValidationIssue>> = BTreeMap::new();
        for issue in &issues {
            issues_by_field
                .entry(issue.field.clone())
                .or_default()
                .push(issue.clone());
        }

        let error_fields: BTreeSet<&str> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.field.as_str())
            .collect();
        let warning_fields: BTreeSet<&str> = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .map(|i| i.field.as_str())
            .collect();

        let overall_score = overall_score(error_fields.len(), warning_fields.len(), rule_fields);
        let warnings = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .cloned()
            .collect();

        ValidationReport {
            is_valid: error_fields.is_empty(),
            issues,
            issues_by_field,
            warnings,
            overall_score,
            completion_rate,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Issues recorded against one anchor; empty when there are none.
    pub fn field_issues(&self, field: &str) -> &[ValidationIssue] {
        self.issues_by_field
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn field_has_error(&self, field: &str) -> bool {
        self.field_issues(field).iter().any(ValidationIssue::is_error)
    }
}

fn overall_score(error_fields: usize, warning_fields: usize, rule_fields: usize) -> u8 {
    if rule_fields == 0 {
        return 100;
    }
    let n = rule_fields as f64;
    let score = 100.0 - 50.0 * error_fields as f64 / n - 20.0 * warning_fields as f64 / n;
    score.max(0.0).round() as u8
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} (score {}, completion {}%)",
            if self.is_valid { "valid" } else { "invalid" },
            self.overall_score,
            self.completion_rate
        )?;
        for issue in &self.issues {
            writeln!(
                f,
                "  {:<7} {:<20} {:<24} {}",
                issue.severity, issue.field, issue.code, issue.message
            )?;
        }
        Ok(())
    }
}
