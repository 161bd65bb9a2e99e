//! Rule evaluation.
//!
//! Evaluation is total: every check either produces an issue or nothing,
//! and no input makes it fail.

use std::sync::Arc;

use workhist_record::{
    add_months, months_between, years_between, DraftRecord, Field, FieldValue,
};

use crate::context::{ValidationContext, ValidationMode};
use crate::report::{Severity, ValidationIssue, ValidationReport};
use crate::rules::{Check, FieldRule, Subject, Test, ValidationRuleSet};

/// Validate `record` against `rules`.
pub fn validate(
    record: &DraftRecord,
    rules: &ValidationRuleSet,
    ctx: &ValidationContext,
) -> ValidationReport {
    let issues = rules
        .rules
        .iter()
        .flat_map(|rule| evaluate_rule(rule, rules, record, ctx))
        .collect();
    ValidationReport::from_issues(issues, rules.anchor_count(), completion_rate(record, rules))
}

/// Weighted share of tracked subjects that are filled, 0-100. A rule set
/// with no tracked weight reports 100.
pub fn completion_rate(record: &DraftRecord, rules: &ValidationRuleSet) -> u8 {
    let mut max = 0u32;
    let mut filled = 0u32;
    for rule in &rules.rules {
        let weight = rule.completion.weight();
        if weight == 0 {
            continue;
        }
        max += weight;
        let is_filled = rule
            .subject
            .fields()
            .iter()
            .any(|f| record.get(*f).is_filled());
        if is_filled {
            filled += weight;
        }
    }
    if max == 0 {
        return 100;
    }
    (f64::from(filled) * 100.0 / f64::from(max)).round() as u8
}

/// A cheap, cloneable evaluator over a shared rule set.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    rules: Arc<ValidationRuleSet>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(ValidationRuleSet::work_history())
    }
}

impl ValidationEngine {
    pub fn new(rules: ValidationRuleSet) -> Self {
        ValidationEngine {
            rules: Arc::new(rules),
        }
    }

    pub fn rules(&self) -> &ValidationRuleSet {
        &self.rules
    }

    pub fn validate(&self, record: &DraftRecord, ctx: &ValidationContext) -> ValidationReport {
        validate(record, &self.rules, ctx)
    }

    /// Issues for one anchor, as if `value` had been written to `name`.
    ///
    /// `name` may be a field wire name or an aggregate anchor. Unknown
    /// names and values of the wrong kind yield no issues.
    pub fn validate_field(
        &self,
        name: &str,
        value: &FieldValue,
        record: &DraftRecord,
        ctx: &ValidationContext,
    ) -> Vec<ValidationIssue> {
        let Some(rule) = self.rules.rule(name) else {
            return Vec::new();
        };
        match Field::from_name(name) {
            Some(field) => {
                let mut patched = record.clone();
                if patched.set(field, value.clone()).is_err() {
                    return Vec::new();
                }
                evaluate_rule(rule, &self.rules, &patched, ctx)
            }
            None => evaluate_rule(rule, &self.rules, record, ctx),
        }
    }

    /// Anchors of the rules shown on a wizard step.
    pub fn anchors_for_step(&self, step: u32) -> Vec<&str> {
        self.rules
            .rules
            .iter()
            .filter(|r| r.step == step)
            .map(|r| r.anchor.as_str())
            .collect()
    }

    /// Anchors whose outcome depends on `field`.
    pub fn anchors_reading(&self, field: Field) -> Vec<&str> {
        self.rules
            .rules
            .iter()
            .filter(|r| r.reads().contains(&field))
            .map(|r| r.anchor.as_str())
            .collect()
    }

    pub fn completion_rate(&self, record: &DraftRecord) -> u8 {
        completion_rate(record, &self.rules)
    }
}

// ──────────────────────────────────────────────
// Evaluation
// ──────────────────────────────────────────────

/// The value a rule's checks look at.
enum Observed<'a> {
    Value(&'a FieldValue),
    /// Total item count across an `any_of` subject.
    Count(usize),
}

fn evaluate_rule(
    rule: &FieldRule,
    rules: &ValidationRuleSet,
    record: &DraftRecord,
    ctx: &ValidationContext,
) -> Vec<ValidationIssue> {
    let observed = match &rule.subject {
        Subject::Field(f) => Observed::Value(record.get(*f)),
        Subject::AnyOf(fields) => Observed::Count(
            fields
                .iter()
                .filter_map(|f| record.get(*f).item_count())
                .sum(),
        ),
    };
    let suppress_presence =
        ctx.mode == ValidationMode::Lenient && rule.step > ctx.reached_step;

    rule.checks
        .iter()
        .filter(|check| !(suppress_presence && check.test.is_presence()))
        .filter(|check| fails(&check.test, &observed, record, ctx))
        .map(|check| ValidationIssue {
            field: rule.anchor.clone(),
            message: message(check, rule, rules),
            severity: effective_severity(check, ctx.mode),
            code: check.issue_code().to_string(),
        })
        .collect()
}

fn effective_severity(check: &Check, mode: ValidationMode) -> Severity {
    if mode == ValidationMode::Strict && check.escalate_in_strict {
        Severity::Error
    } else {
        check.severity
    }
}

fn fails(
    test: &Test,
    observed: &Observed<'_>,
    record: &DraftRecord,
    ctx: &ValidationContext,
) -> bool {
    let value = match observed {
        Observed::Count(n) => {
            return match test {
                Test::Required => *n == 0,
                Test::MinItems { min } => n < min,
                Test::MaxItems { max } => n > max,
                _ => false,
            };
        }
        Observed::Value(v) => *v,
    };

    match test {
        Test::Required => match value {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(n) => n.map_or(true, |n| n <= 0),
            other => !other.is_filled(),
        },
        Test::MinLength { min } => non_empty_text(value).is_some_and(|s| s.chars().count() < *min),
        Test::MaxLength { max } => non_empty_text(value).is_some_and(|s| s.chars().count() > *max),
        Test::Pattern { pattern } => non_empty_text(value).is_some_and(|s| !pattern.is_match(s)),
        Test::MinValue { min } => value.as_number().is_some_and(|n| n < *min),
        Test::MaxValue { max } => value.as_number().is_some_and(|n| n > *max),
        Test::MinItems { min } => value.item_count().is_some_and(|n| n < *min),
        Test::MaxItems { max } => value.item_count().is_some_and(|n| n > *max),
        Test::NotInFuture { grace_months } => value
            .as_date()
            .zip(add_months(ctx.today, *grace_months))
            .is_some_and(|(d, limit)| d > limit),
        Test::WithinYears { years } => value
            .as_date()
            .is_some_and(|d| years_between(d, ctx.today) > *years),
        Test::NotBefore { other } => match (value.as_date(), record.date(*other)) {
            (Some(d), Some(o)) => d < o,
            _ => false,
        },
        Test::MinMonthsAfter { other, months } => match (value.as_date(), record.date(*other)) {
            (Some(d), Some(o)) => d >= o && months_between(o, d) < *months,
            _ => false,
        },
        Test::MaxMonthsAfter { other, months } => match (value.as_date(), record.date(*other)) {
            (Some(d), Some(o)) => months_between(o, d) > *months,
            _ => false,
        },
    }
}

fn non_empty_text(value: &FieldValue) -> Option<&str> {
    value.as_text().filter(|s| !s.is_empty())
}

fn message(check: &Check, rule: &FieldRule, rules: &ValidationRuleSet) -> String {
    if let Some(m) = &check.message {
        return m.clone();
    }
    let label = &rule.label;
    let soft = check.severity != Severity::Error;
    match &check.test {
        Test::Required => format!("{} is required", label),
        Test::MinLength { min } => format!("{} must be at least {} characters", label, min),
        Test::MaxLength { max } if soft => {
            format!("{} is long; {} characters or fewer is recommended", label, max)
        }
        Test::MaxLength { max } => format!("{} must be at most {} characters", label, max),
        Test::Pattern { .. } => format!("{} contains characters that are not allowed", label),
        Test::MinValue { min } if soft => {
            format!("{} looks small; {} or more is recommended", label, min)
        }
        Test::MinValue { min } => format!("{} must be at least {}", label, min),
        Test::MaxValue { max } if soft => {
            format!("{} looks large; {} or fewer is recommended", label, max)
        }
        Test::MaxValue { max } => format!("{} must be at most {}", label, max),
        Test::MinItems { min } if soft => {
            format!("Selecting {} or more {} is recommended", min, label.to_lowercase())
        }
        Test::MinItems { min } => format!("Select at least {} {}", min, label.to_lowercase()),
        Test::MaxItems { max } => format!("Select at most {} {}", max, label.to_lowercase()),
        Test::NotInFuture { grace_months: 0 } => format!("{} is in the future", label),
        Test::NotInFuture { grace_months } => format!(
            "{} is more than {} months in the future",
            label, grace_months
        ),
        Test::WithinYears { years } => format!("{} is more than {} years ago", label, years),
        Test::NotBefore { other } => format!(
            "{} must not be earlier than {}",
            label,
            rules.label_for(*other).to_lowercase()
        ),
        Test::MinMonthsAfter { other, months } => format!(
            "{} is less than {} month(s) after {}",
            label,
            months,
            rules.label_for(*other).to_lowercase()
        ),
        Test::MaxMonthsAfter { other, months } => format!(
            "{} is more than {} months after {}",
            label,
            months,
            rules.label_for(*other).to_lowercase()
        ),
    }
}
