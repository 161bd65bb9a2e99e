//! Declarative rule data.
//!
//! A [`ValidationRuleSet`] is a list of [`FieldRule`]s, each anchored to a
//! name that issues are reported under. Rules are plain serde data and
//! load from TOML or JSON; the engine interprets them without any
//! per-field code.

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use workhist_record::{Field, FieldKind};

use crate::error::RuleSetError;
use crate::report::Severity;

// ──────────────────────────────────────────────
// Patterns
// ──────────────────────────────────────────────

/// A compiled regular expression that serializes as its source text.
#[derive(Clone)]
pub struct TextPattern(Regex);

impl TextPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(TextPattern)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextPattern({:?})", self.0.as_str())
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for TextPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TextPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        TextPattern::new(&source).map_err(|e| {
            serde::de::Error::custom(format!("invalid pattern '{}': {}", source, e))
        })
    }
}

// ──────────────────────────────────────────────
// Checks
// ──────────────────────────────────────────────

/// What a check tests. Checks that do not apply to the subject's value
/// (a length bound on an empty string, a date bound on a null date)
/// produce nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Test {
    /// Blank text, a null or non-positive number, a null date, or an empty set.
    Required,
    MinLength { min: usize },
    MaxLength { max: usize },
    Pattern { pattern: TextPattern },
    MinValue { min: i64 },
    MaxValue { max: i64 },
    MinItems { min: usize },
    MaxItems { max: usize },
    /// Date later than today plus a grace period.
    NotInFuture {
        #[serde(default)]
        grace_months: i32,
    },
    /// Date more than `years` whole years before today.
    WithinYears { years: i32 },
    /// Date strictly earlier than another date field.
    NotBefore { other: Field },
    /// Date on or after `other` but fewer than `months` whole months later.
    MinMonthsAfter { other: Field, months: i32 },
    /// Date more than `months` whole months after `other`.
    MaxMonthsAfter { other: Field, months: i32 },
}

impl Test {
    /// Default issue code for this test at the given declared severity.
    pub fn default_code(&self, severity: Severity) -> &'static str {
        let soft = severity != Severity::Error;
        match self {
            Test::Required => "REQUIRED",
            Test::MinLength { .. } => "MIN_LENGTH",
            Test::MaxLength { .. } if soft => "LENGTH_WARNING",
            Test::MaxLength { .. } => "MAX_LENGTH",
            Test::Pattern { .. } => "INVALID_PATTERN",
            Test::MinValue { .. } if soft => "SIZE_WARNING_MIN",
            Test::MinValue { .. } => "MIN_VALUE",
            Test::MaxValue { .. } if soft => "SIZE_WARNING_MAX",
            Test::MaxValue { .. } => "MAX_VALUE",
            Test::MinItems { .. } => "MIN_ITEMS",
            Test::MaxItems { .. } => "MAX_ITEMS",
            Test::NotInFuture { .. } => "FUTURE_DATE",
            Test::WithinYears { .. } => "TOO_OLD",
            Test::NotBefore { .. } => "END_BEFORE_START",
            Test::MinMonthsAfter { .. } => "SHORT_DURATION",
            Test::MaxMonthsAfter { .. } => "LONG_DURATION",
        }
    }

    /// Whether lenient mode suppresses this test for steps not yet reached.
    pub fn is_presence(&self) -> bool {
        matches!(self, Test::Required | Test::MinItems { .. })
    }

    /// The other field a cross-field test reads.
    pub fn other_field(&self) -> Option<Field> {
        match self {
            Test::NotBefore { other }
            | Test::MinMonthsAfter { other, .. }
            | Test::MaxMonthsAfter { other, .. } => Some(*other),
            _ => None,
        }
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// A test plus how to report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Raise to `Error` in strict mode.
    #[serde(default, skip_serializing_if = "is_false")]
    pub escalate_in_strict: bool,
    pub test: Test,
}

impl Check {
    pub fn error(test: Test) -> Self {
        Check {
            severity: Severity::Error,
            code: None,
            message: None,
            escalate_in_strict: false,
            test,
        }
    }

    pub fn warning(test: Test) -> Self {
        Check {
            severity: Severity::Warning,
            ..Check::error(test)
        }
    }

    pub fn code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn escalating(mut self) -> Self {
        self.escalate_in_strict = true;
        self
    }

    pub fn issue_code(&self) -> &str {
        self.code
            .as_deref()
            .unwrap_or_else(|| self.test.default_code(self.severity))
    }
}

// ──────────────────────────────────────────────
// Rules
// ──────────────────────────────────────────────

/// What a rule reads from the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Field(Field),
    /// Several set fields counted together.
    AnyOf(Vec<Field>),
}

impl Subject {
    pub fn fields(&self) -> Vec<Field> {
        match self {
            Subject::Field(f) => vec![*f],
            Subject::AnyOf(fs) => fs.clone(),
        }
    }
}

/// Contribution of a rule's subject to the completion rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    Required,
    Optional,
    #[default]
    Untracked,
}

impl Completion {
    pub fn weight(&self) -> u32 {
        match self {
            Completion::Required => 2,
            Completion::Optional => 1,
            Completion::Untracked => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Name issues are reported under.
    pub anchor: String,
    /// Human-readable name used in generated messages.
    pub label: String,
    /// Wizard step (1-based) that shows this rule's fields.
    pub step: u32,
    #[serde(default)]
    pub completion: Completion,
    pub subject: Subject,
    #[serde(default)]
    pub checks: Vec<Check>,
}

impl FieldRule {
    fn new(anchor: &str, label: &str, step: u32, subject: Subject, completion: Completion) -> Self {
        FieldRule {
            anchor: anchor.to_string(),
            label: label.to_string(),
            step,
            completion,
            subject,
            checks: Vec::new(),
        }
    }

    fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    fn check_if(mut self, check: Option<Check>) -> Self {
        self.checks.extend(check);
        self
    }

    /// Fields whose value can change this rule's outcome.
    pub fn reads(&self) -> BTreeSet<Field> {
        let mut fields: BTreeSet<Field> = self.subject.fields().into_iter().collect();
        fields.extend(self.checks.iter().filter_map(|c| c.test.other_field()));
        fields
    }
}

// ──────────────────────────────────────────────
// Rule set
// ──────────────────────────────────────────────

/// Characters allowed in names: ASCII alphanumerics, kana, kanji,
/// whitespace and a few punctuation marks.
const NAME_PATTERN: &str =
    r"^[a-zA-Z0-9\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{4E00}-\x{9FAF}\s\-_.,()（）]+$";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationRuleSet {
    #[serde(rename = "rule", default)]
    pub rules: Vec<FieldRule>,
}

impl ValidationRuleSet {
    /// The built-in work-history rules.
    pub fn work_history() -> Self {
        let name_pattern = TextPattern::new(NAME_PATTERN)
            .ok()
            .map(|pattern| Check::error(Test::Pattern { pattern }));
        use Completion::{Optional, Required};
        use Subject::Field as F;

        let rules = vec![
            FieldRule::new("projectName", "Project name", 1, F(Field::ProjectName), Required)
                .check(Check::error(Test::Required))
                .check(Check::error(Test::MinLength { min: 2 }))
                .check(Check::error(Test::MaxLength { max: 100 }))
                .check_if(name_pattern.clone())
                .check(Check::warning(Test::MaxLength { max: 80 })),
            FieldRule::new("startDate", "Start date", 1, F(Field::StartDate), Required)
                .check(Check::error(Test::Required))
                .check(Check::warning(Test::NotInFuture { grace_months: 0 }).escalating())
                .check(Check::warning(Test::WithinYears { years: 50 })),
            FieldRule::new("endDate", "End date", 1, F(Field::EndDate), Optional)
                .check(Check::error(Test::NotBefore {
                    other: Field::StartDate,
                }))
                .check(Check::warning(Test::MinMonthsAfter {
                    other: Field::StartDate,
                    months: 1,
                }))
                .check(Check::warning(Test::MaxMonthsAfter {
                    other: Field::StartDate,
                    months: 120,
                }))
                .check(
                    Check::warning(Test::NotInFuture { grace_months: 12 })
                        .code("TOO_FUTURE")
                        .escalating(),
                ),
            FieldRule::new("industry", "Industry", 1, F(Field::Industry), Required)
                .check(Check::error(Test::Required)),
            FieldRule::new("companyName", "Company name", 1, F(Field::CompanyName), Optional)
                .check(Check::error(Test::MaxLength { max: 100 }))
                .check_if(name_pattern.clone()),
            FieldRule::new("teamSize", "Team size", 1, F(Field::TeamSize), Required)
                .check(Check::error(Test::Required))
                .check(Check::error(Test::MinValue { min: 1 }))
                .check(Check::error(Test::MaxValue { max: 1000 }))
                .check(Check::warning(Test::MinValue { min: 2 }))
                .check(Check::warning(Test::MaxValue { max: 100 })),
            FieldRule::new("role", "Role", 1, F(Field::Role), Required)
                .check(Check::error(Test::Required))
                .check(Check::error(Test::MinLength { min: 2 }))
                .check(Check::error(Test::MaxLength { max: 100 }))
                .check_if(name_pattern.clone()),
            FieldRule::new(
                "projectOverview",
                "Project overview",
                2,
                F(Field::ProjectOverview),
                Required,
            )
            .check(Check::error(Test::Required))
            .check(Check::error(Test::MinLength { min: 10 }))
            .check(Check::error(Test::MaxLength { max: 1000 }))
            .check(Check::warning(Test::MaxLength { max: 800 })),
            FieldRule::new(
                "responsibilities",
                "Responsibilities",
                2,
                F(Field::Responsibilities),
                Required,
            )
            .check(Check::error(Test::Required))
            .check(Check::error(Test::MinLength { min: 10 }))
            .check(Check::error(Test::MaxLength { max: 1000 }))
            .check(Check::warning(Test::MaxLength { max: 800 })),
            FieldRule::new("achievements", "Achievements", 2, F(Field::Achievements), Optional)
                .check(Check::error(Test::MaxLength { max: 1000 }))
                .check(Check::warning(Test::MaxLength { max: 800 })),
            FieldRule::new("notes", "Notes", 2, F(Field::Notes), Optional)
                .check(Check::error(Test::MaxLength { max: 500 })),
            FieldRule::new("processes", "Processes", 2, F(Field::Processes), Required)
                .check(Check::error(Test::Required))
                .check(Check::error(Test::MaxItems { max: 10 })),
            FieldRule::new(
                "technologies",
                "Technologies",
                3,
                Subject::AnyOf(vec![
                    Field::ProgrammingLanguages,
                    Field::ServersDatabases,
                    Field::Tools,
                ]),
                Required,
            )
            .check(Check::error(Test::MinItems { min: 1 }).code("MIN_TOTAL_TECHNOLOGIES"))
            .check(Check::warning(Test::MinItems { min: 3 }).code("RECOMMENDED_TECHNOLOGIES")),
        ];
        ValidationRuleSet { rules }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RuleSetError> {
        let set: ValidationRuleSet =
            toml::from_str(text).map_err(|e| RuleSetError::Parse(e.to_string()))?;
        set.check()?;
        Ok(set)
    }

    pub fn from_json_str(text: &str) -> Result<Self, RuleSetError> {
        let set: ValidationRuleSet =
            serde_json::from_str(text).map_err(|e| RuleSetError::Parse(e.to_string()))?;
        set.check()?;
        Ok(set)
    }

    pub fn to_toml_string(&self) -> Result<String, RuleSetError> {
        toml::to_string_pretty(self).map_err(|e| RuleSetError::Serialize(e.to_string()))
    }

    /// Structural checks not expressible in serde: unique, non-empty
    /// anchors and aggregate subjects over set fields only.
    pub fn check(&self) -> Result<(), RuleSetError> {
        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            if rule.anchor.trim().is_empty() {
                return Err(RuleSetError::Malformed {
                    anchor: rule.anchor.clone(),
                    reason: "anchor is empty".into(),
                });
            }
            if !seen.insert(rule.anchor.as_str()) {
                return Err(RuleSetError::DuplicateAnchor(rule.anchor.clone()));
            }
            if let Subject::AnyOf(fields) = &rule.subject {
                if fields.is_empty() {
                    return Err(RuleSetError::Malformed {
                        anchor: rule.anchor.clone(),
                        reason: "any_of lists no fields".into(),
                    });
                }
                if let Some(f) = fields
                    .iter()
                    .find(|f| !matches!(f.kind(), FieldKind::TextSet | FieldKind::NumberSet))
                {
                    return Err(RuleSetError::Malformed {
                        anchor: rule.anchor.clone(),
                        reason: format!("any_of field '{}' is not a set field", f),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn rule(&self, anchor: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.anchor == anchor)
    }

    /// Number of distinct anchors, the score denominator.
    pub fn anchor_count(&self) -> usize {
        self.rules
            .iter()
            .map(|r| r.anchor.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Display label for a field: the label of the rule anchored at its
    /// wire name, or the wire name itself.
    pub fn label_for(&self, field: Field) -> String {
        self.rule(field.name())
            .map(|r| r.label.clone())
            .unwrap_or_else(|| field.name().to_string())
    }
}
