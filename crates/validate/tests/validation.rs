use time::macros::date;
use workhist_record::{DraftRecord, Field, FieldValue};
use workhist_validate::{
    validate, Severity, ValidationContext, ValidationEngine, ValidationMode, ValidationRuleSet,
};

fn ctx() -> ValidationContext {
    ValidationContext::new(date!(2024 - 06 - 15))
}

fn complete_record() -> DraftRecord {
    DraftRecord::from_json(&serde_json::json!({
        "projectName": "顧客管理システム刷新",
        "startDate": "2022-04-01",
        "endDate": "2023-03-31",
        "industry": 3,
        "companyName": "株式会社サンプル",
        "teamSize": 8,
        "role": "PL",
        "projectOverview": "基幹システムのクラウド移行プロジェクト",
        "responsibilities": "要件定義から結合テストまでを担当",
        "processes": [1, 2, 3],
        "programmingLanguages": ["Rust", "TypeScript"],
        "serversDatabases": ["PostgreSQL"],
        "tools": ["Git"]
    }))
    .unwrap()
}

fn codes_for<'a>(report: &'a workhist_validate::ValidationReport, field: &str) -> Vec<&'a str> {
    report
        .field_issues(field)
        .iter()
        .map(|i| i.code.as_str())
        .collect()
}

#[test]
fn empty_record_is_invalid_with_required_errors() {
    let report = ValidationEngine::default().validate(&DraftRecord::new(), &ctx());
    assert!(!report.is_valid);
    assert_eq!(codes_for(&report, "projectName"), vec!["REQUIRED"]);
    assert_eq!(report.completion_rate, 0);
    // nine anchors in error, one warning, thirteen anchors overall
    assert_eq!(report.overall_score, 64);
    assert_eq!(
        codes_for(&report, "technologies"),
        vec!["MIN_TOTAL_TECHNOLOGIES", "RECOMMENDED_TECHNOLOGIES"]
    );
}

#[test]
fn end_before_start_is_reported_on_end_date() {
    let record = DraftRecord::new()
        .with(Field::StartDate, FieldValue::date(date!(2024 - 04 - 01)))
        .unwrap()
        .with(Field::EndDate, FieldValue::date(date!(2024 - 03 - 01)))
        .unwrap();
    let report = ValidationEngine::default().validate(&record, &ctx());
    let end = report.field_issues("endDate");
    assert!(end
        .iter()
        .any(|i| i.code == "END_BEFORE_START" && i.severity == Severity::Error));
    assert!(report.field_issues("startDate").is_empty());
}

#[test]
fn complete_record_is_valid_and_clean() {
    let report = ValidationEngine::default().validate(&complete_record(), &ctx());
    assert!(report.is_valid, "{}", report);
    assert!(report.issues.is_empty(), "{}", report);
    assert_eq!(report.overall_score, 100);
    // 18 of 18 required weight, 2 of 4 optional weight
    assert_eq!(report.completion_rate, 91);
}

#[test]
fn validation_is_idempotent() {
    let engine = ValidationEngine::default();
    let record = complete_record()
        .with(Field::TeamSize, FieldValue::number(500))
        .unwrap();
    assert_eq!(engine.validate(&record, &ctx()), engine.validate(&record, &ctx()));
}

#[test]
fn filling_required_fields_never_lowers_completion() {
    let engine = ValidationEngine::default();
    let full = complete_record();
    let mut record = DraftRecord::new();
    let mut last = engine.completion_rate(&record);
    for field in Field::ALL {
        record.set(field, full.get(field).clone()).unwrap();
        let rate = engine.completion_rate(&record);
        assert!(rate >= last, "{} lowered completion", field);
        last = rate;
    }
}

#[test]
fn errors_iff_invalid() {
    let engine = ValidationEngine::default();
    let samples = vec![
        DraftRecord::new(),
        complete_record(),
        complete_record()
            .with(Field::Notes, FieldValue::text("x".repeat(501)))
            .unwrap(),
        complete_record()
            .with(Field::TeamSize, FieldValue::number(150))
            .unwrap(),
    ];
    for record in samples {
        for mode in [ValidationMode::Strict, ValidationMode::Normal, ValidationMode::Lenient] {
            let report = engine.validate(&record, &ctx().with_mode(mode));
            assert_eq!(report.errors().next().is_some(), !report.is_valid);
        }
    }
}

#[test]
fn warnings_do_not_block_but_lower_score() {
    let record = complete_record()
        .with(Field::TeamSize, FieldValue::number(150))
        .unwrap();
    let report = ValidationEngine::default().validate(&record, &ctx());
    assert!(report.is_valid);
    assert_eq!(codes_for(&report, "teamSize"), vec!["SIZE_WARNING_MAX"]);
    // 100 - 20/13
    assert_eq!(report.overall_score, 98);
}

#[test]
fn strict_mode_escalates_future_start() {
    let record = complete_record()
        .with(Field::StartDate, FieldValue::date(date!(2024 - 07 - 01)))
        .unwrap()
        .with(Field::EndDate, FieldValue::Date(None))
        .unwrap();
    let engine = ValidationEngine::default();

    let normal = engine.validate(&record, &ctx());
    assert!(normal.is_valid);
    assert_eq!(normal.field_issues("startDate")[0].severity, Severity::Warning);

    let strict = engine.validate(&record, &ctx().with_mode(ValidationMode::Strict));
    assert!(!strict.is_valid);
    let issue = &strict.field_issues("startDate")[0];
    assert_eq!(issue.code, "FUTURE_DATE");
    assert_eq!(issue.severity, Severity::Error);
}

#[test]
fn end_date_far_in_future_is_too_future() {
    let record = complete_record()
        .with(Field::EndDate, FieldValue::date(date!(2025 - 09 - 01)))
        .unwrap();
    let report = ValidationEngine::default().validate(&record, &ctx());
    assert_eq!(codes_for(&report, "endDate"), vec!["TOO_FUTURE"]);
}

#[test]
fn lenient_mode_suppresses_required_for_unreached_steps() {
    let engine = ValidationEngine::default();
    let lenient = ctx().with_mode(ValidationMode::Lenient).reached(1);
    let report = engine.validate(&DraftRecord::new(), &lenient);
    assert!(report.field_issues("projectOverview").is_empty());
    assert!(report.field_issues("processes").is_empty());
    assert!(report.field_issues("technologies").is_empty());
    assert_eq!(codes_for(&report, "projectName"), vec!["REQUIRED"]);

    // bounds on unreached steps still apply
    let record = DraftRecord::new()
        .with(Field::Notes, FieldValue::text("x".repeat(501)))
        .unwrap();
    let report = engine.validate(&record, &lenient);
    assert_eq!(codes_for(&report, "notes"), vec!["MAX_LENGTH"]);
}

#[test]
fn too_old_start_is_a_warning() {
    let record = complete_record()
        .with(Field::StartDate, FieldValue::date(date!(1970 - 01 - 01)))
        .unwrap()
        .with(Field::EndDate, FieldValue::Date(None))
        .unwrap();
    let report = ValidationEngine::default().validate(&record, &ctx());
    assert_eq!(codes_for(&report, "startDate"), vec!["TOO_OLD"]);
    assert!(report.is_valid);
}

#[test]
fn huge_month_offsets_in_loaded_rules_raise_no_issue() {
    let rules = ValidationRuleSet::from_toml_str(
        r#"
        [[rule]]
        anchor = "startDate"
        label = "Start date"
        step = 1
        subject = { field = "startDate" }
        checks = [
            { test = { kind = "not_in_future", grace_months = 2147483647 } },
            { test = { kind = "not_in_future", grace_months = -2147483648 } },
        ]
        "#,
    )
    .unwrap();
    let record = complete_record();
    let report = validate(&record, &rules, &ctx());
    assert!(report.is_valid, "{}", report);
    assert!(codes_for(&report, "startDate").is_empty());
}

#[test]
fn rules_loaded_from_toml_drive_the_engine() {
    let rules = ValidationRuleSet::from_toml_str(
        r#"
        [[rule]]
        anchor = "role"
        label = "Role"
        step = 1
        completion = "required"
        subject = { field = "role" }
        checks = [
            { test = { kind = "required" } },
            { severity = "info", code = "SHORT_ROLE", test = { kind = "min_length", min = 4 } },
        ]
        "#,
    )
    .unwrap();
    let record = DraftRecord::new()
        .with(Field::Role, FieldValue::text("PM"))
        .unwrap();
    let report = validate(&record, &rules, &ctx());
    assert!(report.is_valid);
    assert_eq!(codes_for(&report, "role"), vec!["SHORT_ROLE"]);
    assert_eq!(report.completion_rate, 100);
    assert_eq!(report.overall_score, 100);
}
