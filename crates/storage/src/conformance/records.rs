use std::future::Future;

use super::{make_record, TestResult};
use crate::{RecordStore, StorageError};

pub(super) async fn run_record_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "records",
        "create_assigns_distinct_ids",
        create_assigns_distinct_ids(factory).await,
    ));
    results.push(TestResult::from_result(
        "records",
        "update_replaces_record",
        update_replaces_record(factory).await,
    ));
    results.push(TestResult::from_result(
        "records",
        "update_unknown_id_returns_not_found",
        update_unknown_id_returns_not_found(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn create_assigns_distinct_ids<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let a = s
        .create(&make_record("a"))
        .await
        .map_err(|e| e.to_string())?;
    let b = s
        .create(&make_record("b"))
        .await
        .map_err(|e| e.to_string())?;
    if a.id.is_empty() || a.id == b.id {
        return Err(format!("ids not distinct: '{}' and '{}'", a.id, b.id));
    }
    if a.record != make_record("a") {
        return Err("created record differs from input".into());
    }
    Ok(())
}

async fn update_replaces_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let created = s
        .create(&make_record("before"))
        .await
        .map_err(|e| e.to_string())?;
    let updated = s
        .update(&created.id, &make_record("after"))
        .await
        .map_err(|e| e.to_string())?;
    if updated.id != created.id {
        return Err(format!("update changed id {} -> {}", created.id, updated.id));
    }
    if updated.record != make_record("after") {
        return Err("update did not replace the record".into());
    }
    Ok(())
}

async fn update_unknown_id_returns_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.update("no-such-record", &make_record("x")).await {
        Err(StorageError::RecordNotFound { id }) if id == "no-such-record" => Ok(()),
        Err(e) => Err(format!("expected RecordNotFound, got {}", e)),
        Ok(_) => Err("expected RecordNotFound, got Ok".into()),
    }
}
