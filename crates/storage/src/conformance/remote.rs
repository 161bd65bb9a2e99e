use std::future::Future;

use super::{make_metadata, make_record, TestResult};
use crate::RemoteDraftStore;

pub(super) async fn run_remote_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: RemoteDraftStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "remote",
        "empty_store_loads_none",
        empty_store_loads_none(factory).await,
    ));
    results.push(TestResult::from_result(
        "remote",
        "save_then_load_round_trips",
        save_then_load_round_trips(factory).await,
    ));
    results.push(TestResult::from_result(
        "remote",
        "save_replaces_previous_draft",
        save_replaces_previous_draft(factory).await,
    ));
    results.push(TestResult::from_result(
        "remote",
        "clear_removes_draft",
        clear_removes_draft(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn empty_store_loads_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RemoteDraftStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.load().await.map_err(|e| e.to_string())? {
        None => Ok(()),
        Some(d) => Err(format!("expected no draft, got step {}", d.metadata.step)),
    }
}

async fn save_then_load_round_trips<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RemoteDraftStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let record = make_record("Ledger");
    let meta = make_metadata(2, true);
    s.save(&record, &meta).await.map_err(|e| e.to_string())?;
    let draft = s
        .load()
        .await
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    if draft.record != record || draft.metadata != meta {
        return Err("loaded draft differs from saved draft".into());
    }
    Ok(())
}

async fn save_replaces_previous_draft<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RemoteDraftStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save(&make_record("first"), &make_metadata(1, true))
        .await
        .map_err(|e| e.to_string())?;
    s.save(&make_record("second"), &make_metadata(3, false))
        .await
        .map_err(|e| e.to_string())?;
    let draft = s
        .load()
        .await
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    if draft.record != make_record("second") || draft.metadata.step != 3 {
        return Err("second save did not replace the first".into());
    }
    Ok(())
}

/// Clear removes the draft, and clearing again still succeeds.
async fn clear_removes_draft<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: RemoteDraftStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save(&make_record("x"), &make_metadata(1, false))
        .await
        .map_err(|e| e.to_string())?;
    s.clear().await.map_err(|e| e.to_string())?;
    if s.load().await.map_err(|e| e.to_string())?.is_some() {
        return Err("load() returned a draft after clear".into());
    }
    s.clear()
        .await
        .map_err(|e| format!("second clear failed: {}", e))
}
