use super::{make_metadata, make_record, TestResult};
use crate::LocalDraftStore;

pub(super) fn run_local_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: LocalDraftStore,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "local",
            "empty_store_loads_none",
            empty_store_loads_none(factory),
        ),
        TestResult::from_result(
            "local",
            "save_then_load_round_trips",
            save_then_load_round_trips(factory),
        ),
        TestResult::from_result(
            "local",
            "save_replaces_previous_draft",
            save_replaces_previous_draft(factory),
        ),
        TestResult::from_result(
            "local",
            "exists_tracks_save_and_clear",
            exists_tracks_save_and_clear(factory),
        ),
        TestResult::from_result(
            "local",
            "clear_on_empty_store_succeeds",
            clear_on_empty_store_succeeds(factory),
        ),
    ]
}

// ── Test implementations ──────────────────────────────────────────────────────

fn empty_store_loads_none<S, F>(factory: &F) -> Result<(), String>
where
    S: LocalDraftStore,
    F: Fn() -> S,
{
    let s = factory();
    match s.load().map_err(|e| e.to_string())? {
        None => Ok(()),
        Some(d) => Err(format!("expected no draft, got step {}", d.metadata.step)),
    }
}

/// Record and metadata come back exactly as saved.
fn save_then_load_round_trips<S, F>(factory: &F) -> Result<(), String>
where
    S: LocalDraftStore,
    F: Fn() -> S,
{
    let s = factory();
    let record = make_record("Ledger");
    let meta = make_metadata(2, true);
    s.save(&record, &meta).map_err(|e| e.to_string())?;
    let draft = s
        .load()
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    if draft.record != record {
        return Err("loaded record differs from saved record".into());
    }
    if draft.metadata != meta {
        return Err(format!(
            "loaded metadata differs: {:?} vs {:?}",
            draft.metadata, meta
        ));
    }
    Ok(())
}

/// A second save replaces the first; nothing is appended.
fn save_replaces_previous_draft<S, F>(factory: &F) -> Result<(), String>
where
    S: LocalDraftStore,
    F: Fn() -> S,
{
    let s = factory();
    s.save(&make_record("first"), &make_metadata(1, true))
        .map_err(|e| e.to_string())?;
    s.save(&make_record("second"), &make_metadata(3, false))
        .map_err(|e| e.to_string())?;
    let draft = s
        .load()
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    if draft.record != make_record("second") || draft.metadata.step != 3 {
        return Err("second save did not replace the first".into());
    }
    Ok(())
}

fn exists_tracks_save_and_clear<S, F>(factory: &F) -> Result<(), String>
where
    S: LocalDraftStore,
    F: Fn() -> S,
{
    let s = factory();
    if s.exists() {
        return Err("fresh store reports exists".into());
    }
    s.save(&make_record("x"), &make_metadata(1, false))
        .map_err(|e| e.to_string())?;
    if !s.exists() {
        return Err("exists() false after save".into());
    }
    s.clear().map_err(|e| e.to_string())?;
    if s.exists() {
        return Err("exists() true after clear".into());
    }
    if s.load().map_err(|e| e.to_string())?.is_some() {
        return Err("load() returned a draft after clear".into());
    }
    Ok(())
}

fn clear_on_empty_store_succeeds<S, F>(factory: &F) -> Result<(), String>
where
    S: LocalDraftStore,
    F: Fn() -> S,
{
    let s = factory();
    s.clear().map_err(|e| e.to_string())
}
