//! `workhist draft`: the local file store driven through the draft
//! reconciler, so saves carry the same metadata and `show` applies the
//! same staleness and origin checks a session start would.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use time::format_description::well_known::Rfc3339;
use tracing::debug;
use workhist_session::{
    ClearReport, DraftReconciler, DraftStores, RestoreDecision, SaveReport, StoreOutcome,
    SystemClock,
};
use workhist_storage::{DraftKey, FileDraftStore};
use workhist_validate::ValidationEngine;

use super::read_record;
use crate::config::WorkhistConfig;
use crate::{report_error, DraftTarget, OutputFormat};

pub(crate) enum DraftAction {
    Save { file: PathBuf, step: u32 },
    Show,
    Clear,
}

pub(crate) fn cmd_draft(
    action: DraftAction,
    target: &DraftTarget,
    config: &WorkhistConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let store = file_store(target, config);
    let path = store.path();
    debug!(path = %path.display(), "using local draft store");
    let mut session = config.session.clone();
    session.enable_remote_drafts = false;
    let reconciler = DraftReconciler::new(
        DraftStores::new().local(Arc::new(store)),
        session,
        Arc::new(SystemClock),
        ValidationEngine::default(),
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to create async runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };

    match action {
        DraftAction::Save { file, step } => {
            let record = match read_record(&file) {
                Ok(record) => record,
                Err(msg) => {
                    report_error(&msg, output, quiet);
                    process::exit(1);
                }
            };
            match rt.block_on(reconciler.manual_save(&record, step)) {
                Ok(report) => print_saved(&report, &path, output, quiet),
                Err(e) => {
                    report_error(&e.to_string(), output, quiet);
                    process::exit(1);
                }
            }
        }
        DraftAction::Show => match rt.block_on(reconciler.start()) {
            Ok(decision) => print_decision(&decision, output, quiet),
            Err(e) => {
                report_error(&e.to_string(), output, quiet);
                process::exit(1);
            }
        },
        DraftAction::Clear => {
            let report = rt.block_on(reconciler.clear());
            print_cleared(&report, &path, output, quiet);
        }
    }
}

fn file_store(target: &DraftTarget, config: &WorkhistConfig) -> FileDraftStore {
    let storage = &config.storage;
    let dir = target.store.clone().unwrap_or_else(|| storage.dir.clone());
    let user = target.user.as_deref().unwrap_or(&storage.user);
    let slot = target.slot.as_deref().unwrap_or(&storage.slot);
    FileDraftStore::new(dir, DraftKey::new(user, slot)).with_max_bytes(storage.max_bytes)
}

fn print_saved(report: &SaveReport, path: &Path, output: OutputFormat, quiet: bool) {
    if let StoreOutcome::Failed(reason) = &report.local {
        report_error(&format!("draft not saved: {}", reason), output, quiet);
        process::exit(1);
    }
    match output {
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "saved draft to {} (step {} of {})",
                    path.display(),
                    report.metadata.step,
                    report.metadata.total_steps
                );
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "saved": true,
                "path": path.display().to_string(),
                "metadata": report.metadata,
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
    }
}

fn print_decision(decision: &RestoreDecision, output: OutputFormat, quiet: bool) {
    let offer = match decision {
        RestoreDecision::Offer(offer) => offer,
        RestoreDecision::None => {
            match output {
                OutputFormat::Text => {
                    if !quiet {
                        println!("no resumable draft");
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::json!({ "draft": null })),
            }
            return;
        }
    };
    let metadata = &offer.draft.metadata;
    match output {
        OutputFormat::Text => {
            if quiet {
                return;
            }
            let saved_at = metadata
                .last_modified
                .format(&Rfc3339)
                .unwrap_or_else(|_| metadata.last_modified.to_string());
            println!(
                "draft at step {} of {}, {}% complete, saved {} ({} min ago){}",
                metadata.step,
                metadata.total_steps,
                offer.completion_rate,
                saved_at,
                offer.age.whole_minutes(),
                if metadata.auto_saved { ", autosaved" } else { "" }
            );
            let record = serde_json::to_string_pretty(&offer.draft.record.to_json())
                .unwrap_or_default();
            println!("{}", record);
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "draft": {
                    "data": offer.draft.record.to_json(),
                    "metadata": metadata,
                    "completionRate": offer.completion_rate,
                    "ageSeconds": offer.age.whole_seconds(),
                }
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
    }
}

fn print_cleared(report: &ClearReport, path: &Path, output: OutputFormat, quiet: bool) {
    if let StoreOutcome::Failed(reason) = &report.local {
        report_error(&format!("draft not cleared: {}", reason), output, quiet);
        process::exit(1);
    }
    match output {
        OutputFormat::Text => {
            if !quiet {
                println!("cleared draft at {}", path.display());
            }
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "cleared": true, "path": path.display().to_string() })
        ),
    }
}
