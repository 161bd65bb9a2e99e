//! Conformance test suites for draft and record store implementations.
//!
//! Any backend can run these to verify it honours the store contracts:
//!
//! - **Local drafts**: empty load, round trip, replace-on-save, exists/clear
//! - **Remote drafts**: the same contract over the async interface
//! - **Records**: id assignment, update, unknown-id errors
//!
//! # Usage
//!
//! Backend tests call a runner with a factory that creates a fresh, empty
//! store for each test:
//!
//! ```ignore
//! use workhist_storage::conformance::run_local_conformance;
//!
//! #[test]
//! fn file_store_conformance() {
//!     let dir = tempfile::tempdir().unwrap();
//!     let n = std::sync::atomic::AtomicUsize::new(0);
//!     let report = run_local_conformance(|| {
//!         let slot = n.fetch_add(1, std::sync::atomic::Ordering::SeqCst).to_string();
//!         FileDraftStore::new(dir.path(), DraftKey::new("u", &slot))
//!     });
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod local;
mod records;
mod remote;

use std::fmt;
use std::future::Future;

use time::macros::datetime;
use workhist_record::{DraftRecord, Field, FieldValue};

use crate::draft::{DraftMetadata, OriginFingerprint};
use crate::traits::{LocalDraftStore, RecordStore, RemoteDraftStore};

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "local", "remote", "records").
    pub category: String,
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl ConformanceReport {
    fn from_results(results: Vec<TestResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let total = results.len();
        ConformanceReport {
            results,
            passed,
            failed: total - passed,
            total,
        }
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the local draft store suite. `factory` is called once per test and
/// must return an empty store.
pub fn run_local_conformance<S, F>(factory: F) -> ConformanceReport
where
    S: LocalDraftStore,
    F: Fn() -> S,
{
    ConformanceReport::from_results(local::run_local_tests(&factory))
}

/// Run the remote draft store suite.
pub async fn run_remote_conformance<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: RemoteDraftStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    ConformanceReport::from_results(remote::run_remote_tests(&factory).await)
}

/// Run the record store suite.
pub async fn run_record_conformance<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: RecordStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    ConformanceReport::from_results(records::run_record_tests(&factory).await)
}

// ── Helpers: fixtures with sensible defaults ─────────────────────────────────

fn make_record(project_name: &str) -> DraftRecord {
    let mut record = DraftRecord::new();
    let _ = record.set(Field::ProjectName, FieldValue::text(project_name));
    let _ = record.set(Field::Tools, FieldValue::text_set(["git"]));
    let _ = record.set(Field::TeamSize, FieldValue::number(5));
    record
}

fn make_metadata(step: u32, auto_saved: bool) -> DraftMetadata {
    DraftMetadata {
        step,
        total_steps: 4,
        last_modified: datetime!(2025-01-01 00:00:00 UTC),
        origin: OriginFingerprint::from_descriptor("conformance"),
        auto_saved,
    }
}
