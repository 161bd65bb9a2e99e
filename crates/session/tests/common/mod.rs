#![allow(dead_code)]

use std::sync::Arc;

use time::macros::datetime;
use workhist_record::DraftRecord;
use workhist_session::{
    Clock, DraftReconciler, DraftStores, FormSession, ManualClock, SessionConfig,
};
use workhist_storage::{MemoryDraftStore, MemoryRecordStore, MemoryRemoteDraftStore};
use workhist_validate::ValidationEngine;

/// In-memory stores plus a manual clock, shared by every reconciler the
/// harness builds (as if the page were reloaded).
pub struct Harness {
    pub local: Arc<MemoryDraftStore>,
    pub remote: Arc<MemoryRemoteDraftStore>,
    pub records: Arc<MemoryRecordStore>,
    pub clock: Arc<ManualClock>,
    pub config: SessionConfig,
}

impl Harness {
    pub fn new() -> Self {
        Harness {
            local: Arc::new(MemoryDraftStore::new()),
            remote: Arc::new(MemoryRemoteDraftStore::new()),
            records: Arc::new(MemoryRecordStore::new()),
            clock: Arc::new(ManualClock::new(datetime!(2024-06-15 09:00:00 UTC))),
            config: SessionConfig {
                device: "laptop/firefox".into(),
                ..SessionConfig::default()
            },
        }
    }

    /// Same stores, different device and settings.
    pub fn with_config(&self, config: SessionConfig) -> Self {
        Harness {
            local: Arc::clone(&self.local),
            remote: Arc::clone(&self.remote),
            records: Arc::clone(&self.records),
            clock: Arc::clone(&self.clock),
            config,
        }
    }

    pub fn reconciler(&self) -> DraftReconciler {
        let stores = DraftStores::new()
            .local(self.local.clone())
            .remote(self.remote.clone());
        let clock: Arc<dyn Clock> = self.clock.clone();
        DraftReconciler::new(stores, self.config.clone(), clock, ValidationEngine::default())
    }

    pub fn session(&self) -> FormSession {
        FormSession::new(self.reconciler(), self.records.clone())
    }
}

pub fn complete_record() -> DraftRecord {
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
