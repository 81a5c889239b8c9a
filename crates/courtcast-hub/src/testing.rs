//! Shared test fixtures: a counting fake of the conference API and
//! canned conference details.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use courtcast_api::{ApiError, ConferenceApi, ConferenceDetails};
use courtcast_core::ids::ConferenceId;

/// Counting fake: serves canned details and records fetch calls.
pub(crate) struct FakeApi {
    details: DashMap<ConferenceId, ConferenceDetails>,
    pub calls: AtomicUsize,
    pub delay_ms: u64,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            details: DashMap::new(),
            calls: AtomicUsize::new(0),
            delay_ms: 0,
        }
    }

    pub fn insert(&self, details: ConferenceDetails) {
        self.details.insert(details.id.clone(), details);
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConferenceApi for FakeApi {
    async fn conference_details(
        &self,
        id: &ConferenceId,
    ) -> Result<ConferenceDetails, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.details
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| ApiError::NotFound(id.clone()))
    }
}

/// Two-participant hearing: a judge ("judge.fudge") and an individual
/// ("claimant.one").
pub(crate) fn details(id: &str) -> ConferenceDetails {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "case_name": "Rex v Carter",
        "scheduled_at": "2026-03-02T10:00:00Z",
        "status": "not_started",
        "participants": [
            {"id": "part-1", "username": "judge.fudge", "display_name": "Judge Fudge", "role": "judge"},
            {"id": "part-2", "username": "claimant.one", "display_name": "Claimant One", "role": "individual"}
        ]
    }))
    .unwrap()
}
