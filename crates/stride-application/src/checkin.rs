//! Check-in domain store: completion calls, records, stats, and streaks.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::RwLock;

use stride_core::envelope::Page;
use stride_core::error::ErrorKind;
use stride_core::model::checkin::{CheckIn, CheckInStats, CompletionResult, MakeupResult, StreakInfo};
use stride_core::transport::{Transport, TransportExt, query_of};

/// Everything the check-in slice holds. `stats` is a cached server-side
/// read model; the only local mutation it ever sees is the streak patch.
#[derive(Debug, Clone, Default)]
pub struct CheckinState {
    pub records: Vec<CheckIn>,
    pub stats: Option<CheckInStats>,
    pub loading: bool,
    pub error: Option<ErrorKind>,
}

/// Body of `POST /checkin/complete`.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteTaskRequest {
    pub task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Date-range query for `GET /checkin/records`.
#[derive(Debug, Clone, Default)]
pub struct RecordsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub struct CheckinStore {
    transport: Arc<dyn Transport>,
    state: Arc<RwLock<CheckinState>>,
}

impl CheckinStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Arc::new(RwLock::new(CheckinState::default())),
        }
    }

    pub async fn state(&self) -> CheckinState {
        self.state.read().await.clone()
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn finish(&self) {
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = None;
    }

    async fn fail(&self, kind: ErrorKind) -> ErrorKind {
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = Some(kind);
        kind
    }

    /// Confirms a task completion with the server.
    pub async fn complete_task(
        &self,
        request: &CompleteTaskRequest,
    ) -> Result<CompletionResult, ErrorKind> {
        self.begin().await;
        match self
            .transport
            .post_json::<_, CompletionResult>("/checkin/complete", request)
            .await
        {
            Ok(result) => {
                self.finish().await;
                Ok(result)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Withdraws a completion.
    pub async fn uncomplete_task(&self, task_id: &str) -> Result<(), ErrorKind> {
        self.begin().await;
        let body = serde_json::json!({ "task_id": task_id });
        match self.transport.post_unit("/checkin/uncomplete", &body).await {
            Ok(()) => {
                self.finish().await;
                Ok(())
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn fetch_records(&self, query: &RecordsQuery) -> Result<Vec<CheckIn>, ErrorKind> {
        self.begin().await;
        let query = query_of([
            ("start_date", query.start_date.map(|d| d.to_string())),
            ("end_date", query.end_date.map(|d| d.to_string())),
            ("page", query.page.map(|p| p.to_string())),
            ("limit", query.limit.map(|l| l.to_string())),
        ]);
        match self
            .transport
            .get_json::<Page<CheckIn>>("/checkin/records", &query)
            .await
        {
            Ok(page) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.records = page.data.clone();
                Ok(page.data)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn fetch_stats(&self) -> Result<CheckInStats, ErrorKind> {
        self.begin().await;
        match self
            .transport
            .get_json::<CheckInStats>("/checkin/stats", &[])
            .await
        {
            Ok(stats) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.stats = Some(stats.clone());
                Ok(stats)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Fetches streak info and patches only the two streak fields of the
    /// cached stats snapshot; everything else in it stays server-derived.
    pub async fn fetch_streak(&self) -> Result<StreakInfo, ErrorKind> {
        match self
            .transport
            .get_json::<StreakInfo>("/checkin/streak", &[])
            .await
        {
            Ok(info) => {
                let mut state = self.state.write().await;
                if let Some(stats) = state.stats.as_mut() {
                    stats.current_streak = info.current_streak;
                    stats.max_streak = info.max_streak;
                }
                Ok(info)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Retroactively checks in for a missed day.
    pub async fn makeup_checkin(&self, date: NaiveDate) -> Result<MakeupResult, ErrorKind> {
        self.begin().await;
        let body = serde_json::json!({ "date": date });
        match self
            .transport
            .post_json::<_, MakeupResult>("/checkin/makeup", &body)
            .await
        {
            Ok(result) => {
                self.finish().await;
                Ok(result)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }
}
