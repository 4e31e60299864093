//! Task domain store: the daily task set, the task library, and history.
//!
//! Fetches follow the uniform three-phase contract: mark loading, call the
//! gateway, then either replace the relevant collection wholesale or keep
//! the stale collection and record the error. Concurrent fetches to the
//! same collection are not ordered; the response that completes last wins.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use stride_core::config::MAX_SELECTED_TASKS;
use stride_core::envelope::Page;
use stride_core::error::{ErrorKind, StorageError};
use stride_core::model::task::{DailyTask, Task, TaskCategory, TaskDifficulty, TaskSelection, TaskStats};
use stride_core::storage::{KvStore, KvStoreExt, keys};
use stride_core::transport::{Transport, TransportExt, query_of};

/// Everything the task slice holds.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub selected_date: NaiveDate,
    /// Daily task sets keyed by calendar day. Dates other than the active
    /// one are evicted when the selection moves.
    pub daily: BTreeMap<NaiveDate, Vec<DailyTask>>,
    pub library: Vec<Task>,
    pub history: Vec<DailyTask>,
    pub stats: Option<TaskStats>,
    pub loading: bool,
    pub error: Option<ErrorKind>,
}

impl TaskState {
    fn new(selected_date: NaiveDate) -> Self {
        Self {
            selected_date,
            daily: BTreeMap::new(),
            library: Vec::new(),
            history: Vec::new(),
            stats: None,
            loading: false,
            error: None,
        }
    }
}

/// Library filter for `GET /tasks/library`.
#[derive(Debug, Clone, Default)]
pub struct LibraryFilter {
    pub category: Option<TaskCategory>,
    pub difficulty: Option<TaskDifficulty>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Date-range query for `GET /tasks/history`.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct SelectTasksRequest {
    task_ids: Vec<String>,
    date: NaiveDate,
}

/// Pre-mutation snapshot of a daily task's completion fields, used to
/// revert an optimistic completion whose confirmation failed.
#[derive(Debug, Clone)]
pub struct CompletionSnapshot {
    task_id: String,
    date: NaiveDate,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    note: Option<String>,
    photo_url: Option<String>,
}

/// Persisted form of the active date's task set.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedTasks {
    date: NaiveDate,
    tasks: Vec<DailyTask>,
}

/// Owns the task slice of client state.
pub struct TaskStore {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn KvStore>,
    state: Arc<RwLock<TaskState>>,
}

impl TaskStore {
    pub fn new(
        transport: Arc<dyn Transport>,
        storage: Arc<dyn KvStore>,
        initial_date: NaiveDate,
    ) -> Self {
        Self {
            transport,
            storage,
            state: Arc::new(RwLock::new(TaskState::new(initial_date))),
        }
    }

    pub async fn state(&self) -> TaskState {
        self.state.read().await.clone()
    }

    /// The active date's task set.
    pub async fn daily_tasks(&self) -> Vec<DailyTask> {
        let state = self.state.read().await;
        state
            .daily
            .get(&state.selected_date)
            .cloned()
            .unwrap_or_default()
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn fail(&self, kind: ErrorKind) -> ErrorKind {
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = Some(kind);
        kind
    }

    /// Moves the active date and evicts every other date's entry.
    pub async fn set_selected_date(&self, date: NaiveDate) {
        let mut state = self.state.write().await;
        if state.selected_date != date {
            debug!(%date, "switching selected date");
            state.selected_date = date;
        }
        state.daily.retain(|entry_date, _| *entry_date == date);
    }

    /// Fetches the daily task set; `None` asks the server for today.
    pub async fn fetch_daily_tasks(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DailyTask>, ErrorKind> {
        self.begin().await;
        let query = query_of([("date", date.map(|d| d.to_string()))]);
        match self
            .transport
            .get_json::<TaskSelection>("/tasks/daily", &query)
            .await
        {
            Ok(selection) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.daily.insert(selection.date, selection.tasks.clone());
                Ok(selection.tasks)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Submits the full replacement set of selected task ids for a date.
    ///
    /// The client mirrors the server's response shape by recomputing every
    /// task's `is_selected` flag from membership in the submitted set,
    /// never by toggling individual entries.
    pub async fn select_tasks(&self, date: NaiveDate, task_ids: &[String]) -> Result<(), ErrorKind> {
        if task_ids.len() > MAX_SELECTED_TASKS {
            return Err(self.fail(ErrorKind::Validation).await);
        }

        self.begin().await;
        let body = SelectTasksRequest {
            task_ids: task_ids.to_vec(),
            date,
        };
        match self.transport.post_unit("/tasks/select", &body).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                if let Some(tasks) = state.daily.get_mut(&date) {
                    for task in tasks.iter_mut() {
                        task.is_selected = task_ids.contains(&task.task_id);
                        if !task.is_selected {
                            // Deselection implies the task is no longer
                            // completed for that date.
                            task.is_completed = false;
                            task.completed_at = None;
                        }
                    }
                }
                Ok(())
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn fetch_task_library(&self, filter: &LibraryFilter) -> Result<Vec<Task>, ErrorKind> {
        self.begin().await;
        let query = query_of([
            ("category", filter.category.map(|c| c.as_str().to_string())),
            ("difficulty", filter.difficulty.map(|d| d.as_str().to_string())),
            ("page", filter.page.map(|p| p.to_string())),
            ("limit", filter.limit.map(|l| l.to_string())),
        ]);
        match self
            .transport
            .get_json::<Page<Task>>("/tasks/library", &query)
            .await
        {
            Ok(page) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.library = page.data.clone();
                Ok(page.data)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    /// Fetches one task and refreshes its library entry in place.
    pub async fn fetch_task_detail(&self, task_id: &str) -> Result<Task, ErrorKind> {
        self.begin().await;
        match self
            .transport
            .get_json::<Task>(&format!("/tasks/{task_id}"), &[])
            .await
        {
            Ok(task) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                if let Some(entry) = state.library.iter_mut().find(|t| t.id == task.id) {
                    *entry = task.clone();
                }
                Ok(task)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn fetch_task_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<DailyTask>, ErrorKind> {
        self.begin().await;
        let query = query_of([
            ("start_date", query.start_date.map(|d| d.to_string())),
            ("end_date", query.end_date.map(|d| d.to_string())),
            ("page", query.page.map(|p| p.to_string())),
            ("limit", query.limit.map(|l| l.to_string())),
        ]);
        match self
            .transport
            .get_json::<Page<DailyTask>>("/tasks/history", &query)
            .await
        {
            Ok(page) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = None;
                state.history = page.data.clone();
                Ok(page.data)
            }
            Err(kind) => Err(self.fail(kind).await),
        }
    }

    pub async fn fetch_task_stats(&self, period: Option<&str>) -> Result<TaskStats, ErrorKind> {
        self.begin().await;
        let query = query_of([("period", period.map(str::to_string))]);
        match self
            .transport
            .get_json::<TaskStats>("/tasks/stats", &query)
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

    /// Applies the completion toggle to the active date's set before the
    /// server has confirmed it. The returned snapshot reverses the
    /// transform exactly.
    ///
    /// A task that is not selected for the date cannot be completed.
    pub async fn apply_completion(
        &self,
        task_id: &str,
        completed: bool,
        note: Option<String>,
        photo_url: Option<String>,
    ) -> Result<CompletionSnapshot, ErrorKind> {
        let mut state = self.state.write().await;
        state.error = None;
        let date = state.selected_date;
        let task = state
            .daily
            .get_mut(&date)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.task_id == task_id))
            .ok_or(ErrorKind::NotFound)?;

        if completed && !task.is_selected {
            return Err(ErrorKind::Validation);
        }

        let snapshot = CompletionSnapshot {
            task_id: task_id.to_string(),
            date,
            is_completed: task.is_completed,
            completed_at: task.completed_at,
            note: task.note.clone(),
            photo_url: task.photo_url.clone(),
        };

        task.is_completed = completed;
        if completed {
            task.completed_at = Some(Utc::now());
            task.note = note;
            task.photo_url = photo_url;
        } else {
            task.completed_at = None;
            task.note = None;
            task.photo_url = None;
        }

        Ok(snapshot)
    }

    /// Restores the completion fields captured before an optimistic
    /// mutation. A missing entry (date switched away) makes this a no-op.
    pub async fn revert_completion(&self, snapshot: CompletionSnapshot) {
        let mut state = self.state.write().await;
        if let Some(task) = state
            .daily
            .get_mut(&snapshot.date)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.task_id == snapshot.task_id))
        {
            task.is_completed = snapshot.is_completed;
            task.completed_at = snapshot.completed_at;
            task.note = snapshot.note;
            task.photo_url = snapshot.photo_url;
        }
    }

    /// Persists the active date's task set and stamps the sync time.
    /// Called by the controller layer after a commit, never from inside
    /// the state update itself.
    pub async fn persist_cache(&self) -> Result<(), StorageError> {
        let (date, tasks) = {
            let state = self.state.read().await;
            (
                state.selected_date,
                state
                    .daily
                    .get(&state.selected_date)
                    .cloned()
                    .unwrap_or_default(),
            )
        };
        self.storage
            .set_json(keys::CACHED_TASKS, &CachedTasks { date, tasks })
            .await?;
        self.storage
            .set(keys::LAST_SYNC_TIME, &Utc::now().to_rfc3339())
            .await
    }

    /// Loads the cached task set written by `persist_cache`, for display
    /// before the first fetch completes. Returns whether anything loaded.
    pub async fn restore_cache(&self) -> Result<bool, StorageError> {
        let cached: Option<CachedTasks> = self.storage.get_json(keys::CACHED_TASKS).await?;
        match cached {
            Some(cached) => {
                let mut state = self.state.write().await;
                state.daily.insert(cached.date, cached.tasks);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
