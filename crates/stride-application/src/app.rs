//! Application root: explicit construction and wiring of the gateway,
//! session manager, and domain stores.
//!
//! Nothing here is a singleton; every collaborator is built once and
//! injected, which is also what lets the stores take transport doubles in
//! tests. Cross-store flows (optimistic completion plus check-in
//! confirmation) live here rather than inside a store.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use stride_api::ApiGateway;
use stride_core::config::{ApiConfig, RollbackPolicy};
use stride_core::error::{ErrorKind, StorageError};
use stride_core::model::checkin::CompletionResult;
use stride_core::storage::KvStore;
use stride_core::transport::Transport;
use stride_infrastructure::MemoryKvStore;

use crate::checkin::{CheckinStore, CompleteTaskRequest};
use crate::evict::SessionEvictor;
use crate::preferences::Preferences;
use crate::session::SessionManager;
use crate::social::SocialStore;
use crate::tasks::TaskStore;

/// The composed client.
pub struct StrideApp {
    gateway: Arc<ApiGateway>,
    pub session: SessionManager,
    pub tasks: TaskStore,
    pub checkin: CheckinStore,
    pub social: SocialStore,
    pub preferences: Preferences,
    rollback: RollbackPolicy,
}

/// Step-by-step construction of a [`StrideApp`].
#[derive(Default)]
pub struct StrideAppBuilder {
    config: ApiConfig,
    storage: Option<Arc<dyn KvStore>>,
    rollback: RollbackPolicy,
    initial_date: Option<NaiveDate>,
}

impl StrideAppBuilder {
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Durable storage backend. Defaults to an in-memory store.
    pub fn storage(mut self, storage: Arc<dyn KvStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// How optimistic mutations behave when confirmation fails.
    pub fn rollback_policy(mut self, rollback: RollbackPolicy) -> Self {
        self.rollback = rollback;
        self
    }

    /// Calendar day the task store starts on. Defaults to the local date.
    pub fn initial_date(mut self, date: NaiveDate) -> Self {
        self.initial_date = Some(date);
        self
    }

    pub async fn build(self) -> StrideApp {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryKvStore::new()));
        let gateway = Arc::new(ApiGateway::new(&self.config));
        let transport: Arc<dyn Transport> = gateway.clone();

        let session = SessionManager::new(transport.clone(), storage.clone());
        gateway
            .set_unauthorized_hook(Arc::new(SessionEvictor::new(
                session.state_cell(),
                storage.clone(),
            )))
            .await;

        let initial_date = self
            .initial_date
            .unwrap_or_else(|| Local::now().date_naive());

        StrideApp {
            session,
            tasks: TaskStore::new(transport.clone(), storage.clone(), initial_date),
            checkin: CheckinStore::new(transport.clone()),
            social: SocialStore::new(transport, self.rollback),
            preferences: Preferences::new(storage),
            gateway,
            rollback: self.rollback,
        }
    }
}

impl StrideApp {
    pub fn builder() -> StrideAppBuilder {
        StrideAppBuilder::default()
    }

    /// The underlying gateway, for retry-wrapped or ad-hoc calls.
    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    /// Restores session and cached tasks from storage at process start.
    /// Returns whether a session was restored.
    pub async fn bootstrap(&self) -> Result<bool, StorageError> {
        let restored = self.session.restore().await?;
        self.tasks.restore_cache().await?;
        Ok(restored)
    }

    /// Completes a task: optimistic local toggle, then server
    /// confirmation through the check-in store. On failure the rollback
    /// policy decides whether the toggle is undone.
    pub async fn complete_task(
        &self,
        task_id: &str,
        note: Option<String>,
        photo_url: Option<String>,
    ) -> Result<CompletionResult, ErrorKind> {
        let snapshot = self
            .tasks
            .apply_completion(task_id, true, note.clone(), photo_url.clone())
            .await?;

        let request = CompleteTaskRequest {
            task_id: task_id.to_string(),
            note,
            photo_url,
        };
        match self.checkin.complete_task(&request).await {
            Ok(result) => Ok(result),
            Err(kind) => {
                if self.rollback == RollbackPolicy::Revert {
                    self.tasks.revert_completion(snapshot).await;
                }
                Err(kind)
            }
        }
    }

    /// Withdraws a completion with the same optimistic contract.
    pub async fn uncomplete_task(&self, task_id: &str) -> Result<(), ErrorKind> {
        let snapshot = self.tasks.apply_completion(task_id, false, None, None).await?;

        match self.checkin.uncomplete_task(task_id).await {
            Ok(()) => Ok(()),
            Err(kind) => {
                if self.rollback == RollbackPolicy::Revert {
                    self.tasks.revert_completion(snapshot).await;
                }
                Err(kind)
            }
        }
    }
}
