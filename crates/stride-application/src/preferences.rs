//! Typed accessors for locally persisted preferences and flags.

use std::sync::Arc;

use stride_core::error::StorageError;
use stride_core::model::settings::AppSettings;
use stride_core::storage::{KvStore, KvStoreExt, keys};

/// Settings and flags that never touch the network.
pub struct Preferences {
    storage: Arc<dyn KvStore>,
}

impl Preferences {
    pub fn new(storage: Arc<dyn KvStore>) -> Self {
        Self { storage }
    }

    /// Current settings, defaulting when nothing is stored yet.
    pub async fn settings(&self) -> Result<AppSettings, StorageError> {
        Ok(self
            .storage
            .get_json(keys::APP_SETTINGS)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        self.storage.set_json(keys::APP_SETTINGS, settings).await
    }

    pub async fn onboarding_completed(&self) -> Result<bool, StorageError> {
        self.storage.get_flag(keys::ONBOARDING_COMPLETED, false).await
    }

    pub async fn set_onboarding_completed(&self, completed: bool) -> Result<(), StorageError> {
        self.storage
            .set_flag(keys::ONBOARDING_COMPLETED, completed)
            .await
    }

    pub async fn notifications_permitted(&self) -> Result<bool, StorageError> {
        self.storage
            .get_flag(keys::NOTIFICATION_PERMISSIONS, false)
            .await
    }

    pub async fn set_notifications_permitted(&self, permitted: bool) -> Result<(), StorageError> {
        self.storage
            .set_flag(keys::NOTIFICATION_PERMISSIONS, permitted)
            .await
    }
}
