//! Persistent key-value capability.
//!
//! The client treats durable storage as an injected capability: string keys
//! to string values, asynchronous, with JSON helpers layered on top.
//! In-memory state is a cache of what lives here, not the source of truth;
//! on process start the session is re-derived from storage.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Well-known storage keys.
pub mod keys {
    /// Bearer token issued at login.
    pub const AUTH_TOKEN: &str = "auth_token";
    /// JSON snapshot of the logged-in user.
    pub const USER_DATA: &str = "user_data";
    /// JSON-encoded application settings.
    pub const APP_SETTINGS: &str = "app_settings";
    /// Whether onboarding has been completed.
    pub const ONBOARDING_COMPLETED: &str = "onboarding_completed";
    /// RFC 3339 timestamp of the last successful task sync.
    pub const LAST_SYNC_TIME: &str = "last_sync_time";
    /// JSON-encoded cache of the active date's task set.
    pub const CACHED_TASKS: &str = "cached_tasks";
    /// Whether notification permission has been granted.
    pub const NOTIFICATION_PERMISSIONS: &str = "notification_permissions";
}

/// Durable, asynchronous string-keyed storage.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads the value for `key`, if present.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    async fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Typed JSON helpers over any [`KvStore`].
#[async_trait]
pub trait KvStoreExt: KvStore {
    /// Reads and decodes a JSON value.
    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encodes and writes a JSON value.
    async fn set_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }

    /// Reads a boolean flag, defaulting when absent or malformed.
    async fn get_flag(&self, key: &str, default: bool) -> Result<bool, StorageError> {
        Ok(self
            .get(key)
            .await?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default))
    }

    /// Writes a boolean flag.
    async fn set_flag(&self, key: &str, value: bool) -> Result<(), StorageError> {
        self.set(key, if value { "true" } else { "false" }).await
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}
