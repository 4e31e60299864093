//! Local-session teardown for unauthorized responses.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use stride_api::UnauthorizedHook;
use stride_core::error::ErrorKind;
use stride_core::session::Session;
use stride_core::storage::{KvStore, keys};

/// Clears the shared session cell and the persisted snapshot when the
/// gateway sees a 401.
///
/// Holds only the session cell and the storage handle; the gateway drops
/// its own token before invoking this, so there is no reference back to it.
pub struct SessionEvictor {
    state: Arc<RwLock<Session>>,
    storage: Arc<dyn KvStore>,
}

impl SessionEvictor {
    pub fn new(state: Arc<RwLock<Session>>, storage: Arc<dyn KvStore>) -> Self {
        Self { state, storage }
    }
}

#[async_trait]
impl UnauthorizedHook for SessionEvictor {
    async fn session_expired(&self) {
        for key in [keys::AUTH_TOKEN, keys::USER_DATA] {
            if let Err(err) = self.storage.remove(key).await {
                warn!(key, %err, "failed to remove persisted session data");
            }
        }
        let mut state = self.state.write().await;
        *state = Session {
            last_error: Some(ErrorKind::Unauthorized),
            ..Session::anonymous()
        };
    }
}
