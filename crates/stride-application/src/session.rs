//! Session manager: owns the authentication token and user identity.
//!
//! State machine over Anonymous, Authenticating, Authenticated, and
//! Refreshing. Every transition that establishes a token persists the
//! session snapshot first and pushes the token into the gateway in the same
//! commit step; every transition that drops it clears the gateway token in
//! the same step. The two never diverge.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use stride_core::error::{ClientError, ErrorKind, StorageError};
use stride_core::model::user::User;
use stride_core::session::{AuthPhase, Session};
use stride_core::storage::{KvStore, KvStoreExt, keys};
use stride_core::transport::{Transport, TransportExt};

/// Credentials for `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
}

/// Payload for `POST /auth/register`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub nickname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_preferences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wake_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub phone: String,
    pub verification_code: String,
    pub new_password: String,
}

/// What every successful auth endpoint returns.
#[derive(Debug, Clone, Deserialize)]
struct AuthPayload {
    user: User,
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct VerifyPayload {
    user: User,
    valid: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct VerificationCode {
    #[serde(default)]
    code: Option<String>,
}

/// Owns the session state and is the only writer of the gateway token.
pub struct SessionManager {
    state: Arc<RwLock<Session>>,
    storage: Arc<dyn KvStore>,
    transport: Arc<dyn Transport>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn KvStore>) -> Self {
        Self {
            state: Arc::new(RwLock::new(Session::anonymous())),
            storage,
            transport,
        }
    }

    /// Shared session cell, handed to the gateway's unauthorized hook.
    pub(crate) fn state_cell(&self) -> Arc<RwLock<Session>> {
        self.state.clone()
    }

    /// Current session snapshot.
    pub async fn session(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.last_error = None;
    }

    async fn begin(&self, phase: AuthPhase) {
        let mut state = self.state.write().await;
        state.phase = phase;
        state.last_error = None;
    }

    async fn fail_auth(&self, kind: ErrorKind) {
        let mut state = self.state.write().await;
        *state = Session {
            last_error: Some(kind),
            ..Session::anonymous()
        };
    }

    /// Drops the session everywhere: storage, gateway token, memory.
    async fn clear_local(&self) {
        for key in [keys::AUTH_TOKEN, keys::USER_DATA] {
            if let Err(err) = self.storage.remove(key).await {
                warn!(key, %err, "failed to remove persisted session data");
            }
        }
        self.transport.clear_token().await;
        *self.state.write().await = Session::anonymous();
    }

    /// Persists the issued session, then commits it to memory and pushes
    /// the token into the gateway. Nothing is committed if persistence
    /// fails, so a process restart can always trust what storage holds.
    async fn commit_auth(&self, payload: AuthPayload) -> Result<User, ClientError> {
        let persisted = async {
            self.storage.set(keys::AUTH_TOKEN, &payload.token).await?;
            self.storage.set_json(keys::USER_DATA, &payload.user).await
        }
        .await;

        if let Err(err) = persisted {
            // Roll the half-written snapshot back before reporting.
            let _ = self.storage.remove(keys::AUTH_TOKEN).await;
            let _ = self.storage.remove(keys::USER_DATA).await;
            *self.state.write().await = Session::anonymous();
            return Err(err.into());
        }

        self.transport.set_token(&payload.token).await;
        let user = payload.user.clone();
        *self.state.write().await = Session::authenticated(payload.user, payload.token);
        info!(user_id = %user.id, "session established");
        Ok(user)
    }

    async fn authenticate<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<User, ClientError> {
        self.begin(AuthPhase::Authenticating).await;
        match self.transport.post_json::<_, AuthPayload>(path, body).await {
            Ok(payload) => self.commit_auth(payload).await,
            Err(kind) => {
                self.fail_auth(kind).await;
                Err(kind.into())
            }
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<User, ClientError> {
        self.authenticate("/auth/login", &request).await
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, ClientError> {
        self.authenticate("/auth/register", &request).await
    }

    pub async fn login_with_code(
        &self,
        phone: &str,
        verification_code: &str,
    ) -> Result<User, ClientError> {
        let body = serde_json::json!({
            "phone": phone,
            "verification_code": verification_code,
        });
        self.authenticate("/auth/login-with-code", &body).await
    }

    pub async fn login_with_wechat(&self, wechat_code: &str) -> Result<User, ClientError> {
        let body = serde_json::json!({ "wechat_code": wechat_code });
        self.authenticate("/auth/wechat-login", &body).await
    }

    pub async fn login_with_apple(&self, identity_token: &str) -> Result<User, ClientError> {
        let body = serde_json::json!({ "apple_identity_token": identity_token });
        self.authenticate("/auth/apple-login", &body).await
    }

    /// Requests a one-time code for the given phone number. Does not change
    /// session state. Development servers echo the code back.
    pub async fn send_verification_code(&self, phone: &str) -> Result<Option<String>, ClientError> {
        self.clear_error().await;
        let body = serde_json::json!({ "phone": phone });
        match self
            .transport
            .post_json::<_, VerificationCode>("/auth/send-verification", &body)
            .await
        {
            Ok(payload) => Ok(payload.code),
            Err(kind) => {
                self.state.write().await.last_error = Some(kind);
                Err(kind.into())
            }
        }
    }

    /// Exchanges the current token for a fresh one. A failed refresh clears
    /// every trace of the session; a stale token must never remain
    /// reachable.
    pub async fn refresh_token(&self) -> Result<User, ClientError> {
        if self.state.read().await.token.is_none() {
            return Err(ClientError::Api(ErrorKind::Unauthorized));
        }

        self.begin(AuthPhase::Refreshing).await;
        match self
            .transport
            .post_json_empty::<AuthPayload>("/auth/refresh")
            .await
        {
            Ok(payload) => self.commit_auth(payload).await,
            Err(kind) => {
                self.clear_local().await;
                self.state.write().await.last_error = Some(kind);
                Err(kind.into())
            }
        }
    }

    /// Asks the server whether the current token is still valid. An invalid
    /// result clears the session exactly like a logout.
    pub async fn verify_token(&self) -> Result<bool, ClientError> {
        if self.state.read().await.token.is_none() {
            return Err(ClientError::Api(ErrorKind::Unauthorized));
        }

        match self
            .transport
            .post_json_empty::<VerifyPayload>("/auth/verify-token")
            .await
        {
            Ok(payload) if payload.valid => {
                self.state.write().await.user = Some(payload.user);
                Ok(true)
            }
            Ok(_) => {
                debug!("token reported invalid, clearing session");
                self.clear_local().await;
                Ok(false)
            }
            Err(kind) => {
                self.clear_local().await;
                self.state.write().await.last_error = Some(kind);
                Err(kind.into())
            }
        }
    }

    /// Signs out. The server notification is best-effort; local teardown
    /// happens regardless of its outcome.
    pub async fn logout(&self) {
        if let Err(kind) = self.transport.post_empty("/auth/logout").await {
            debug!(?kind, "server logout failed, clearing local session anyway");
        }
        self.clear_local().await;
        info!("session ended");
    }

    /// Resets a password gated by phone + one-time code. Session state is
    /// untouched.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), ClientError> {
        self.clear_error().await;
        match self
            .transport
            .post_unit("/auth/reset-password", &request)
            .await
        {
            Ok(()) => Ok(()),
            Err(kind) => {
                self.state.write().await.last_error = Some(kind);
                Err(kind.into())
            }
        }
    }

    /// Applies an in-memory profile patch. Persisting the new snapshot is a
    /// separate, explicit step (`persist_user`), kept out of the state
    /// update so the update itself stays pure.
    pub async fn update_profile(&self, patch: impl FnOnce(&mut User)) -> Option<User> {
        let mut state = self.state.write().await;
        let user = state.user.as_mut()?;
        patch(user);
        Some(user.clone())
    }

    /// Writes the current user snapshot to storage.
    pub async fn persist_user(&self) -> Result<(), StorageError> {
        let user = self.state.read().await.user.clone();
        match user {
            Some(user) => self.storage.set_json(keys::USER_DATA, &user).await,
            None => Ok(()),
        }
    }

    /// Re-derives the session from storage on process start, without a
    /// network call. Returns whether a session was restored.
    pub async fn restore(&self) -> Result<bool, StorageError> {
        let token = self.storage.get(keys::AUTH_TOKEN).await?;
        let user: Option<User> = self.storage.get_json(keys::USER_DATA).await?;

        match (token, user) {
            (Some(token), Some(user)) => {
                self.transport.set_token(&token).await;
                *self.state.write().await = Session::authenticated(user, token);
                debug!("session restored from storage");
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, user_json};
    use stride_core::storage::KvStoreExt;
    use stride_infrastructure::MemoryKvStore;

    fn auth_payload(id: &str, token: &str) -> serde_json::Value {
        serde_json::json!({ "user": user_json(id), "token": token })
    }

    fn manager() -> (SessionManager, Arc<MockTransport>, Arc<MemoryKvStore>) {
        let transport = MockTransport::new();
        let storage = Arc::new(MemoryKvStore::new());
        let manager = SessionManager::new(transport.clone(), storage.clone());
        (manager, transport, storage)
    }

    #[tokio::test]
    async fn login_persists_token_and_user_snapshot() {
        let (manager, transport, storage) = manager();
        transport.push_ok(auth_payload("u-1", "tok-1")).await;

        let user = manager.login(LoginRequest::default()).await.unwrap();
        assert_eq!(user.id, "u-1");

        assert_eq!(
            storage.get(keys::AUTH_TOKEN).await.unwrap().as_deref(),
            Some("tok-1")
        );
        let snapshot: Option<User> = storage.get_json(keys::USER_DATA).await.unwrap();
        assert_eq!(snapshot.unwrap().id, "u-1");

        let session = manager.session().await;
        assert!(session.is_authenticated());
        assert_eq!(session.token.as_deref(), Some("tok-1"));
        assert_eq!(transport.token().await.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn failed_login_returns_to_anonymous_with_error() {
        let (manager, transport, storage) = manager();
        transport.push_err(ErrorKind::Validation).await;

        let err = manager.login(LoginRequest::default()).await.unwrap_err();
        assert_eq!(err.api_kind(), Some(ErrorKind::Validation));

        let session = manager.session().await;
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
        assert_eq!(session.last_error, Some(ErrorKind::Validation));
        assert!(storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_storage_even_when_the_server_call_fails() {
        let (manager, transport, storage) = manager();
        transport.push_ok(auth_payload("u-1", "tok-1")).await;
        manager.login(LoginRequest::default()).await.unwrap();

        transport.push_err(ErrorKind::NetworkUnreachable).await;
        manager.logout().await;

        assert!(storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
        assert!(storage.get(keys::USER_DATA).await.unwrap().is_none());
        let session = manager.session().await;
        assert!(!session.is_authenticated());
        assert!(session.token.is_none());
        assert!(transport.token().await.is_none());
    }

    #[tokio::test]
    async fn failed_refresh_clears_every_trace_of_the_session() {
        let (manager, transport, storage) = manager();
        transport.push_ok(auth_payload("u-1", "tok-1")).await;
        manager.login(LoginRequest::default()).await.unwrap();

        transport.push_err(ErrorKind::Server).await;
        let err = manager.refresh_token().await.unwrap_err();
        assert_eq!(err.api_kind(), Some(ErrorKind::Server));

        assert!(storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
        let session = manager.session().await;
        assert!(!session.is_authenticated());
        assert!(session.token.is_none());
        assert!(transport.token().await.is_none());
    }

    #[tokio::test]
    async fn successful_refresh_rotates_the_persisted_token() {
        let (manager, transport, storage) = manager();
        transport.push_ok(auth_payload("u-1", "tok-1")).await;
        manager.login(LoginRequest::default()).await.unwrap();

        transport.push_ok(auth_payload("u-1", "tok-2")).await;
        manager.refresh_token().await.unwrap();

        assert_eq!(
            storage.get(keys::AUTH_TOKEN).await.unwrap().as_deref(),
            Some("tok-2")
        );
        assert_eq!(transport.token().await.as_deref(), Some("tok-2"));
        assert!(manager.session().await.is_authenticated());
    }

    #[tokio::test]
    async fn refresh_without_a_token_is_rejected_without_a_request() {
        let (manager, transport, _storage) = manager();
        let err = manager.refresh_token().await.unwrap_err();
        assert_eq!(err.api_kind(), Some(ErrorKind::Unauthorized));
        assert_eq!(transport.call_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_verification_clears_the_session_like_logout() {
        let (manager, transport, storage) = manager();
        transport.push_ok(auth_payload("u-1", "tok-1")).await;
        manager.login(LoginRequest::default()).await.unwrap();

        transport
            .push_ok(serde_json::json!({ "user": user_json("u-1"), "valid": false }))
            .await;
        let valid = manager.verify_token().await.unwrap();
        assert!(!valid);

        assert!(storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
        assert!(!manager.session().await.is_authenticated());
    }

    #[tokio::test]
    async fn restore_rebuilds_the_session_from_storage() {
        let (manager, transport, storage) = manager();
        storage.set(keys::AUTH_TOKEN, "tok-9").await.unwrap();
        storage
            .set(keys::USER_DATA, &user_json("u-9").to_string())
            .await
            .unwrap();

        let restored = manager.restore().await.unwrap();
        assert!(restored);

        let session = manager.session().await;
        assert!(session.is_authenticated());
        assert_eq!(session.user_id(), Some("u-9"));
        assert_eq!(transport.token().await.as_deref(), Some("tok-9"));
        assert_eq!(transport.call_count().await, 0);
    }

    #[tokio::test]
    async fn restore_without_stored_session_stays_anonymous() {
        let (manager, _transport, _storage) = manager();
        assert!(!manager.restore().await.unwrap());
        assert!(!manager.session().await.is_authenticated());
    }

    #[tokio::test]
    async fn profile_update_is_pure_until_persisted() {
        let (manager, transport, storage) = manager();
        transport.push_ok(auth_payload("u-1", "tok-1")).await;
        manager.login(LoginRequest::default()).await.unwrap();

        manager
            .update_profile(|user| user.nickname = "grace".to_string())
            .await
            .unwrap();

        // Storage still holds the original snapshot.
        let stored: Option<User> = storage.get_json(keys::USER_DATA).await.unwrap();
        assert_eq!(stored.unwrap().nickname, "ada");

        manager.persist_user().await.unwrap();
        let stored: Option<User> = storage.get_json(keys::USER_DATA).await.unwrap();
        assert_eq!(stored.unwrap().nickname, "grace");
    }

    #[tokio::test]
    async fn reset_password_leaves_session_state_untouched() {
        let (manager, transport, _storage) = manager();
        transport.push_ok(auth_payload("u-1", "tok-1")).await;
        manager.login(LoginRequest::default()).await.unwrap();

        transport.push_ok(serde_json::Value::Null).await;
        manager
            .reset_password(ResetPasswordRequest {
                phone: "13800000000".into(),
                verification_code: "1234".into(),
                new_password: "hunter2!".into(),
            })
            .await
            .unwrap();

        assert!(manager.session().await.is_authenticated());
    }
}
