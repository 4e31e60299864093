//! The HTTP gateway: the single owner of the network client.
//!
//! Every remote call goes through here. The gateway attaches the bearer
//! token and a fresh request id, unwraps the response envelope, and
//! translates every transport- or HTTP-level failure into the closed
//! [`ErrorKind`] taxonomy. A 401 additionally tears the local session down
//! through an injected hook, so "any unauthorized response ends the
//! session" is enforced in exactly one place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use stride_core::config::ApiConfig;
use stride_core::envelope::ApiEnvelope;
use stride_core::error::ErrorKind;
use stride_core::transport::{HttpMethod, Transport};

/// Local-session teardown invoked when any request resolves with 401.
///
/// The implementation must not call back into the gateway; the gateway has
/// already dropped its own token by the time the hook runs.
#[async_trait]
pub trait UnauthorizedHook: Send + Sync {
    async fn session_expired(&self);
}

/// Single chokepoint for all remote calls.
pub struct ApiGateway {
    client: Client,
    base_url: String,
    timeout: Duration,
    retry_attempts: u32,
    token: RwLock<Option<String>>,
    on_unauthorized: RwLock<Option<Arc<dyn UnauthorizedHook>>>,
}

impl ApiGateway {
    /// Builds a gateway from the given configuration.
    ///
    /// Construction is the configuration step; building a second gateway
    /// from the same config yields an equivalent instance.
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            retry_attempts: config.retry_attempts,
            token: RwLock::new(None),
            on_unauthorized: RwLock::new(None),
        }
    }

    /// The configured retry budget for retry-wrapped calls.
    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    /// Runs `op` through [`crate::retry::with_retry`] with this gateway's
    /// configured budget.
    pub async fn request_with_retry<T, F, Fut>(&self, op: F) -> Result<T, ErrorKind>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ErrorKind>>,
    {
        crate::retry::with_retry(self.retry_attempts, op).await
    }

    /// Installs the local-session-clear hook.
    pub async fn set_unauthorized_hook(&self, hook: Arc<dyn UnauthorizedHook>) {
        *self.on_unauthorized.write().await = Some(hook);
    }

    async fn handle_unauthorized(&self) {
        *self.token.write().await = None;
        let hook = self.on_unauthorized.read().await.clone();
        if let Some(hook) = hook {
            hook.session_expired().await;
        }
        warn!("unauthorized response, local session cleared");
    }

    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, ErrorKind> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();
        debug!(%method, path, %request_id, "dispatching request");

        let mut request = self
            .client
            .request(into_method(method), &url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json")
            .header("X-Request-ID", &request_id);

        if let Some(token) = self.token.read().await.as_deref() {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            let kind = classify_transport(&err);
            warn!(%method, path, %request_id, %err, ?kind, "transport failure");
            kind
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized().await;
            return Err(ErrorKind::Unauthorized);
        }
        if !status.is_success() {
            let kind = classify_status(status);
            let detail = response.text().await.unwrap_or_default();
            warn!(%method, path, %request_id, %status, %detail, ?kind, "request failed");
            return Err(kind);
        }

        let envelope: ApiEnvelope<Value> = response.json().await.map_err(|err| {
            warn!(%method, path, %request_id, %err, "malformed response envelope");
            ErrorKind::Unknown
        })?;
        if !envelope.success {
            warn!(
                %method,
                path,
                %request_id,
                message = %envelope.message,
                error = envelope.error.as_deref().unwrap_or(""),
                "server reported failure"
            );
            return Err(ErrorKind::Unknown);
        }

        debug!(%method, path, %request_id, "request succeeded");
        Ok(envelope.into_data().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl Transport for ApiGateway {
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, ErrorKind> {
        self.execute(method, path, query, body).await
    }

    async fn set_token(&self, token: &str) {
        *self.token.write().await = Some(token.to_string());
    }

    async fn clear_token(&self) {
        *self.token.write().await = None;
    }
}

fn into_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn classify_status(status: StatusCode) -> ErrorKind {
    match status.as_u16() {
        400 => ErrorKind::Validation,
        401 => ErrorKind::Unauthorized,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        429 => ErrorKind::RateLimited,
        500..=599 => ErrorKind::Server,
        _ => ErrorKind::Unknown,
    }
}

fn classify_transport(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() {
        ErrorKind::NetworkUnreachable
    } else {
        ErrorKind::Unknown
    }
}
