//! Client configuration and mirrored server limits.

use std::time::Duration;

/// Default production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.stridehabit.com/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of additional attempts for retry-wrapped calls.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Server-enforced cap on selected tasks per day, mirrored client-side so
/// an oversized selection fails before it is sent.
pub const MAX_SELECTED_TASKS: usize = 3;

/// Settings for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

impl ApiConfig {
    /// Creates a config pointing at a custom API root.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }
}

/// What a domain store does with an optimistic mutation whose server
/// confirmation failed.
///
/// `Manual` keeps the local mutation in place and only surfaces the error;
/// the caller is expected to re-fetch for consistency. `Revert` restores
/// the pre-mutation snapshot automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    #[default]
    Manual,
    Revert,
}
