//! Authenticated-identity state shared across the client.

use crate::error::ErrorKind;
use crate::model::user::User;

/// Where the session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
    Refreshing,
}

/// Snapshot of the authentication state.
///
/// Holds the invariant that a token is present exactly when the phase is
/// `Authenticated` or `Refreshing`; the constructors below are the only
/// intended way to build one.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub phase: AuthPhase,
    pub user: Option<User>,
    pub token: Option<String>,
    pub last_error: Option<ErrorKind>,
}

impl Session {
    /// A signed-out session with no recorded error.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A signed-in session carrying the issued token.
    pub fn authenticated(user: User, token: String) -> Self {
        Self {
            phase: AuthPhase::Authenticated,
            user: Some(user),
            token: Some(token),
            last_error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, AuthPhase::Authenticated)
    }

    /// Whether an auth transition is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, AuthPhase::Authenticating | AuthPhase::Refreshing)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.id.as_str())
    }
}
