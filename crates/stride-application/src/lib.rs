//! Application layer of the Stride client: the session manager, the
//! domain stores (tasks, check-in, social), locally persisted
//! preferences, and the composition root that wires them to the gateway
//! and storage.

pub mod app;
pub mod checkin;
pub mod evict;
pub mod preferences;
pub mod session;
pub mod social;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{StrideApp, StrideAppBuilder};
pub use checkin::{CheckinStore, CompleteTaskRequest, RecordsQuery};
pub use evict::SessionEvictor;
pub use preferences::Preferences;
pub use session::{LoginRequest, RegisterRequest, ResetPasswordRequest, SessionManager};
pub use social::{FriendAction, LeaderboardQuery, NewPost, PostsQuery, SocialStore};
pub use tasks::{HistoryQuery, LibraryFilter, TaskStore};
