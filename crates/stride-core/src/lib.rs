//! Shared types for the Stride habit-tracking client: the error taxonomy,
//! domain models, response envelope, configuration, and the capability
//! traits the other crates plug into.

pub mod config;
pub mod envelope;
pub mod error;
pub mod model;
pub mod session;
pub mod storage;
pub mod transport;

pub use config::{ApiConfig, RollbackPolicy};
pub use envelope::{ApiEnvelope, Page, Pagination};
pub use error::{ClientError, ErrorKind, StorageError};
pub use session::{AuthPhase, Session};
pub use storage::{KvStore, KvStoreExt, keys};
pub use transport::{HttpMethod, Transport, TransportExt};
