//! HTTP gateway for the Stride client: bearer-token injection, request-id
//! tracing, error classification, and bounded retry.

pub mod gateway;
pub mod retry;

pub use gateway::{ApiGateway, UnauthorizedHook};
pub use retry::with_retry;
