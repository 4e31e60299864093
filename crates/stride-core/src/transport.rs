//! Transport seam between the domain stores and the HTTP gateway.
//!
//! Stores depend on this trait rather than on the concrete gateway so they
//! can be exercised against test doubles. The object-safe surface speaks
//! `serde_json::Value`; [`TransportExt`] layers typed requests on top.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::ErrorKind;

/// HTTP verbs the client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single chokepoint for remote calls.
///
/// Implementations attach credentials, classify failures into
/// [`ErrorKind`], and return the envelope's `data` payload (JSON `null`
/// when the endpoint carries none). Token writes come only from the
/// session manager.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a call and returns the unwrapped payload.
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, ErrorKind>;

    /// Updates the bearer token attached to subsequent requests.
    async fn set_token(&self, token: &str);

    /// Drops the bearer token; subsequent requests go out unauthenticated.
    async fn clear_token(&self);
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ErrorKind> {
    serde_json::from_value(value).map_err(|err| {
        warn!(%err, "failed to decode response payload");
        ErrorKind::Unknown
    })
}

fn encode<B: Serialize>(body: &B) -> Result<Value, ErrorKind> {
    serde_json::to_value(body).map_err(|err| {
        warn!(%err, "failed to encode request body");
        ErrorKind::Unknown
    })
}

/// Typed request helpers over any [`Transport`].
#[async_trait]
pub trait TransportExt: Transport {
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ErrorKind> {
        let value = self.send(HttpMethod::Get, path, query, None).await?;
        decode(value)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ErrorKind> {
        let value = self
            .send(HttpMethod::Post, path, &[], Some(encode(body)?))
            .await?;
        decode(value)
    }

    /// POST whose response payload is ignored.
    async fn post_unit<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), ErrorKind> {
        self.send(HttpMethod::Post, path, &[], Some(encode(body)?))
            .await?;
        Ok(())
    }

    /// POST with an empty body and an ignored response payload.
    async fn post_empty(&self, path: &str) -> Result<(), ErrorKind> {
        self.send(HttpMethod::Post, path, &[], None).await?;
        Ok(())
    }

    /// POST with an empty body and a typed response payload.
    async fn post_json_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ErrorKind> {
        let value = self.send(HttpMethod::Post, path, &[], None).await?;
        decode(value)
    }

    async fn put_unit<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), ErrorKind> {
        self.send(HttpMethod::Put, path, &[], Some(encode(body)?))
            .await?;
        Ok(())
    }

    async fn delete_unit(&self, path: &str) -> Result<(), ErrorKind> {
        self.send(HttpMethod::Delete, path, &[], None).await?;
        Ok(())
    }
}

impl<G: Transport + ?Sized> TransportExt for G {}

/// Builds a query list, skipping absent values.
pub fn query_of<I>(pairs: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'static str, Option<String>)>,
{
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
}
