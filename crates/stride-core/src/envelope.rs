//! Wire-level response envelope shared by every endpoint.

use serde::{Deserialize, Serialize};

/// The envelope every endpoint wraps its payload in.
///
/// `data` carries the typed payload when `success` is true; `error` carries
/// a server-side error string when it is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl<T> ApiEnvelope<T> {
    /// Consumes the envelope and returns its payload, if any.
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// One page of a paginated list payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_deserializes_with_missing_optional_fields() {
        let json = r#"{"success":true,"message":"ok","timestamp":"2026-01-02T03:04:05Z"}"#;
        let envelope: ApiEnvelope<String> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        assert!(envelope.data.is_none());
        assert!(envelope.error.is_none());
    }

    #[test]
    fn page_round_trips() {
        let json = r#"{
            "data": ["a", "b"],
            "pagination": {
                "page": 1, "limit": 20, "total": 2,
                "total_pages": 1, "has_next": false, "has_prev": false
            }
        }"#;
        let page: Page<String> = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 2);
        assert!(!page.pagination.has_next);
    }
}
