//! # Common API Types
//!
//! Shared types used across handlers: the pagination wrapper and the
//! limit/cursor resolution used by cursor-paginated list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::PaginationConfig;
use crate::cursor::{CursorData, decode_cursor};
use crate::error::ApiError;

/// Generic paginated response wrapper for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// List of items for the current page
    pub data: Vec<T>,
    /// Opaque cursor for fetching the next page (null if this is the last page)
    pub next_cursor: Option<String>,
    /// Convenience field indicating if more pages exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response
    pub fn new(data: Vec<T>, next_cursor: Option<String>) -> Self {
        let has_more = next_cursor.is_some();
        Self {
            data,
            next_cursor,
            has_more: Some(has_more),
        }
    }
}

/// Resolves a raw `limit`/`cursor` query pair into the effective page size
/// and decoded cursor position.
///
/// An empty cursor string is treated as absent; a malformed one is a
/// validation error.
pub fn resolve_page(
    limit: Option<u64>,
    cursor: Option<&str>,
    pagination: &PaginationConfig,
) -> Result<(u64, Option<CursorData>), ApiError> {
    let limit = pagination.clamp_limit(limit);

    let cursor = match cursor {
        None | Some("") => None,
        Some(raw) => Some(decode_cursor(raw)?),
    };

    Ok((limit, cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::encode_cursor;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn resolve_clamps_limit_and_decodes_cursor() {
        let pagination = PaginationConfig {
            default_page_size: 25,
            max_page_size: 100,
        };

        let encoded = encode_cursor(&Utc::now(), &Uuid::new_v4());
        let (limit, cursor) = resolve_page(Some(500), Some(&encoded), &pagination).unwrap();
        assert_eq!(limit, 100);
        assert!(cursor.is_some());

        let (limit, cursor) = resolve_page(None, Some(""), &pagination).unwrap();
        assert_eq!(limit, 25);
        assert!(cursor.is_none());
    }

    #[test]
    fn resolve_rejects_garbage_cursor() {
        let pagination = PaginationConfig::default();
        assert!(resolve_page(None, Some("@@not-base64@@"), &pagination).is_err());
    }
}
