//! # Cursor Utilities
//!
//! Opaque keyset-pagination cursors: base64-encoded JSON of the last row's
//! `(created_at, id)` pair, with validation and size checks on decode.

use crate::error::ApiError;
use axum::http::StatusCode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Keyset position of the last row returned on the previous page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorData {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

/// Encode cursor data as an opaque base64 string
pub fn encode_cursor(created_at: &DateTime<Utc>, id: &Uuid) -> String {
    let cursor_data = CursorData {
        created_at: *created_at,
        id: *id,
    };
    let json = serde_json::to_string(&cursor_data).expect("cursor data serializes");
    base64::engine::general_purpose::STANDARD.encode(json.as_bytes())
}

/// Decode cursor data from an opaque base64 string with validation
pub fn decode_cursor(cursor: &str) -> Result<CursorData, ApiError> {
    // Cap raw input length before doing any work
    if cursor.len() > 1000 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "cursor is too long",
        ));
    }

    if cursor.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "cursor cannot be empty",
        ));
    }

    if !cursor
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
    {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "cursor contains invalid characters",
        ));
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(cursor)
        .map_err(|_| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                "cursor is not valid base64",
            )
        })?;

    if decoded.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "cursor is empty after decoding",
        ));
    }

    if decoded.len() > 500 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "decoded cursor is too large",
        ));
    }

    let json = String::from_utf8(decoded).map_err(|_| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "cursor contains invalid UTF-8 data",
        )
    })?;

    let cursor_data: CursorData = serde_json::from_str(&json).map_err(|_| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "cursor contains invalid JSON structure",
        )
    })?;

    if cursor_data.id == Uuid::nil() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "cursor contains invalid ID",
        ));
    }

    Ok(cursor_data)
}
