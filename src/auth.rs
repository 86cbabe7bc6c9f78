//! # Authentication and Authorization
//!
//! Operator bearer authentication and tenant header validation for the
//! protected API surface.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized, unauthorized_with_trace_id, validation_error};
use crate::server::AppState;
use crate::telemetry::TraceContext;

/// Tenant ID wrapper for type safety
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantId(pub Uuid);

/// Marker type for authenticated operator requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorAuth;

/// Extractor for the tenant scope established by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct TenantExtension(pub TenantId);

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

fn auth_failure(message: &str, trace_id: Option<String>) -> ApiError {
    match trace_id {
        Some(trace_id) => unauthorized_with_trace_id(Some(message), trace_id),
        None => unauthorized(Some(message)),
    }
}

/// Authentication middleware that validates bearer tokens and tenant headers
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers().clone();

    // Keep the request correlation ID on auth failures so operators can
    // match a 401 back to its access log line.
    let trace_id = request
        .extensions()
        .get::<TraceContext>()
        .map(|ctx| ctx.trace_id.clone());

    let token = extract_bearer_token(&headers, trace_id.clone())?;
    validate_token(&config, token)?;

    let tenant = extract_tenant_id(&headers)?;
    tracing::info!(tenant_id = %tenant.0, "Authenticated operator request");

    let mut request = request;
    request.extensions_mut().insert(TenantExtension(tenant));
    request.extensions_mut().insert(OperatorAuth);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap, trace_id: Option<String>) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| auth_failure("Missing Authorization header", trace_id.clone()))?;

    let header = header
        .to_str()
        .map_err(|_| auth_failure("Invalid Authorization header", trace_id.clone()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| auth_failure("Authorization header must use Bearer scheme", trace_id))
}

fn validate_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .operator_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn extract_tenant_id(headers: &HeaderMap) -> Result<TenantId, ApiError> {
    let header_value = headers
        .get("X-Tenant-Id")
        .ok_or_else(|| {
            validation_error(
                "Missing required header",
                serde_json::json!({ "X-Tenant-Id": "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid tenant header",
                serde_json::json!({ "X-Tenant-Id": "Header must be valid UTF-8" }),
            )
        })?;

    header_value.parse::<Uuid>().map(TenantId).map_err(|_| {
        validation_error(
            "Invalid tenant ID",
            serde_json::json!({ "X-Tenant-Id": "Must be a valid UUID" }),
        )
    })
}

/// OpenAPI header parameter for X-Tenant-Id
#[derive(Debug, Serialize, Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct TenantHeader {
    /// Tenant identifier (UUID) that scopes the request to a specific tenant
    #[serde(rename = "X-Tenant-Id")]
    #[param(rename = "X-Tenant-Id", value_type = String)]
    pub tenant_id: String,
}

impl<S> FromRequestParts<S> for TenantExtension
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantExtension>()
            .cloned()
            .ok_or_else(|| {
                validation_error(
                    "Tenant context missing",
                    serde_json::json!({ "X-Tenant-Id": "Tenant context not present" }),
                )
            })
    }
}

impl<S> FromRequestParts<S> for OperatorAuth
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OperatorAuth>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Operator authentication required")))
    }
}
