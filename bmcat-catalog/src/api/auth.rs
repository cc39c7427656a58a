//! Caller identity extractors
//!
//! Authentication happens upstream of this service. The fronting layer
//! forwards the user reference in `x-bmcat-user`; moderators additionally
//! present the configured admin token as `Authorization: Bearer <token>`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::ApiError;
use crate::AppState;

pub const USER_HEADER: &str = "x-bmcat-user";

/// An identified caller
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: String,
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_HEADER)))?;

        Ok(Caller {
            user: user.to_string(),
        })
    }
}

/// A caller holding the admin token
#[derive(Debug, Clone, Copy)]
pub struct AdminCaller;

#[async_trait]
impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

        match state.admin_token.as_deref() {
            Some(expected) if expected == presented => Ok(AdminCaller),
            Some(_) => Err(ApiError::Forbidden("admin token required".to_string())),
            None => Err(ApiError::Forbidden("no admin token configured".to_string())),
        }
    }
}
