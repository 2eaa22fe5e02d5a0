//! Caller identity supplied by the upstream auth provider.
//!
//! Sign-in happens outside this service; the gateway in front of it forwards the
//! authenticated user as request headers. Only `x-user-id` is required.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_EMAIL: &str = "x-user-email";
pub const HEADER_NAME: &str = "x-user-name";
pub const HEADER_PHOTO: &str = "x-user-photo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn from_parts(parts: &Parts) -> Result<Self, ApiError> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let user_id = header(HEADER_USER_ID).ok_or(ApiError::Unauthorized)?;
        Ok(Self {
            user_id,
            email: header(HEADER_EMAIL),
            display_name: header(HEADER_NAME),
            photo_url: header(HEADER_PHOTO),
        })
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_parts(parts)
    }
}
