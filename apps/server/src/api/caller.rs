use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Header the gateway sets to the authenticated user's id.
pub const CALLER_HEADER: &str = "x-user-id";

/// Identity of the user making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub String);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Caller(value.to_string()))
            .ok_or_else(|| ApiError::Unauthorized("Missing caller identity".to_string()))
    }
}
