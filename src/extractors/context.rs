//! Extract the acting user from the request into a `RequestContext`.

use crate::context::RequestContext;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header fallback for the acting user id. Default: `X-User-ID`.
pub const USER_ID_HEADER: &str = "X-User-ID";

/// Inserted as a request extension by the authentication layer once the session is verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(AuthenticatedUser(id)) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(RequestContext::for_user(*id));
        }
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok());
        Ok(RequestContext { user_id })
    }
}
