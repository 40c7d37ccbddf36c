//! Request extractors.
//!
//! Authentication happens upstream. The gateway forwards the acting user in
//! the `X-Actor` header, which ends up in `created_by`, `posted_by` and the
//! other audit columns.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use validator::Validate;

use crate::error::ApiError;

/// Header carrying the acting user.
pub const ACTOR_HEADER: &str = "x-actor";

/// Actor recorded for reads without the header.
pub const ANONYMOUS: &str = "anonymous";

fn header_actor(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(ACTOR_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Acting user, `anonymous` when the header is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            header_actor(parts).unwrap_or_else(|| ANONYMOUS.to_string()),
        ))
    }
}

/// Acting user of a mutating request. Rejects with 401 without the header.
///
/// ```ignore
/// async fn handler(RequiredActor(actor): RequiredActor) -> impl IntoResponse {
///     // actor is the X-Actor value
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredActor(pub String);

impl<S> FromRequestParts<S> for RequiredActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_actor(parts).map(Self).ok_or_else(|| {
            ApiError::new(
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "X-Actor header is required",
            )
        })
    }
}

/// Runs the `validator` rules of a request body.
pub fn validated<T: Validate>(payload: T) -> Result<T, ApiError> {
    payload.validate()?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(actor: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(actor) = actor {
            builder = builder.header(ACTOR_HEADER, actor);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_actor_defaults_to_anonymous() {
        let Actor(actor) = Actor::from_request_parts(&mut parts(None), &()).await.unwrap();
        assert_eq!(actor, ANONYMOUS);

        let Actor(actor) = Actor::from_request_parts(&mut parts(Some("bendahara")), &())
            .await
            .unwrap();
        assert_eq!(actor, "bendahara");
    }

    #[tokio::test]
    async fn test_required_actor_rejects_blank() {
        let err = RequiredActor::from_request_parts(&mut parts(Some("  ")), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let RequiredActor(actor) = RequiredActor::from_request_parts(&mut parts(Some("kasir")), &())
            .await
            .unwrap();
        assert_eq!(actor, "kasir");
    }
}
