//! Session extractors
//!
//! Resolve the caller's session cookie for handlers that need identity.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::session::verify_session_cookie;
use crate::AppState;
use crate::config::SessionConfig;
use crate::data::{SessionId, UserRecord};
use crate::error::AppError;

/// Read and verify the session id carried by the request's cookie
pub fn session_id_from_headers(headers: &HeaderMap, config: &SessionConfig) -> Option<SessionId> {
    let jar = CookieJar::from_headers(headers);
    let cookie = jar.get(&config.cookie_name)?;
    verify_session_cookie(cookie.value(), &config.secret)
}

/// Session id presented by the caller, if it carries a validly signed one
///
/// Says nothing about whether the session is still live.
#[derive(Debug, Clone)]
pub struct SessionCookie(pub Option<SessionId>);

#[async_trait]
impl<S> FromRequestParts<S> for SessionCookie
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(SessionCookie(session_id_from_headers(
            &parts.headers,
            &state.config.session,
        )))
    }
}

/// Extractor for the current authenticated user
///
/// Rejects with `NotAuthenticated` when there is no live session.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<UserRecord>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let session_id = session_id_from_headers(&parts.headers, &state.config.session)
            .ok_or(AppError::NotAuthenticated)?;

        let user = match state.sessions.resolve(&session_id).await {
            Ok(user) => user,
            Err(error) => {
                tracing::warn!(%error, "Session lookup failed; treating caller as logged out");
                None
            }
        }
        .ok_or(AppError::NotAuthenticated)?;

        parts.extensions.insert(user.clone());
        Ok(CurrentUser(user))
    }
}
