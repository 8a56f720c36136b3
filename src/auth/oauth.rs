//! Google Sign-In login flow
//!
//! The frontend obtains an ID token from Google and posts it here; the
//! server verifies it and opens a session.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::middleware::SessionCookie;
use super::session::{removal_cookie, session_cookie};
use crate::AppState;
use crate::api::{LoginResponse, SuccessResponse};
use crate::data::UserRecord;
use crate::error::AppError;
use crate::metrics::{LOGINS_TOTAL, LOGOUTS_TOTAL};

/// Create authentication router
///
/// Routes:
/// - POST /auth/google/callback - Exchange an ID token for a session
/// - POST /auth/logout - End the session
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/google/callback", post(google_callback))
        .route("/auth/logout", post(logout))
}

// =============================================================================
// Login
// =============================================================================

/// Body posted by the frontend after Google Sign-In
#[derive(Debug, Deserialize)]
struct CallbackRequest {
    token: Option<String>,
}

/// POST /auth/google/callback
///
/// # Steps
/// 1. Verify the ID token with the provider keys
/// 2. Drop any session the caller already holds
/// 3. Create a session bound to the verified claims
/// 4. Set the session cookie and return the user
async fn google_callback(
    State(state): State<AppState>,
    SessionCookie(previous): SessionCookie,
    jar: CookieJar,
    payload: Result<Json<CallbackRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let token = payload
        .ok()
        .and_then(|Json(body)| body.token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Login callback without an identity token");
            LOGINS_TOTAL.with_label_values(&["rejected"]).inc();
            AppError::Unauthorized
        })?;

    let claims = state.verifier.verify(&token).await.map_err(|error| {
        tracing::warn!(%error, "Error verifying token");
        LOGINS_TOTAL.with_label_values(&["rejected"]).inc();
        AppError::from(error)
    })?;

    if let Some(previous) = previous {
        state.sessions.destroy(&previous).await.map_err(|error| {
            LOGINS_TOTAL.with_label_values(&["failed"]).inc();
            AppError::Storage(error)
        })?;
    }

    let user = UserRecord::from(claims);
    let session_id = state.sessions.create(user.clone()).await.map_err(|error| {
        LOGINS_TOTAL.with_label_values(&["failed"]).inc();
        AppError::Storage(error)
    })?;

    let jar = jar.add(session_cookie(&state.config, &session_id)?);

    LOGINS_TOTAL.with_label_values(&["success"]).inc();
    tracing::info!(subject = %user.id, "User logged in");

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user,
        }),
    ))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /auth/logout
///
/// Destroys the caller's session if there is one and always clears the
/// session cookie. Fails only when the store cannot complete the removal.
async fn logout(
    State(state): State<AppState>,
    SessionCookie(session): SessionCookie,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SuccessResponse>), AppError> {
    if let Some(session_id) = session {
        state.sessions.destroy(&session_id).await.map_err(|error| {
            LOGOUTS_TOTAL.with_label_values(&["failed"]).inc();
            AppError::LogoutFailed(error)
        })?;
        tracing::info!("Session destroyed");
    }

    LOGOUTS_TOTAL.with_label_values(&["success"]).inc();

    Ok((
        jar.add(removal_cookie(&state.config)),
        Json(SuccessResponse { success: true }),
    ))
}
