//! API layer
//!
//! HTTP handlers for:
//! - Dues status
//! - Current user lookup
//! - Metrics (Prometheus)

mod dto;
mod dues;
pub mod metrics;
mod user;

pub use dto::*;

pub use metrics::metrics_router;

use axum::Router;

use crate::AppState;

/// Create the JSON API router
///
/// Routes (mounted under /api):
/// - GET /dues - Dues status
/// - GET /user - Logged-in user's record
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(dues::dues_router())
        .merge(user::user_router())
}
