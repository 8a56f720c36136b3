//! Current user endpoint

use axum::{Json, Router, routing::get};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::UserRecord;

pub fn user_router() -> Router<AppState> {
    Router::new().route("/user", get(get_user))
}

/// GET /api/user
///
/// Returns the record stored at login. Callers without a live session
/// get 401 `{"message": "Not logged in"}` from the extractor.
async fn get_user(CurrentUser(user): CurrentUser) -> Json<UserRecord> {
    Json(user)
}
