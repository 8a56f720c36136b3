//! Dues endpoint

use axum::{Json, Router, routing::get};

use super::dto::DuesResponse;
use crate::AppState;

const AMOUNT_DUE: u32 = 50;
const DUES_STATUS: &str = "Pending";

pub fn dues_router() -> Router<AppState> {
    Router::new().route("/dues", get(get_dues))
}

/// GET /api/dues
///
/// Same payload for every caller, logged in or not.
async fn get_dues() -> Json<DuesResponse> {
    Json(DuesResponse {
        amount_due: AMOUNT_DUE,
        status: DUES_STATUS.to_string(),
    })
}
