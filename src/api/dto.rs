//! API response DTOs
//!
//! Field names follow what the frontend already consumes.

use serde::{Deserialize, Serialize};

use crate::data::UserRecord;

/// Response to a successful login callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserRecord,
}

/// Bare success acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Dues status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesResponse {
    pub amount_due: u32,
    pub status: String,
}
