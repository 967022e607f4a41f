use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Card, ColumnType};

// -- Sessions --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSessionRequest {
    pub name: String,
}

// -- Cards --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCardRequest {
    pub column_type: ColumnType,
    pub content: String,
}

/// Card update. `session_id` is the capability proof: it must match the
/// card's stored session or the request is forbidden.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCardRequest {
    pub session_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
}

// -- Votes --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub session_id: Uuid,
    pub voter_id: Uuid,
}

/// Toggle response: the updated card plus which side of the toggle landed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    #[serde(flatten)]
    pub card: Card,
    pub voted: bool,
}

// -- Errors --

/// Machine-readable error codes surfaced in every error body.
pub mod error_code {
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const GONE: &str = "GONE";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Wire shape of every error response: `{"error": {message, code, status}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
    pub status: u16,
}
