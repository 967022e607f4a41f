use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the four fixed board columns. The taxonomy is not user-extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Glad,
    Wondering,
    Sad,
    Action,
}

impl ColumnType {
    pub const ALL: [ColumnType; 4] = [
        ColumnType::Glad,
        ColumnType::Wondering,
        ColumnType::Sad,
        ColumnType::Action,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Glad => "glad",
            ColumnType::Wondering => "wondering",
            ColumnType::Sad => "sad",
            ColumnType::Action => "action",
        }
    }

    pub fn parse(s: &str) -> Option<ColumnType> {
        match s {
            "glad" => Some(ColumnType::Glad),
            "wondering" => Some(ColumnType::Wondering),
            "sad" => Some(ColumnType::Sad),
            "action" => Some(ColumnType::Action),
            _ => None,
        }
    }
}

/// One retrospective board instance. `admin_token` is the capability secret
/// proving the right to delete the session; it is only serialized on the
/// creation response, never on plain reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<Uuid>,
}

/// A single sticky note in one column of a session. `votes` caches the
/// count of vote rows and never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub session_id: Uuid,
    pub column_type: ColumnType,
    pub content: String,
    pub votes: i64,
    pub created_at: DateTime<Utc>,
}

/// A session is logically dead once its expiry passed; reads of a dead
/// session are answered with Gone rather than Not Found.
pub fn is_expired(expires_at: &DateTime<Utc>) -> bool {
    *expires_at < Utc::now()
}
