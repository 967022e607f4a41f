//! Row-to-model conversion. Rows hold plain strings; the API speaks UUIDs
//! and RFC 3339 timestamps. Corrupt stored values are logged and defaulted
//! rather than failing the whole response.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use retro_db::models::{CardRow, SessionRow};
use retro_types::{Card, ColumnType, Session};

pub fn session_from_row(row: SessionRow, include_admin_token: bool) -> Session {
    let admin_token = include_admin_token.then(|| parse_uuid(&row.admin_token, "admin_token", &row.id));
    Session {
        id: parse_uuid(&row.id, "id", &row.id),
        name: row.name,
        created_at: parse_timestamp(&row.created_at, "created_at", &row.id),
        expires_at: parse_timestamp(&row.expires_at, "expires_at", &row.id),
        admin_token,
    }
}

pub fn card_from_row(row: CardRow) -> Card {
    let column_type = ColumnType::parse(&row.column_type).unwrap_or_else(|| {
        warn!("Corrupt column_type '{}' on card '{}'", row.column_type, row.id);
        ColumnType::Glad
    });
    Card {
        id: parse_uuid(&row.id, "id", &row.id),
        session_id: parse_uuid(&row.session_id, "session_id", &row.id),
        column_type,
        content: row.content,
        votes: row.votes,
        created_at: parse_timestamp(&row.created_at, "created_at", &row.id),
    }
}

fn parse_uuid(raw: &str, field: &str, row_id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", field, raw, row_id, e);
        Uuid::default()
    })
}

pub fn parse_timestamp(raw: &str, field: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') format lacks a timezone. Parse as
            // naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}' on row '{}': {}", field, raw, row_id, e);
            DateTime::default()
        })
}
