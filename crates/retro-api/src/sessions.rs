use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use retro_db::models::SessionRow;
use retro_db::{Database, queries};
use retro_types::api::CreateSessionRequest;
use retro_types::models::is_expired;
use retro_types::validate;

use crate::convert::{parse_timestamp, session_from_row};
use crate::error::{ApiError, ApiResult, blocking, parse_body, parse_uuid};
use crate::state::AppState;

/// Session, card, and voted-id reads are poll targets; a 1-second shared
/// cache keeps a busy board from hammering the database.
pub(crate) const POLL_CACHE_CONTROL: (header::HeaderName, &str) = (
    header::CACHE_CONTROL,
    "public, max-age=1, stale-while-revalidate=1",
);

/// Fetch a session row and apply the expiry gate: missing is NOT_FOUND,
/// past expiry is GONE. Runs inside blocking closures.
pub(crate) fn require_live_session(db: &Database, id: &Uuid) -> ApiResult<SessionRow> {
    let row = db
        .get_session(&id.to_string())?
        .ok_or(ApiError::NotFound("Session not found"))?;
    if is_expired(&parse_timestamp(&row.expires_at, "expires_at", &row.id)) {
        return Err(ApiError::Gone("Session expired"));
    }
    Ok(row)
}

pub async fn create_session(
    State(state): State<AppState>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = parse_body(body)?;
    let name = validate::session_name(&req.name).map_err(ApiError::Validation)?;

    let id = Uuid::new_v4();
    let admin_token = Uuid::new_v4();

    let session = blocking(move || {
        state.db.create_session(
            &id.to_string(),
            &name,
            &admin_token.to_string(),
            &queries::now_timestamp(),
            &queries::expiry_from_now(),
        )?;
        let row = state
            .db
            .get_session(&id.to_string())?
            .ok_or(ApiError::NotFound("Session not found"))?;
        Ok(session_from_row(row, true))
    })
    .await?;

    info!("Created session {} ({})", session.id, session.name);
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_uuid(&id, "session ID")?;

    let session = blocking(move || {
        let row = require_live_session(&state.db, &id)?;
        // The admin token is only ever handed out on creation.
        Ok(session_from_row(row, false))
    })
    .await?;

    Ok(([POLL_CACHE_CONTROL], Json(session)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteSessionQuery {
    pub admin_token: Option<String>,
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteSessionQuery>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_uuid(&id, "session ID")?;
    let token = query
        .admin_token
        .ok_or_else(|| ApiError::Validation("admin_token is required".into()))?;
    let token: Uuid = token
        .parse()
        .map_err(|_| ApiError::Validation("admin_token must be a UUID".into()))?;

    blocking(move || {
        let row = state
            .db
            .get_session(&id.to_string())?
            .ok_or(ApiError::NotFound("Session not found"))?;

        // Capability check: possession of the admin token is the only
        // proof of the right to delete.
        if row.admin_token != token.to_string() {
            return Err(ApiError::Forbidden);
        }

        state.db.delete_session(&id.to_string())?;
        Ok(())
    })
    .await?;

    info!("Deleted session {}", id);
    Ok(StatusCode::NO_CONTENT)
}
