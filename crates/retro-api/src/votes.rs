use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use retro_types::api::{VoteRequest, VoteResponse};
use retro_types::validate;

use crate::convert::card_from_row;
use crate::error::{ApiError, ApiResult, blocking, parse_body, parse_uuid};
use crate::sessions::{POLL_CACHE_CONTROL, require_live_session};
use crate::state::AppState;

/// Atomically toggle a voter's endorsement of a card.
///
/// Known limitation: toggle semantics are the only retry story. A client
/// that retries after a timeout of an already-applied toggle will toggle
/// again rather than no-op.
pub async fn toggle_vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let card_id = parse_uuid(&id, "card ID")?;
    let req = parse_body(body)?;

    let vote_id = Uuid::new_v4();
    let (added, card) = blocking(move || {
        // The session-scoped card lookup happens inside the toggle
        // transaction, so a card deleted concurrently reads as missing
        // rather than a constraint failure.
        let (added, row) = state
            .db
            .toggle_vote(
                &vote_id.to_string(),
                &card_id.to_string(),
                &req.session_id.to_string(),
                &req.voter_id.to_string(),
            )?
            .ok_or(ApiError::NotFound("Card not found"))?;
        Ok((added, card_from_row(row)))
    })
    .await?;

    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(VoteResponse { card, voted: added })))
}

#[derive(Debug, Deserialize)]
pub struct VotesQuery {
    pub voter_id: Option<String>,
    pub limit: Option<u32>,
}

pub async fn list_votes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<VotesQuery>,
) -> ApiResult<impl IntoResponse> {
    let session_id = parse_uuid(&id, "session ID")?;
    let voter_id = query
        .voter_id
        .ok_or_else(|| ApiError::Validation("voter_id is required".into()))?;
    let voter_id: Uuid = voter_id
        .parse()
        .map_err(|_| ApiError::Validation("voter_id must be a UUID".into()))?;
    let limit = validate::clamp_limit(query.limit);

    let ids = blocking(move || {
        require_live_session(&state.db, &session_id)?;
        let ids =
            state
                .db
                .get_voted_card_ids(&session_id.to_string(), &voter_id.to_string(), limit)?;
        Ok(ids)
    })
    .await?;

    Ok(([POLL_CACHE_CONTROL], Json(ids)))
}
