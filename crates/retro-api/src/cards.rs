use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use retro_db::queries;
use retro_types::Card;
use retro_types::api::{CreateCardRequest, UpdateCardRequest};
use retro_types::validate;

use crate::convert::card_from_row;
use crate::error::{ApiError, ApiResult, blocking, parse_body, parse_uuid};
use crate::sessions::{POLL_CACHE_CONTROL, require_live_session};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

pub async fn list_cards(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let session_id = parse_uuid(&id, "session ID")?;
    let limit = validate::clamp_limit(query.limit);

    let cards = blocking(move || {
        require_live_session(&state.db, &session_id)?;
        let rows = state.db.get_cards(&session_id.to_string(), limit)?;
        Ok(rows.into_iter().map(card_from_row).collect::<Vec<Card>>())
    })
    .await?;

    Ok(([POLL_CACHE_CONTROL], Json(cards)))
}

pub async fn add_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CreateCardRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let session_id = parse_uuid(&id, "session ID")?;
    let req = parse_body(body)?;
    let content = validate::card_content(&req.content).map_err(ApiError::Validation)?;

    let card_id = Uuid::new_v4();
    let card = blocking(move || {
        require_live_session(&state.db, &session_id)?;
        state.db.insert_card(
            &card_id.to_string(),
            &session_id.to_string(),
            req.column_type.as_str(),
            &content,
            &queries::now_timestamp(),
        )?;
        let row = state
            .db
            .get_card(&card_id.to_string())?
            .ok_or(ApiError::NotFound("Card not found"))?;
        Ok(card_from_row(row))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateCardRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let card_id = parse_uuid(&id, "card ID")?;
    let req = parse_body(body)?;

    let content = match req.content.as_deref() {
        Some(raw) => Some(validate::card_content(raw).map_err(ApiError::Validation)?),
        None => None,
    };
    if content.is_none() && req.column_type.is_none() {
        return Err(ApiError::BadRequest("No fields to update".into()));
    }

    let card = blocking(move || {
        let existing = state
            .db
            .get_card(&card_id.to_string())?
            .ok_or(ApiError::NotFound("Card not found"))?;

        // The requester must prove knowledge of the card's session.
        if existing.session_id != req.session_id.to_string() {
            return Err(ApiError::Forbidden);
        }

        let row = state.db.update_card(
            &card_id.to_string(),
            &existing.session_id,
            content.as_deref(),
            req.column_type.map(|c| c.as_str()),
        )?;
        Ok(card_from_row(row))
    })
    .await?;

    Ok(Json(card))
}

#[derive(Debug, Deserialize)]
pub struct DeleteCardQuery {
    pub session_id: Option<String>,
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteCardQuery>,
) -> ApiResult<impl IntoResponse> {
    let card_id = parse_uuid(&id, "card ID")?;
    let session_id = query
        .session_id
        .ok_or_else(|| ApiError::Validation("session_id is required".into()))?;
    let session_id: Uuid = session_id
        .parse()
        .map_err(|_| ApiError::Validation("session_id must be a UUID".into()))?;

    blocking(move || {
        let existing = state
            .db
            .get_card(&card_id.to_string())?
            .ok_or(ApiError::NotFound("Card not found"))?;

        if existing.session_id != session_id.to_string() {
            return Err(ApiError::Forbidden);
        }

        state
            .db
            .delete_card(&card_id.to_string(), &existing.session_id)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
