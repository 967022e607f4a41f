pub mod cards;
pub mod convert;
pub mod error;
pub mod sessions;
pub mod state;
pub mod votes;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};

use retro_types::validate::MAX_BODY_BYTES;
pub use state::{AppState, AppStateInner};

/// The full REST surface. Bodies over 16 KiB are rejected before parsing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/sessions/{id}/cards",
            get(cards::list_cards).post(cards::add_card),
        )
        .route("/sessions/{id}/votes", get(votes::list_votes))
        .route(
            "/cards/{id}",
            patch(cards::update_card).delete(cards::delete_card),
        )
        .route("/cards/{id}/vote", patch(votes::toggle_vote))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
