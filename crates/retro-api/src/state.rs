use std::sync::Arc;

use retro_db::Database;

pub type AppState = Arc<AppStateInner>;

/// The one typed context object handlers receive. No request handler
/// reaches into ambient globals for the database.
pub struct AppStateInner {
    pub db: Database,
}
