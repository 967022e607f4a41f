/// Database row types — these map directly to SQLite rows.
/// Distinct from retro-types API models to keep the DB layer independent.

pub struct SessionRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub expires_at: String,
    pub admin_token: String,
}

pub struct CardRow {
    pub id: String,
    pub session_id: String,
    pub column_type: String,
    pub content: String,
    pub votes: i64,
    pub created_at: String,
}
