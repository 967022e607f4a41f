use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sessions (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            expires_at  TEXT NOT NULL,
            admin_token TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cards (
            id          TEXT PRIMARY KEY,
            session_id  TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            column_type TEXT NOT NULL,
            content     TEXT NOT NULL,
            votes       INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cards_session
            ON cards(session_id, created_at);

        CREATE TABLE IF NOT EXISTS votes (
            id          TEXT PRIMARY KEY,
            card_id     TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
            voter_id    TEXT NOT NULL,
            UNIQUE(card_id, voter_id)
        );

        CREATE INDEX IF NOT EXISTS idx_votes_card
            ON votes(card_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
