use crate::Database;
use crate::models::{CardRow, SessionRow};
use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use rusqlite::{Connection, Row};

/// Sessions live this long past their last mutation. Any successful card or
/// vote mutation rolls `expires_at` forward ("touch" semantics), so boards
/// in active use never expire.
pub const SESSION_TTL_DAYS: i64 = 30;

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

pub fn expiry_from_now() -> String {
    (Utc::now() + Duration::days(SESSION_TTL_DAYS)).to_rfc3339()
}

impl Database {
    // -- Sessions --

    pub fn create_session(
        &self,
        id: &str,
        name: &str,
        admin_token: &str,
        created_at: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, name, created_at, expires_at, admin_token)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, name, created_at, expires_at, admin_token),
            )?;
            Ok(())
        })
    }

    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| query_session(conn, id))
    }

    /// Returns false when no such session existed.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Prune sessions whose expiry passed before `cutoff`. Cards and votes
    /// go with them via cascade. Returns the number of sessions removed.
    pub fn delete_sessions_expired_before(&self, cutoff: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM sessions WHERE expires_at < ?1", [cutoff])?;
            Ok(changed)
        })
    }

    // -- Cards --

    pub fn insert_card(
        &self,
        id: &str,
        session_id: &str,
        column_type: &str,
        content: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO cards (id, session_id, column_type, content, votes, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                (id, session_id, column_type, content, created_at),
            )?;
            touch_session(&tx, session_id)?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_card(&self, id: &str) -> Result<Option<CardRow>> {
        self.with_conn(|conn| query_card(conn, id))
    }

    pub fn get_cards(&self, session_id: &str, limit: u32) -> Result<Vec<CardRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, column_type, content, votes, created_at
                 FROM cards
                 WHERE session_id = ?1
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![session_id, limit], map_card_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Apply a content and/or column change, extend the session expiry, and
    /// return the updated row, all in one transaction.
    pub fn update_card(
        &self,
        id: &str,
        session_id: &str,
        content: Option<&str>,
        column_type: Option<&str>,
    ) -> Result<CardRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if let Some(content) = content {
                tx.execute("UPDATE cards SET content = ?1 WHERE id = ?2", (content, id))?;
            }
            if let Some(column_type) = column_type {
                tx.execute(
                    "UPDATE cards SET column_type = ?1 WHERE id = ?2",
                    (column_type, id),
                )?;
            }
            touch_session(&tx, session_id)?;
            let card = query_card(&tx, id)?.ok_or_else(|| anyhow!("Card vanished: {}", id))?;
            tx.commit()?;
            Ok(card)
        })
    }

    pub fn delete_card(&self, id: &str, session_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM cards WHERE id = ?1", [id])?;
            touch_session(&tx, session_id)?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Votes --

    /// Toggle a voter's endorsement of a card: removes the vote row and
    /// decrements the counter if it exists, inserts and increments if not.
    /// The card lookup, the row change, the counter update, and the session
    /// touch commit as one transaction — a crash, a concurrent toggle, or a
    /// concurrent card delete can never leave the counter inconsistent with
    /// the vote-row set or trip the foreign key.
    ///
    /// Returns None when no card with that id lives in the given session.
    /// Otherwise (added, updated card): added=true means the vote was cast,
    /// added=false means it was withdrawn.
    pub fn toggle_vote(
        &self,
        vote_id: &str,
        card_id: &str,
        session_id: &str,
        voter_id: &str,
    ) -> Result<Option<(bool, CardRow)>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            // A card in another session is indistinguishable from a
            // missing one.
            if query_card(&tx, card_id)?
                .filter(|card| card.session_id == session_id)
                .is_none()
            {
                return Ok(None);
            }

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM votes WHERE card_id = ?1 AND voter_id = ?2",
                    rusqlite::params![card_id, voter_id],
                    |row| row.get(0),
                )
                .optional()?;

            let added = if let Some(existing_id) = existing {
                tx.execute("DELETE FROM votes WHERE id = ?1", [&existing_id])?;
                tx.execute(
                    "UPDATE cards SET votes = MAX(0, votes - 1) WHERE id = ?1",
                    [card_id],
                )?;
                false
            } else {
                tx.execute(
                    "INSERT INTO votes (id, card_id, voter_id) VALUES (?1, ?2, ?3)",
                    rusqlite::params![vote_id, card_id, voter_id],
                )?;
                tx.execute("UPDATE cards SET votes = votes + 1 WHERE id = ?1", [card_id])?;
                true
            };

            let card =
                query_card(&tx, card_id)?.ok_or_else(|| anyhow!("Card vanished: {}", card_id))?;
            touch_session(&tx, session_id)?;
            tx.commit()?;

            Ok(Some((added, card)))
        })
    }

    /// Card ids in a session the given voter has endorsed.
    pub fn get_voted_card_ids(&self, session_id: &str, voter_id: &str, limit: u32) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT v.card_id FROM votes v
                 JOIN cards c ON c.id = v.card_id
                 WHERE c.session_id = ?1 AND v.voter_id = ?2
                 LIMIT ?3",
            )?;

            let ids = stmt
                .query_map(rusqlite::params![session_id, voter_id, limit], |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(ids)
        })
    }

    #[cfg(test)]
    fn count_votes(&self, card_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM votes WHERE card_id = ?1",
                [card_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

fn touch_session(conn: &Connection, session_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET expires_at = ?1 WHERE id = ?2",
        (expiry_from_now(), session_id),
    )?;
    Ok(())
}

fn query_session(conn: &Connection, id: &str) -> Result<Option<SessionRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, created_at, expires_at, admin_token FROM sessions WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
                admin_token: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_card(conn: &Connection, id: &str) -> Result<Option<CardRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, column_type, content, votes, created_at FROM cards WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], map_card_row).optional()?;

    Ok(row)
}

fn map_card_row(row: &Row<'_>) -> std::result::Result<CardRow, rusqlite::Error> {
    Ok(CardRow {
        id: row.get(0)?,
        session_id: row.get(1)?,
        column_type: row.get(2)?,
        content: row.get(3)?,
        votes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn seed_session(db: &Database) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_session(
            &id,
            "Sprint 1",
            &Uuid::new_v4().to_string(),
            &now_timestamp(),
            &expiry_from_now(),
        )
        .unwrap();
        id
    }

    fn seed_card(db: &Database, session_id: &str, content: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.insert_card(&id, session_id, "glad", content, &now_timestamp())
            .unwrap();
        id
    }

    #[test]
    fn toggle_twice_returns_to_baseline() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db);
        let card = seed_card(&db, &session, "A");
        let voter = Uuid::new_v4().to_string();

        let (added, row) = db
            .toggle_vote(&Uuid::new_v4().to_string(), &card, &session, &voter)
            .unwrap()
            .unwrap();
        assert!(added);
        assert_eq!(row.votes, 1);

        let (added, row) = db
            .toggle_vote(&Uuid::new_v4().to_string(), &card, &session, &voter)
            .unwrap()
            .unwrap();
        assert!(!added);
        assert_eq!(row.votes, 0);
        assert_eq!(db.count_votes(&card).unwrap(), 0);
    }

    #[test]
    fn votes_never_negative_and_match_vote_rows() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db);
        let card = seed_card(&db, &session, "A");

        let voters: Vec<String> = (0..5).map(|_| Uuid::new_v4().to_string()).collect();
        for voter in &voters {
            db.toggle_vote(&Uuid::new_v4().to_string(), &card, &session, voter)
                .unwrap();
        }
        assert_eq!(db.get_card(&card).unwrap().unwrap().votes, 5);

        // Interleave withdrawals and re-casts; counter tracks the row set.
        for voter in &voters {
            db.toggle_vote(&Uuid::new_v4().to_string(), &card, &session, voter)
                .unwrap();
        }
        let row = db.get_card(&card).unwrap().unwrap();
        assert_eq!(row.votes, 0);
        assert_eq!(db.count_votes(&card).unwrap(), 0);
        assert!(row.votes >= 0);
    }

    #[test]
    fn toggle_on_missing_or_foreign_card_reports_none() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db);
        let other = seed_session(&db);
        let card = seed_card(&db, &session, "A");
        let voter = Uuid::new_v4().to_string();

        // Deleted (or never-existing) card: no error, no vote row.
        let gone = db
            .toggle_vote(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &session,
                &voter,
            )
            .unwrap();
        assert!(gone.is_none());

        // Real card claimed under the wrong session.
        let foreign = db
            .toggle_vote(&Uuid::new_v4().to_string(), &card, &other, &voter)
            .unwrap();
        assert!(foreign.is_none());
        assert_eq!(db.count_votes(&card).unwrap(), 0);
    }

    #[test]
    fn mutations_extend_expiry() {
        let db = Database::open_in_memory().unwrap();
        let id = Uuid::new_v4().to_string();
        let stale = "2020-01-01T00:00:00+00:00";
        db.create_session(&id, "old board", &Uuid::new_v4().to_string(), stale, stale)
            .unwrap();

        seed_card(&db, &id, "A");

        let row = db.get_session(&id).unwrap().unwrap();
        assert!(row.expires_at.as_str() > stale);
    }

    #[test]
    fn cards_listed_oldest_first_with_limit() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db);
        let a = seed_card(&db, &session, "A");
        let b = seed_card(&db, &session, "B");
        let c = seed_card(&db, &session, "C");

        let rows = db.get_cards(&session, 100).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str(), c.as_str()]);

        assert_eq!(db.get_cards(&session, 2).unwrap().len(), 2);
    }

    #[test]
    fn session_delete_cascades_to_cards_and_votes() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db);
        let card = seed_card(&db, &session, "A");
        db.toggle_vote(
            &Uuid::new_v4().to_string(),
            &card,
            &session,
            &Uuid::new_v4().to_string(),
        )
        .unwrap();

        assert!(db.delete_session(&session).unwrap());
        assert!(db.get_card(&card).unwrap().is_none());
        assert_eq!(db.count_votes(&card).unwrap(), 0);
        // Deleting again reports nothing removed.
        assert!(!db.delete_session(&session).unwrap());
    }

    #[test]
    fn sweep_removes_only_long_expired_sessions() {
        let db = Database::open_in_memory().unwrap();
        let live = seed_session(&db);
        let dead = Uuid::new_v4().to_string();
        db.create_session(
            &dead,
            "stale",
            &Uuid::new_v4().to_string(),
            "2020-01-01T00:00:00+00:00",
            "2020-02-01T00:00:00+00:00",
        )
        .unwrap();

        let removed = db.delete_sessions_expired_before(&now_timestamp()).unwrap();
        assert_eq!(removed, 1);
        assert!(db.get_session(&dead).unwrap().is_none());
        assert!(db.get_session(&live).unwrap().is_some());
    }

    #[test]
    fn voted_ids_scoped_to_session_and_voter() {
        let db = Database::open_in_memory().unwrap();
        let session_a = seed_session(&db);
        let session_b = seed_session(&db);
        let card_a = seed_card(&db, &session_a, "A");
        let card_b = seed_card(&db, &session_b, "B");
        let voter = Uuid::new_v4().to_string();

        db.toggle_vote(&Uuid::new_v4().to_string(), &card_a, &session_a, &voter)
            .unwrap();
        db.toggle_vote(&Uuid::new_v4().to_string(), &card_b, &session_b, &voter)
            .unwrap();

        let ids = db.get_voted_card_ids(&session_a, &voter, 100).unwrap();
        assert_eq!(ids, vec![card_a.clone()]);

        let other = db
            .get_voted_card_ids(&session_a, &Uuid::new_v4().to_string(), 100)
            .unwrap();
        assert!(other.is_empty());
    }
}
