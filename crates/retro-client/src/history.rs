//! File-backed local persistence: the recent-session history and the
//! per-session voter identity. Entries live under fixed keys
//! (`retro_sessions`, `retro_voter_{session_id}`) in one JSON document.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use retro_types::Session;

pub const MAX_SESSION_HISTORY: usize = 20;

const SESSIONS_KEY: &str = "retro_sessions";

fn voter_key(session_id: Uuid) -> String {
    format!("retro_voter_{session_id}")
}

pub struct LocalStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, Value>>,
}

impl LocalStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt local store at {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    fn save(&self, data: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(data)?)?;
        Ok(())
    }

    /// Most-recent-first list of boards this client has visited.
    pub fn session_history(&self) -> Vec<Session> {
        let data = self.lock();
        data.get(SESSIONS_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Put a session at the front of the history, deduplicated by id and
    /// capped at the last twenty boards.
    pub fn remember_session(&self, session: &Session) -> Result<()> {
        let mut data = self.lock();
        let mut sessions = history_from(&data);
        sessions.retain(|s| s.id != session.id);
        sessions.insert(0, session.clone());
        sessions.truncate(MAX_SESSION_HISTORY);
        data.insert(SESSIONS_KEY.into(), serde_json::to_value(&sessions)?);
        self.save(&data)
    }

    pub fn forget_session(&self, id: Uuid) -> Result<()> {
        let mut data = self.lock();
        let mut sessions = history_from(&data);
        sessions.retain(|s| s.id != id);
        data.insert(SESSIONS_KEY.into(), serde_json::to_value(&sessions)?);
        data.remove(&voter_key(id));
        self.save(&data)
    }

    /// The admin capability for a session, if this client created it.
    pub fn admin_token(&self, id: Uuid) -> Option<Uuid> {
        self.session_history()
            .into_iter()
            .find(|s| s.id == id)?
            .admin_token
    }

    /// The anonymous per-session voter identity, created on first use.
    /// Scoping the id to one session keeps a voter unlinkable across
    /// retros while still enforcing one vote per card.
    pub fn voter_id(&self, session_id: Uuid) -> Result<Uuid> {
        let mut data = self.lock();
        let key = voter_key(session_id);
        if let Some(existing) = data.get(&key).and_then(|v| v.as_str()) {
            if let Ok(id) = existing.parse() {
                return Ok(id);
            }
            debug!("Discarding corrupt voter id for session {}", session_id);
        }
        let id = Uuid::new_v4();
        data.insert(key, Value::String(id.to_string()));
        self.save(&data)?;
        Ok(id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn history_from(data: &BTreeMap<String, Value>) -> Vec<Session> {
    data.get(SESSIONS_KEY)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}
