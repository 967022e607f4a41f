//! Debounced card editing. Keystrokes reflect in the local store
//! immediately; outgoing saves coalesce behind a 300ms quiet period. The
//! pending text lives in a single mutable slot written synchronously on
//! every keystroke and read only when the debounce fires, so the deferred
//! save can never see a stale capture.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::store::BoardStore;

pub const EDIT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct CardEditor {
    api: Arc<ApiClient>,
    store: Arc<BoardStore>,
    session_id: Uuid,
    card_id: Uuid,
    /// Latest unconfirmed text; cleared only when the server acknowledges
    /// that exact value. Until then the text survives cancelled or failed
    /// saves and a later save re-sends it.
    latest: Arc<Mutex<Option<String>>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl CardEditor {
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<BoardStore>,
        session_id: Uuid,
        card_id: Uuid,
    ) -> Self {
        Self {
            api,
            store,
            session_id,
            card_id,
            latest: Arc::new(Mutex::new(None)),
            pending: Mutex::new(None),
        }
    }

    /// Record a keystroke: update the visible text now, arm (or re-arm)
    /// the debounced save.
    pub fn on_input(&self, text: &str) {
        *lock(&self.latest) = Some(text.to_string());
        self.store.set_content(self.card_id, text);

        let mut pending = lock(&self.pending);
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let api = self.api.clone();
        let store = self.store.clone();
        let latest = self.latest.clone();
        let session_id = self.session_id;
        let card_id = self.card_id;

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(EDIT_DEBOUNCE).await;
            save(&api, &store, &latest, session_id, card_id).await;
        }));
    }

    /// Send any unsent text immediately (view unmount, explicit save).
    /// Aborting the pending task is safe even when its save is mid-request:
    /// the slot still holds the text until the server confirms it, so the
    /// save below re-sends rather than losing the edit.
    pub async fn flush(&self) {
        if let Some(handle) = lock(&self.pending).take() {
            handle.abort();
        }
        save(&self.api, &self.store, &self.latest, self.session_id, self.card_id).await;
    }

    /// Whether the server has yet to confirm the latest text.
    pub fn is_dirty(&self) -> bool {
        lock(&self.latest).is_some()
    }
}

async fn save(
    api: &ApiClient,
    store: &BoardStore,
    latest: &Mutex<Option<String>>,
    session_id: Uuid,
    card_id: Uuid,
) {
    let Some(text) = lock(latest).clone() else {
        return;
    };

    match api
        .update_card(card_id, session_id, Some(text.clone()), None)
        .await
    {
        Ok(card) => {
            // Clear the slot and adopt the confirmed card only if the text
            // we sent is still the latest; a newer keystroke keeps the
            // editor dirty and the visible text untouched.
            let confirmed = {
                let mut slot = lock(latest);
                if slot.as_deref() == Some(text.as_str()) {
                    *slot = None;
                    true
                } else {
                    false
                }
            };
            if confirmed {
                store.apply_card(card);
            }
        }
        // A failed save is logged, not retried; the visible text stays and
        // the editor remains dirty — the user's local edit wins over the
        // last-confirmed server value.
        Err(e) => warn!("Save for card {} failed: {}", card_id, e),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
