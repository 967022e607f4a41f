//! Session-scoped optimistic cache. One `BoardStore` per mounted board
//! view; there is no module-level singleton. Mutations apply instantly,
//! failures restore the captured snapshot exactly, and the poller replaces
//! state wholesale when the server disagrees.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use uuid::Uuid;

use retro_types::Card;

/// Everything a board view renders: the card list plus the ids the local
/// voter has endorsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub cards: Vec<Card>,
    pub voted: HashSet<Uuid>,
}

pub struct BoardStore {
    state: Mutex<BoardSnapshot>,
    tx: watch::Sender<BoardSnapshot>,
}

impl BoardStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BoardSnapshot::default()),
            tx: watch::Sender::new(BoardSnapshot::default()),
        }
    }

    /// Watch for state changes. Receivers see the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BoardSnapshot> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, state: &BoardSnapshot) {
        self.tx.send_replace(state.clone());
    }

    /// Add-card is apply-on-success: the server-confirmed card is appended
    /// to the end of the list. No optimistic pre-insert, so a failed
    /// request can never leave a duplicate row behind.
    pub fn insert_confirmed(&self, card: Card) {
        let mut state = self.lock();
        state.cards.push(card);
        self.notify(&state);
    }

    /// Optimistically drop a card. Returns the pre-mutation snapshot for
    /// rollback if the delete request fails.
    pub fn remove_card(&self, id: Uuid) -> BoardSnapshot {
        let mut state = self.lock();
        let prev = state.clone();
        state.cards.retain(|c| c.id != id);
        self.notify(&state);
        prev
    }

    /// Optimistically flip the local voter's endorsement of a card: toggle
    /// membership in `voted` and move the card's count by one in the same
    /// direction, clamped at zero. Returns the pre-mutation snapshot.
    pub fn toggle_voted(&self, id: Uuid) -> BoardSnapshot {
        let mut state = self.lock();
        let prev = state.clone();

        let casting = state.voted.insert(id);
        if !casting {
            state.voted.remove(&id);
        }
        if let Some(card) = state.cards.iter_mut().find(|c| c.id == id) {
            card.votes = if casting {
                card.votes + 1
            } else {
                (card.votes - 1).max(0)
            };
        }

        self.notify(&state);
        prev
    }

    /// Reflect live input immediately. The user's local edit is trusted
    /// over the last-confirmed server value.
    pub fn set_content(&self, id: Uuid, content: &str) {
        let mut state = self.lock();
        if let Some(card) = state.cards.iter_mut().find(|c| c.id == id) {
            card.content = content.to_string();
            self.notify(&state);
        }
    }

    /// Replace a single card with its server-confirmed version.
    pub fn apply_card(&self, card: Card) {
        let mut state = self.lock();
        if let Some(slot) = state.cards.iter_mut().find(|c| c.id == card.id) {
            *slot = card;
            self.notify(&state);
        }
    }

    /// Rollback: restore a previously captured snapshot exactly — never a
    /// partial merge.
    pub fn restore(&self, snapshot: BoardSnapshot) {
        let mut state = self.lock();
        *state = snapshot;
        self.notify(&state);
    }

    /// Wholesale replacement with authoritative server state. Subscribers
    /// are only notified when something actually differs.
    pub fn replace(&self, cards: Vec<Card>, voted: HashSet<Uuid>) -> bool {
        let mut state = self.lock();
        let next = BoardSnapshot { cards, voted };
        if *state == next {
            return false;
        }
        *state = next;
        self.notify(&state);
        true
    }
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}
