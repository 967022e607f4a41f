//! Sequenced polling reconciliation.
//!
//! Every issued poll takes a monotonically increasing sequence number and
//! a response is only applied if no newer response landed first, so a slow
//! poll can never overwrite the cache with older data. The embedding view
//! pauses the poller while hidden to avoid wasted load.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use retro_types::Card;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::store::BoardStore;

pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

pub struct Poller {
    api: Arc<ApiClient>,
    store: Arc<BoardStore>,
    session_id: Uuid,
    voter_id: Uuid,
    interval: Duration,
    paused: AtomicBool,
    issued: AtomicU64,
    applied: AtomicU64,
}

impl Poller {
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<BoardStore>,
        session_id: Uuid,
        voter_id: Uuid,
    ) -> Self {
        Self::with_interval(api, store, session_id, voter_id, POLL_INTERVAL)
    }

    pub fn with_interval(
        api: Arc<ApiClient>,
        store: Arc<BoardStore>,
        session_id: Uuid,
        voter_id: Uuid,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            store,
            session_id,
            voter_id,
            interval,
            paused: AtomicBool::new(false),
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    /// Stop fetching while the view is hidden. Skipped ticks are dropped,
    /// not queued.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// One reconciliation round: fetch authoritative cards and voted ids,
    /// then apply them unless a newer round already did. Returns whether
    /// the local state changed.
    pub async fn poll_once(&self) -> Result<bool, ClientError> {
        if self.is_paused() {
            return Ok(false);
        }

        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let (cards, voted) = tokio::try_join!(
            self.api.list_cards(self.session_id),
            self.api.list_votes(self.session_id, self.voter_id),
        )?;

        Ok(self.apply(seq, cards, voted))
    }

    /// Apply a poll result unless it lost the race to a newer one.
    fn apply(&self, seq: u64, cards: Vec<Card>, voted: Vec<Uuid>) -> bool {
        let mut current = self.applied.load(Ordering::SeqCst);
        loop {
            if seq <= current {
                // Stale response: a newer poll already applied.
                return false;
            }
            match self.applied.compare_exchange(
                current,
                seq,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        self.store.replace(cards, voted.into_iter().collect())
    }

    /// Drive the poll loop until the handle is dropped or aborted.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if self.is_paused() {
                    continue;
                }
                if let Err(e) = self.poll_once().await {
                    warn!("Poll for session {} failed: {}", self.session_id, e);
                }
            }
        })
    }
}
