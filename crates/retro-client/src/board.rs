//! Board choreography: pairs the API client with a session-scoped store
//! and applies the optimistic-mutation rules. The component that mounts a
//! board view owns one `Board`.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use retro_types::{Card, ColumnType, Session};

use crate::api::ApiClient;
use crate::edit::CardEditor;
use crate::error::ClientError;
use crate::history::LocalStore;
use crate::store::BoardStore;
use crate::sync::Poller;

pub struct Board {
    api: Arc<ApiClient>,
    store: Arc<BoardStore>,
    session_id: Uuid,
    voter_id: Uuid,
}

impl Board {
    pub fn new(api: Arc<ApiClient>, session_id: Uuid, voter_id: Uuid) -> Self {
        Self {
            api,
            store: Arc::new(BoardStore::new()),
            session_id,
            voter_id,
        }
    }

    pub fn store(&self) -> &Arc<BoardStore> {
        &self.store
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Fetch authoritative state once, e.g. on mount before the poller
    /// takes over.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let (cards, voted) = tokio::try_join!(
            self.api.list_cards(self.session_id),
            self.api.list_votes(self.session_id, self.voter_id),
        )?;
        self.store.replace(cards, voted.into_iter().collect());
        Ok(())
    }

    /// Add a card: apply-on-success. The card appears once the server
    /// confirms it, appended to the end of the list.
    pub async fn add_card(
        &self,
        column_type: ColumnType,
        content: &str,
    ) -> Result<Card, ClientError> {
        let card = self.api.add_card(self.session_id, column_type, content).await?;
        self.store.insert_confirmed(card.clone());
        Ok(card)
    }

    /// Delete a card optimistically; a failed request restores the
    /// pre-mutation snapshot exactly.
    pub async fn delete_card(&self, card_id: Uuid) -> Result<(), ClientError> {
        let prev = self.store.remove_card(card_id);
        match self.api.delete_card(card_id, self.session_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.store.restore(prev);
                Err(e)
            }
        }
    }

    /// Toggle the local voter's endorsement optimistically; a failed
    /// request restores both the cards and the voted set. On success the
    /// optimistic value stands and the next poll reconciles any drift.
    pub async fn toggle_vote(&self, card_id: Uuid) -> Result<(), ClientError> {
        let prev = self.store.toggle_voted(card_id);
        match self
            .api
            .toggle_vote(card_id, self.session_id, self.voter_id)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                self.store.restore(prev);
                Err(e)
            }
        }
    }

    pub fn editor(&self, card_id: Uuid) -> CardEditor {
        CardEditor::new(
            self.api.clone(),
            self.store.clone(),
            self.session_id,
            card_id,
        )
    }

    pub fn poller(&self) -> Arc<Poller> {
        Arc::new(Poller::new(
            self.api.clone(),
            self.store.clone(),
            self.session_id,
            self.voter_id,
        ))
    }
}

// -- Session-level helpers --

/// Create a board and remember it (with its admin token) in the local
/// history. History write failures are logged, never fatal.
pub async fn create_session(
    api: &ApiClient,
    local: &LocalStore,
    name: &str,
) -> Result<Session, ClientError> {
    let session = api.create_session(name).await?;
    if let Err(e) = local.remember_session(&session) {
        warn!("Failed to persist session history: {}", e);
    }
    Ok(session)
}

/// Fetch a board and refresh its spot in the local history.
pub async fn load_session(
    api: &ApiClient,
    local: &LocalStore,
    id: Uuid,
) -> Result<Session, ClientError> {
    let session = api.get_session(id).await?;
    // Keep the stored admin token; plain reads never carry it.
    let remembered = Session {
        admin_token: local.admin_token(id),
        ..session.clone()
    };
    if let Err(e) = local.remember_session(&remembered) {
        warn!("Failed to persist session history: {}", e);
    }
    Ok(session)
}

/// Delete a board using the locally stored admin capability, then drop it
/// from the history.
pub async fn delete_session(
    api: &ApiClient,
    local: &LocalStore,
    id: Uuid,
) -> Result<(), ClientError> {
    let token = local.admin_token(id).ok_or(ClientError::NoAdminToken(id))?;
    api.delete_session(id, token).await?;
    if let Err(e) = local.forget_session(id) {
        warn!("Failed to prune session history: {}", e);
    }
    Ok(())
}
