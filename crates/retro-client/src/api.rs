//! HTTP client for the retro API. One `reqwest::Client` with a 10-second
//! total timeout backs every call; structured error bodies are decoded
//! into `ClientError::Api`.

use std::time::Duration;

use uuid::Uuid;

use retro_types::api::{
    CreateCardRequest, CreateSessionRequest, ErrorBody, UpdateCardRequest, VoteRequest,
    VoteResponse,
};
use retro_types::{Card, ColumnType, Session};

use crate::error::ClientError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Decode the structured error body on failure responses.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match resp.json::<ErrorBody>().await {
            Ok(body) => Err(ClientError::Api {
                status: status.as_u16(),
                code: body.error.code,
                message: body.error.message,
            }),
            Err(_) => Err(ClientError::Api {
                status: status.as_u16(),
                code: "UNKNOWN".into(),
                message: format!("HTTP {}", status.as_u16()),
            }),
        }
    }

    // -- Sessions --

    pub async fn create_session(&self, name: &str) -> Result<Session, ClientError> {
        let resp = self
            .http
            .post(self.url("sessions"))
            .json(&CreateSessionRequest { name: name.into() })
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Session, ClientError> {
        let resp = self.http.get(self.url(&format!("sessions/{id}"))).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn delete_session(&self, id: Uuid, admin_token: Uuid) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("sessions/{id}?admin_token={admin_token}")))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    // -- Cards --

    pub async fn list_cards(&self, session_id: Uuid) -> Result<Vec<Card>, ClientError> {
        let resp = self
            .http
            .get(self.url(&format!("sessions/{session_id}/cards")))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn add_card(
        &self,
        session_id: Uuid,
        column_type: ColumnType,
        content: &str,
    ) -> Result<Card, ClientError> {
        let resp = self
            .http
            .post(self.url(&format!("sessions/{session_id}/cards")))
            .json(&CreateCardRequest {
                column_type,
                content: content.into(),
            })
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn update_card(
        &self,
        card_id: Uuid,
        session_id: Uuid,
        content: Option<String>,
        column_type: Option<ColumnType>,
    ) -> Result<Card, ClientError> {
        let resp = self
            .http
            .patch(self.url(&format!("cards/{card_id}")))
            .json(&UpdateCardRequest {
                session_id,
                content,
                column_type,
            })
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn delete_card(&self, card_id: Uuid, session_id: Uuid) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("cards/{card_id}?session_id={session_id}")))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    // -- Votes --

    pub async fn toggle_vote(
        &self,
        card_id: Uuid,
        session_id: Uuid,
        voter_id: Uuid,
    ) -> Result<VoteResponse, ClientError> {
        let resp = self
            .http
            .patch(self.url(&format!("cards/{card_id}/vote")))
            .json(&VoteRequest {
                session_id,
                voter_id,
            })
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list_votes(
        &self,
        session_id: Uuid,
        voter_id: Uuid,
    ) -> Result<Vec<Uuid>, ClientError> {
        let resp = self
            .http
            .get(self.url(&format!(
                "sessions/{session_id}/votes?voter_id={voter_id}"
            )))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}
