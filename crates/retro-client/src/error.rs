use thiserror::Error;
use uuid::Uuid;

/// Client-side failure modes. Timeouts are surfaced separately but callers
/// treat them identically to HTTP errors: the optimistic state rolls back.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("no admin token stored for session {0}")]
    NoAdminToken(Uuid),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(err)
        }
    }
}
