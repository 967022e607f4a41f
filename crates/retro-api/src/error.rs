use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use retro_types::api::error_code;

/// Every failure the API can surface, mapped one-to-one onto the wire
/// taxonomy. RateLimited is reserved: the code exists in the contract but
/// no limiter is wired in front of the handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Gone(&'static str),

    #[error("Forbidden")]
    Forbidden,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Gone(_) => StatusCode::GONE,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => error_code::BAD_REQUEST,
            ApiError::Validation(_) => error_code::VALIDATION_ERROR,
            ApiError::NotFound(_) => error_code::NOT_FOUND,
            ApiError::Gone(_) => error_code::GONE,
            ApiError::Forbidden => error_code::FORBIDDEN,
            ApiError::RateLimited => error_code::RATE_LIMITED,
            ApiError::Internal(_) => error_code::INTERNAL,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let status = self.status();
        let body = Json(json!({
            "error": {
                "message": message,
                "code": self.code(),
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Unwrap an optional `Json` body, mapping rejections onto the taxonomy:
/// unparseable or oversized bodies are BAD_REQUEST, bodies that parse but
/// violate the payload shape are VALIDATION_ERROR.
pub fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::JsonDataError(err)) => Err(ApiError::Validation(err.body_text())),
        Err(JsonRejection::JsonSyntaxError(_)) => {
            Err(ApiError::BadRequest("Invalid JSON body".into()))
        }
        Err(JsonRejection::MissingJsonContentType(_)) => Err(ApiError::BadRequest(
            "Expected Content-Type: application/json".into(),
        )),
        Err(other) => Err(ApiError::BadRequest(other.body_text())),
    }
}

/// Parse a path or query identifier that must be UUID-shaped.
pub fn parse_uuid(raw: &str, what: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {what}")))
}

/// Run blocking DB work off the async runtime (teacher pattern: rusqlite
/// behind spawn_blocking).
pub async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("join error"))
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_code_mapping() {
        assert_eq!(ApiError::Gone("Session expired").status(), StatusCode::GONE);
        assert_eq!(ApiError::Gone("Session expired").code(), "GONE");
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Validation("bad".into()).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn uuid_parsing_names_the_field() {
        let err = parse_uuid("nope", "card ID").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Invalid card ID"));
    }
}
