use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;

use smartquota_core::DomainError;

pub const INTERNAL_ERROR: &str = "Erro interno do servidor";

/// Which key carries the message. Client and auth routes answer `{error}`,
/// the ledger answers `{message}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStyle {
    Error,
    Message,
}

impl ErrorStyle {
    fn key(&self) -> &'static str {
        match self {
            ErrorStyle::Error => "error",
            ErrorStyle::Message => "message",
        }
    }
}

pub fn styled_error(style: ErrorStyle, status: StatusCode, message: impl Into<String>) -> Response {
    let mut body = serde_json::Map::new();
    body.insert(style.key().to_string(), serde_json::Value::String(message.into()));
    (status, axum::Json(serde_json::Value::Object(body))).into_response()
}

pub fn status_of(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a domain error to its response. Internal errors are logged and
/// reported generically; `details` is only attached when `expose_details`.
pub fn domain_error_to_response(err: DomainError, style: ErrorStyle, expose_details: bool) -> Response {
    match err {
        DomainError::Internal(detail) => {
            tracing::error!(error = %detail, "internal error");
            let mut body = json!({ "timestamp": Utc::now().to_rfc3339() });
            body[style.key()] = INTERNAL_ERROR.into();
            if expose_details {
                body["details"] = detail.into();
            }
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
        }
        other => {
            let status = status_of(&other);
            styled_error(style, status, other.to_string())
        }
    }
}

pub fn rate_limited(message: &str, retry_after_secs: u64) -> Response {
    let mut resp = (
        StatusCode::TOO_MANY_REQUESTS,
        axum::Json(json!({
            "error": message,
            "retryAfterSeconds": retry_after_secs,
        })),
    )
        .into_response();
    resp.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn domain_errors_map_to_statuses_and_keys() {
        let resp = domain_error_to_response(DomainError::conflict("Email já cadastrado."), ErrorStyle::Error, false);
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(resp).await, json!({"error": "Email já cadastrado."}));

        let resp = domain_error_to_response(DomainError::validation("Moeda não suportada"), ErrorStyle::Message, false);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await, json!({"message": "Moeda não suportada"}));
    }

    #[tokio::test]
    async fn internal_details_only_when_exposed() {
        let resp = domain_error_to_response(DomainError::internal("lock poisoned"), ErrorStyle::Error, false);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], INTERNAL_ERROR);
        assert!(body.get("details").is_none());

        let resp = domain_error_to_response(DomainError::internal("lock poisoned"), ErrorStyle::Error, true);
        assert_eq!(body_json(resp).await["details"], "lock poisoned");
    }

    #[tokio::test]
    async fn rate_limited_sets_retry_after() {
        let resp = rate_limited("Muitas tentativas de login. Tente novamente mais tarde.", 42);
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers()[header::RETRY_AFTER], "42");
        assert_eq!(body_json(resp).await["retryAfterSeconds"], 42);
    }
}
