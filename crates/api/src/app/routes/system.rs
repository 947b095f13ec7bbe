use axum::{Json, extract::OriginalUri, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

pub async fn status() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "message": "SmartQuota API está online!",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or_else(|| uri.path());
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Rota não encontrada",
            "path": path,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
