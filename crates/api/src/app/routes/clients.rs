use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use smartquota_clients::{Client, Registration};
use smartquota_core::DomainError;

use crate::app::dto;
use crate::app::services::{self, AppServices};
use crate::mailer::{self, Links, escape_html};
use crate::rate_limit::{self, RateLimiter};

pub fn router(register_limit: Arc<RateLimiter>) -> Router {
    Router::new()
        .route(
            "/",
            post(register_client).layer(middleware::from_fn_with_state(register_limit, rate_limit::enforce)),
        )
        .route("/confirmar", get(confirm_email))
}

pub async fn register_client(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Registration>, JsonRejection>,
) -> Response {
    let registration = dto::payload(body);
    let registry = services.registry.clone();
    let now = Utc::now();

    let client = match services::blocking(move || registry.register(registration, now)).await {
        Ok(c) => c,
        Err(e) => return services.client_error(e),
    };

    let email_status = match services.mailer.send(mailer::confirmation_email(&client, &services.links)).await {
        Ok(()) => "sent",
        Err(e) => {
            tracing::warn!(client_id = %client.id, error = %e, "confirmation email not delivered");
            "failed"
        }
    };

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Cadastro realizado com sucesso! Verifique seu email para confirmar.",
            "emailStatus": email_status,
            "cliente": client.profile(),
        })),
    )
        .into_response()
}

pub async fn confirm_email(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ConfirmQuery>, QueryRejection>,
) -> Response {
    let query = dto::query(query);
    match services.registry.confirm_email(query.email.as_deref(), query.token.as_deref()) {
        Ok(confirmation) => Html(confirmed_page(&confirmation.client, &services.links)).into_response(),
        Err(e) => {
            let status = crate::app::errors::status_of(&e);
            let message = match e {
                DomainError::Internal(detail) => {
                    tracing::error!(error = %detail, "email confirmation failed");
                    "Erro interno ao confirmar.".to_string()
                }
                other => other.to_string(),
            };
            (status, Html(format!("<h2>{}</h2>", escape_html(&message)))).into_response()
        }
    }
}

fn confirmed_page(client: &Client, links: &Links) -> String {
    let name = escape_html(client.first_name());
    let login = escape_html(&links.login_after_confirm());

    format!(
        r#"<!DOCTYPE html>
<html lang="pt">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <meta http-equiv="refresh" content="2;url={login}" />
  <title>SmartQuota - Email confirmado</title>
  <style>
    body {{ font-family: Arial, sans-serif; padding: 24px; color: #1f2937; background: #f9fafb; }}
    .card {{ max-width: 720px; margin: 40px auto; padding: 24px; border: 1px solid #e5e7eb; border-radius: 12px; background: #fff; }}
    .title {{ font-size: 20px; font-weight: 800; margin-bottom: 8px; }}
    .muted {{ color: #6b7280; }}
    .btn {{ display: inline-block; margin-top: 16px; background: #0078D4; color: #fff; padding: 10px 16px; border-radius: 8px; text-decoration: none; }}
  </style>
</head>
<body>
  <div class="card">
    <div class="title">Email confirmado com sucesso para {name}!</div>
    <div class="muted">Você será redirecionado para a página de login em instantes...</div>
    <a class="btn" id="loginLink" href="{login}">Ir para o login agora</a>
  </div>
</body>
</html>"#
    )
}
