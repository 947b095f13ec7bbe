use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use smartquota_core::DomainError;

use crate::app::dto;
use crate::app::errors::ErrorStyle;
use crate::app::services::{self, AppServices};
use crate::context::PrincipalContext;
use crate::mailer;
use crate::middleware::{AuthState, auth_middleware};
use crate::rate_limit::{self, RateLimiter};

pub const FORGOT_PASSWORD_REPLY: &str = "Se o email existir, enviamos instruções para redefinir a senha.";

pub struct AuthLimits {
    pub login: Arc<RateLimiter>,
    pub forgot: Arc<RateLimiter>,
}

pub fn router(services: &AppServices, limits: AuthLimits) -> Router {
    let bearer = AuthState {
        auth: services.auth.clone(),
        style: ErrorStyle::Error,
    };

    Router::new()
        .route(
            "/login",
            post(login).layer(middleware::from_fn_with_state(limits.login, rate_limit::enforce)),
        )
        .route("/me", get(me).layer(middleware::from_fn_with_state(bearer, auth_middleware)))
        .route("/check-email", get(check_email))
        .route(
            "/forgot",
            post(forgot_password).layer(middleware::from_fn_with_state(limits.forgot, rate_limit::enforce)),
        )
        .route("/reset", get(confirm_reset_token).post(reset_password))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Response {
    let body = dto::payload(body);
    let auth = services.auth.clone();
    let now = Utc::now();

    let session = services::blocking(move || auth.login(body.email.as_deref(), body.password(), now)).await;
    match session {
        Ok(s) => Json(json!({
            "ok": true,
            "token": s.token,
            "user": dto::login_user_to_json(&s.client),
        }))
        .into_response(),
        Err(e) => services.client_error(e),
    }
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services.auth.current_client(principal.claims()) {
        Ok(client) => Json(json!({ "user": dto::me_user_to_json(&client) })).into_response(),
        Err(e) => services.client_error(e),
    }
}

pub async fn check_email(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::EmailQuery>, QueryRejection>,
) -> Response {
    let query = dto::query(query);
    match services.auth.email_exists(query.email.as_deref()) {
        Ok(exists) => Json(json!({ "exists": exists })).into_response(),
        Err(e) => services.client_error(e),
    }
}

pub async fn forgot_password(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ForgotPasswordRequest>, JsonRejection>,
) -> Response {
    let body = dto::payload(body);

    match services.auth.forgot_password(body.email.as_deref(), Utc::now()) {
        Ok(Some((client, reset))) => {
            let message = mailer::reset_email(&client, &reset.token, &services.links);
            if let Err(e) = services.mailer.send(message).await {
                tracing::warn!(client_id = %client.id, error = %e, "reset email not delivered");
            }
        }
        Ok(None) => tracing::debug!("password reset requested for unknown email"),
        Err(e) => return services.client_error(e),
    }

    Json(json!({ "ok": true, "message": FORGOT_PASSWORD_REPLY })).into_response()
}

pub async fn confirm_reset_token(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::TokenQuery>, QueryRejection>,
) -> Response {
    let query = dto::query(query);
    match services.auth.confirm_reset_token(query.token.as_deref(), Utc::now()) {
        Ok(client) => Json(json!({ "valid": true, "email": client.email })).into_response(),
        Err(DomainError::NotFound(message)) => {
            (StatusCode::NOT_FOUND, Json(json!({ "valid": false, "error": message }))).into_response()
        }
        Err(e) => services.client_error(e),
    }
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ResetPasswordRequest>, JsonRejection>,
) -> Response {
    let body = dto::payload(body);
    let auth = services.auth.clone();
    let now = Utc::now();

    let reset = services::blocking(move || auth.reset_password(body.token.as_deref(), body.password(), now)).await;
    match reset {
        Ok(_) => Json(json!({ "ok": true, "message": "Senha redefinida com sucesso." })).into_response(),
        Err(DomainError::NotFound(message)) => {
            (StatusCode::NOT_FOUND, Json(json!({ "valid": false, "error": message }))).into_response()
        }
        Err(e) => services.client_error(e),
    }
}
