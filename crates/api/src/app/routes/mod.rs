use axum::{Router, middleware::from_fn_with_state, routing::get};

use crate::app::errors::ErrorStyle;
use crate::app::services::AppServices;
use crate::config::RateLimits;
use crate::middleware::{AuthState, auth_middleware};
use crate::rate_limit::RateLimiter;

pub mod auth;
pub mod clients;
pub mod finance;
pub mod system;

const REGISTER_LIMITED: &str = "Muitas tentativas de cadastro. Tente novamente mais tarde.";
const LOGIN_LIMITED: &str = "Muitas tentativas de login. Tente novamente mais tarde.";
const FORGOT_LIMITED: &str = "Muitas solicitações de recuperação. Tente novamente mais tarde.";

/// Full route tree. Handlers read [`AppServices`] from an `Extension` the caller adds.
pub fn router(services: &AppServices, limits: RateLimits) -> Router {
    let ledger_auth = AuthState {
        auth: services.auth.clone(),
        style: ErrorStyle::Message,
    };
    let auth_limits = auth::AuthLimits {
        login: RateLimiter::new(limits.login, LOGIN_LIMITED).into(),
        forgot: RateLimiter::new(limits.forgot, FORGOT_LIMITED).into(),
    };

    Router::new()
        .route("/", get(system::status))
        .nest("/cliente", clients::router(RateLimiter::new(limits.register, REGISTER_LIMITED).into()))
        .nest("/auth", auth::router(services, auth_limits))
        .nest(
            "/financeiro",
            finance::router().route_layer(from_fn_with_state(ledger_auth, auth_middleware)),
        )
        // Must follow every route: a known path with the wrong method reads as unknown.
        .method_not_allowed_fallback(system::not_found)
        .fallback(system::not_found)
}
