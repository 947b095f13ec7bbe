use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use smartquota_clients::AuthService;

use crate::app::errors::{self, ErrorStyle};
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub auth: AuthService,
    pub style: ErrorStyle,
}

impl AuthState {
    /// `(missing, invalid)` rejection messages.
    fn messages(&self) -> (&'static str, &'static str) {
        match self.style {
            ErrorStyle::Error => ("Token ausente ou esquema inválido", "Token inválido ou expirado"),
            ErrorStyle::Message => ("Unauthorized", "Invalid token"),
        }
    }
}

pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let (missing, invalid) = state.messages();

    let claims = match extract_bearer(req.headers()) {
        Some(token) => state.auth.authenticate(token, Utc::now()),
        None => return errors::styled_error(state.style, StatusCode::UNAUTHORIZED, missing),
    };
    let claims = match claims {
        Ok(c) => c,
        Err(_) => return errors::styled_error(state.style, StatusCode::UNAUTHORIZED, invalid),
    };

    req.extensions_mut().insert(PrincipalContext::new(claims));
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;

    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer(&headers("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(extract_bearer(&headers("Basic abc")), None);
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
        assert_eq!(extract_bearer(&headers("abc")), None);
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }
}
