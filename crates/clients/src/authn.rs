//! Authentication service: login, token resolution and password reset.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use smartquota_auth::{
    JwtClaims, JwtValidator, ResetToken, TokenIssuer, hash_password, verify_absent, verify_password,
};
use smartquota_core::{DomainError, DomainResult, Email};

use crate::client::Client;
use crate::repository::ClientRepository;

/// Same message for unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "Credenciais inválidas.";
pub const INVALID_RESET_TOKEN: &str = "Token inválido ou expirado";

/// A successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub client: Client,
}

#[derive(Clone)]
pub struct AuthService {
    clients: Arc<dyn ClientRepository>,
    issuer: Arc<dyn TokenIssuer>,
    validator: Arc<dyn JwtValidator>,
    token_ttl: Duration,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl AuthService {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        issuer: Arc<dyn TokenIssuer>,
        validator: Arc<dyn JwtValidator>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            clients,
            issuer,
            validator,
            token_ttl,
        }
    }

    /// Verify credentials and issue a bearer token.
    ///
    /// Password verification is CPU-bound; async callers should run this on a
    /// blocking thread.
    pub fn login(&self, email: Option<&str>, password: Option<&str>, now: DateTime<Utc>) -> DomainResult<Session> {
        let (Some(email), Some(password)) = (non_blank(email).and_then(Email::parse), non_blank(password)) else {
            return Err(DomainError::validation("Email e senha são obrigatórios."));
        };

        let client = match self.clients.get(&email)? {
            Some(client) if verify_password(password, &client.password_hash) => client,
            Some(_) => return Err(DomainError::unauthorized(INVALID_CREDENTIALS)),
            None => {
                verify_absent(password);
                return Err(DomainError::unauthorized(INVALID_CREDENTIALS));
            }
        };

        let claims = JwtClaims::new(client.email.clone(), client.name.clone(), client.id, now, self.token_ttl);
        let token = self
            .issuer
            .issue(&claims)
            .map_err(|e| DomainError::internal(e.to_string()))?;

        tracing::info!(client_id = %client.id, "login succeeded");
        Ok(Session { token, client })
    }

    /// Verify a bearer token (signature and expiry).
    pub fn authenticate(&self, token: &str, now: DateTime<Utc>) -> DomainResult<JwtClaims> {
        self.validator.validate(token, now).map_err(|e| {
            tracing::debug!("token rejected: {e}");
            DomainError::unauthorized("Token inválido ou expirado")
        })
    }

    /// Resolve an authenticated subject to its client record.
    pub fn current_client(&self, claims: &JwtClaims) -> DomainResult<Client> {
        self.clients
            .get(&claims.sub)?
            .ok_or_else(|| DomainError::not_found("Usuário não encontrado"))
    }

    /// `me`: token → client.
    pub fn me(&self, token: &str, now: DateTime<Utc>) -> DomainResult<Client> {
        let claims = self.authenticate(token, now)?;
        self.current_client(&claims)
    }

    pub fn email_exists(&self, email: Option<&str>) -> DomainResult<bool> {
        let email = email
            .and_then(Email::parse)
            .ok_or_else(|| DomainError::validation("Email obrigatório"))?;
        Ok(self.clients.get(&email)?.is_some())
    }

    /// Start the forgot-password flow.
    ///
    /// Returns the reset token when the email belongs to a client and `None`
    /// otherwise; callers must answer both cases identically.
    pub fn forgot_password(&self, email: Option<&str>, now: DateTime<Utc>) -> DomainResult<Option<(Client, ResetToken)>> {
        let email = email
            .and_then(Email::parse)
            .ok_or_else(|| DomainError::validation("Email obrigatório"))?;

        let reset = ResetToken::generate(now);
        let client = self.clients.update(&email, &mut |c: &mut Client| {
            c.reset = Some(reset.clone());
        })?;

        Ok(client.map(|c| (c, reset)))
    }

    /// Check that a reset token exists and has not expired.
    pub fn confirm_reset_token(&self, token: Option<&str>, now: DateTime<Utc>) -> DomainResult<Client> {
        let token = non_blank(token)
            .map(str::trim)
            .ok_or_else(|| DomainError::validation("Token é obrigatório"))?;

        self.clients
            .find(&|c: &Client| c.reset.as_ref().is_some_and(|r| r.matches(token, now)))?
            .ok_or_else(|| DomainError::not_found(INVALID_RESET_TOKEN))
    }

    /// Consume a reset token and set a new password.
    pub fn reset_password(&self, token: Option<&str>, new_password: Option<&str>, now: DateTime<Utc>) -> DomainResult<Client> {
        let token = non_blank(token)
            .map(str::trim)
            .ok_or_else(|| DomainError::validation("Token é obrigatório"))?;
        let new_password = non_blank(new_password).ok_or_else(|| DomainError::validation("Senha é obrigatória"))?;

        let password_hash = hash_password(new_password).map_err(|e| DomainError::internal(e.to_string()))?;

        let client = self
            .clients
            .update_where(
                &|c: &Client| c.reset.as_ref().is_some_and(|r| r.matches(token, now)),
                &mut |c: &mut Client| {
                    c.password_hash = password_hash.clone();
                    c.reset = None;
                },
            )?
            .ok_or_else(|| DomainError::not_found(INVALID_RESET_TOKEN))?;

        tracing::info!(client_id = %client.id, "password reset");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use smartquota_auth::Hs256Jwt;

    use super::*;
    use crate::repository::{InMemoryClientRepository, tests::client};

    fn service_with(password: &str) -> (AuthService, Arc<InMemoryClientRepository>) {
        let repo = Arc::new(InMemoryClientRepository::new());
        let mut ana = client("ana@b.com");
        ana.password_hash = hash_password(password).unwrap();
        repo.insert(ana).unwrap();

        let jwt = Arc::new(Hs256Jwt::new("test-secret"));
        let service = AuthService::new(repo.clone(), jwt.clone(), jwt, Duration::hours(1));
        (service, repo)
    }

    #[test]
    fn login_issues_a_token_for_the_normalized_email() {
        let (auth, _) = service_with("s3nh4");
        let now = Utc::now();
        let session = auth.login(Some(" ANA@b.com "), Some("s3nh4"), now).unwrap();

        let claims = auth.authenticate(&session.token, now).unwrap();
        assert_eq!(claims.sub.as_str(), "ana@b.com");
        assert_eq!(claims.nome, "Ana Souza");
        assert_eq!(claims.uid, session.client.id);
    }

    #[test]
    fn unknown_email_and_wrong_password_fail_identically() {
        let (auth, _) = service_with("s3nh4");
        let now = Utc::now();
        let unknown = auth.login(Some("ghost@b.com"), Some("s3nh4"), now).unwrap_err();
        let wrong = auth.login(Some("ana@b.com"), Some("nope"), now).unwrap_err();
        assert_eq!(unknown, wrong);
        assert_eq!(unknown, DomainError::unauthorized(INVALID_CREDENTIALS));
    }

    #[test]
    fn login_requires_both_fields() {
        let (auth, _) = service_with("s3nh4");
        let err = auth.login(Some("ana@b.com"), Some("  "), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn me_fails_when_subject_is_gone() {
        let (auth, _) = service_with("s3nh4");
        let now = Utc::now();
        let ghost = client("ghost@b.com");
        let claims = JwtClaims::new(ghost.email, "Ghost", ghost.id, now, Duration::hours(1));
        let token = auth.issuer.issue(&claims).unwrap();

        assert_eq!(auth.me(&token, now), Err(DomainError::not_found("Usuário não encontrado")));
        assert!(matches!(auth.me("garbage", now), Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn forgot_password_for_unknown_email_is_silent() {
        let (auth, _) = service_with("s3nh4");
        assert!(auth.forgot_password(Some("ghost@b.com"), Utc::now()).unwrap().is_none());
    }

    #[test]
    fn reset_token_validates_until_expiry() {
        let (auth, _) = service_with("s3nh4");
        let now = Utc::now();
        let (_, reset) = auth.forgot_password(Some("ana@b.com"), now).unwrap().unwrap();

        let client = auth.confirm_reset_token(Some(&reset.token), now).unwrap();
        assert_eq!(client.email.as_str(), "ana@b.com");

        let later = now + Duration::minutes(61);
        assert_eq!(
            auth.confirm_reset_token(Some(&reset.token), later),
            Err(DomainError::not_found(INVALID_RESET_TOKEN))
        );
    }

    #[test]
    fn reset_password_is_single_use() {
        let (auth, _) = service_with("old");
        let now = Utc::now();
        let (_, reset) = auth.forgot_password(Some("ana@b.com"), now).unwrap().unwrap();

        auth.reset_password(Some(&reset.token), Some("new"), now).unwrap();
        assert!(auth.login(Some("ana@b.com"), Some("new"), now).is_ok());
        assert!(auth.login(Some("ana@b.com"), Some("old"), now).is_err());

        assert!(auth.confirm_reset_token(Some(&reset.token), now).is_err());
        assert!(matches!(
            auth.reset_password(Some(&reset.token), Some("again"), now),
            Err(DomainError::NotFound(_))
        ));
    }
}
