use std::sync::Arc;

use axum::response::Response;

use smartquota_auth::Hs256Jwt;
use smartquota_clients::{AuthService, ClientRegistry, ClientRepository, InMemoryClientRepository};
use smartquota_core::{DomainError, DomainResult};
use smartquota_ledger::{InMemoryLedgerStore, LedgerService};

use crate::app::errors::{self, ErrorStyle};
use crate::config::{ApiConfig, Environment};
use crate::mailer::{Links, Mailer};

/// Everything the handlers need, shared through an `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub registry: ClientRegistry,
    pub auth: AuthService,
    pub ledger: LedgerService,
    pub mailer: Arc<dyn Mailer>,
    pub links: Links,
    environment: Environment,
}

impl AppServices {
    pub fn expose_error_details(&self) -> bool {
        self.environment.is_development()
    }

    /// `{error}`-style response for client and auth routes.
    pub fn client_error(&self, err: DomainError) -> Response {
        errors::domain_error_to_response(err, ErrorStyle::Error, self.expose_error_details())
    }

    /// `{message}`-style response for the ledger routes.
    pub fn ledger_error(&self, err: DomainError) -> Response {
        errors::domain_error_to_response(err, ErrorStyle::Message, self.expose_error_details())
    }
}

/// Wire the in-memory repositories into the services.
pub fn build_services(config: &ApiConfig, mailer: Arc<dyn Mailer>) -> AppServices {
    let clients: Arc<dyn ClientRepository> = Arc::new(InMemoryClientRepository::new());
    let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes()));

    AppServices {
        registry: ClientRegistry::new(clients.clone()),
        auth: AuthService::new(clients, jwt.clone(), jwt, config.token_ttl),
        ledger: LedgerService::new(Arc::new(InMemoryLedgerStore::new())),
        mailer,
        links: Links::from_config(config),
        environment: config.environment,
    }
}

/// Run CPU-bound work (password hashing) on the blocking pool.
pub async fn blocking<T, F>(work: F) -> DomainResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> DomainResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DomainError::internal(format!("blocking task failed: {e}")))?
}
