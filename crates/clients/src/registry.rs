//! Client registry: registration and email confirmation.

use std::sync::Arc;

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use chrono::{DateTime, Utc};

use smartquota_auth::hash_password;
use smartquota_core::{ClientId, DomainError, DomainResult, Email};

use crate::client::{Client, Registration};
use crate::repository::{ClientRepository, DUPLICATE_EMAIL};

/// base64url without padding on encode; either form accepted on decode.
const CONFIRMATION_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Opaque token carried by the alternative confirmation link.
pub fn confirmation_token(email: &Email) -> String {
    CONFIRMATION_ENGINE.encode(email.as_str())
}

fn email_from_confirmation_token(token: &str) -> Option<String> {
    let bytes = CONFIRMATION_ENGINE.decode(token.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Outcome of a confirmation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub client: Client,
    /// `false` when the client had already been confirmed.
    pub newly_confirmed: bool,
}

#[derive(Clone)]
pub struct ClientRegistry {
    clients: Arc<dyn ClientRepository>,
}

impl ClientRegistry {
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self { clients }
    }

    /// Validate, hash and store a new unconfirmed client.
    ///
    /// Password hashing is CPU-bound; async callers should run this on a
    /// blocking thread.
    pub fn register(&self, registration: Registration, now: DateTime<Utc>) -> DomainResult<Client> {
        let valid = registration.validate().map_err(DomainError::validation_many)?;

        // Cheap pre-check so duplicates don't pay for hashing; `insert` re-checks atomically.
        if self.clients.get(&valid.email)?.is_some() {
            return Err(DomainError::conflict(DUPLICATE_EMAIL));
        }

        let password_hash = hash_password(&valid.password).map_err(|e| DomainError::internal(e.to_string()))?;

        let client = Client {
            id: ClientId::new(),
            name: valid.name,
            email: valid.email,
            phone: valid.phone,
            address: valid.address,
            password_hash,
            currency: valid.currency,
            confirmed: false,
            created_at: now,
            reset: None,
        };

        self.clients.insert(client.clone())?;
        tracing::info!(client_id = %client.id, email = %client.email, "client registered");
        Ok(client)
    }

    /// Mark a client as confirmed, addressed either by email or by confirmation token.
    ///
    /// Idempotent: confirming twice succeeds both times.
    pub fn confirm_email(&self, email: Option<&str>, token: Option<&str>) -> DomainResult<Confirmation> {
        let raw = email
            .filter(|e| !e.trim().is_empty())
            .map(str::to_string)
            .or_else(|| token.and_then(email_from_confirmation_token));

        let email = raw
            .as_deref()
            .and_then(Email::parse)
            .ok_or_else(|| DomainError::validation("Requisição inválida: email ou token ausente."))?;

        let mut newly_confirmed = false;
        let client = self
            .clients
            .update(&email, &mut |c: &mut Client| {
                newly_confirmed = !c.confirmed;
                c.confirmed = true;
            })?
            .ok_or_else(|| DomainError::not_found("Cliente não encontrado."))?;

        if newly_confirmed {
            tracing::info!(client_id = %client.id, "email confirmed");
        }
        Ok(Confirmation { client, newly_confirmed })
    }
}
