use smartquota_auth::JwtClaims;
use smartquota_core::Email;

/// Principal context for a request (verified bearer token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    claims: JwtClaims,
}

impl PrincipalContext {
    pub fn new(claims: JwtClaims) -> Self {
        Self { claims }
    }

    /// Normalized email of the caller; also the ledger owner key.
    pub fn email(&self) -> &Email {
        &self.claims.sub
    }

    pub fn claims(&self) -> &JwtClaims {
        &self.claims
    }
}
