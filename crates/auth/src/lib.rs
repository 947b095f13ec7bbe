//! `smartquota-auth`: credential primitives.
//!
//! This crate is intentionally decoupled from HTTP and storage: token claims,
//! HS256 signing/verification, password hashing and reset-token generation.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod reset;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtValidator, TokenIssueError, TokenIssuer};
pub use password::{PasswordHashError, hash_password, verify_absent, verify_password};
pub use reset::{ResetToken, reset_token_ttl};
