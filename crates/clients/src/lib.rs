//! Client registry and authentication service.
//!
//! Both services are constructed over an injected [`ClientRepository`]; neither
//! reaches into the other's storage.

pub mod authn;
pub mod client;
pub mod registry;
pub mod repository;

pub use authn::{AuthService, INVALID_CREDENTIALS, INVALID_RESET_TOKEN, Session};
pub use client::{Address, AddressInput, Client, ClientProfile, Registration, ValidRegistration};
pub use registry::{ClientRegistry, Confirmation, confirmation_token};
pub use repository::{ClientRepository, DUPLICATE_EMAIL, InMemoryClientRepository};
