use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use smartquota_core::{DomainError, DomainResult, Email};

use crate::client::Client;

pub const DUPLICATE_EMAIL: &str = "Email já cadastrado.";

/// Client storage abstraction (get/find/insert/update).
///
/// Implementations must make `insert` atomic with its uniqueness check and
/// run each `update*` closure under exclusive access to the record.
pub trait ClientRepository: Send + Sync {
    /// Insert a new client. Fails with `Conflict` if the email is taken.
    fn insert(&self, client: Client) -> DomainResult<()>;

    fn get(&self, email: &Email) -> DomainResult<Option<Client>>;

    /// First client matching `predicate`.
    fn find(&self, predicate: &dyn Fn(&Client) -> bool) -> DomainResult<Option<Client>>;

    /// Mutate the first client matching `predicate`; returns the updated record.
    fn update_where(
        &self,
        predicate: &dyn Fn(&Client) -> bool,
        apply: &mut dyn FnMut(&mut Client),
    ) -> DomainResult<Option<Client>>;

    fn update(&self, email: &Email, apply: &mut dyn FnMut(&mut Client)) -> DomainResult<Option<Client>> {
        self.update_where(&|c: &Client| c.email == *email, apply)
    }
}

impl<S> ClientRepository for Arc<S>
where
    S: ClientRepository + ?Sized,
{
    fn insert(&self, client: Client) -> DomainResult<()> {
        (**self).insert(client)
    }

    fn get(&self, email: &Email) -> DomainResult<Option<Client>> {
        (**self).get(email)
    }

    fn find(&self, predicate: &dyn Fn(&Client) -> bool) -> DomainResult<Option<Client>> {
        (**self).find(predicate)
    }

    fn update_where(
        &self,
        predicate: &dyn Fn(&Client) -> bool,
        apply: &mut dyn FnMut(&mut Client),
    ) -> DomainResult<Option<Client>> {
        (**self).update_where(predicate, apply)
    }

    fn update(&self, email: &Email, apply: &mut dyn FnMut(&mut Client)) -> DomainResult<Option<Client>> {
        (**self).update(email, apply)
    }
}

/// In-memory client registry for dev/tests. Data is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryClientRepository {
    inner: RwLock<HashMap<Email, Client>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> DomainError {
    DomainError::internal("client store lock poisoned")
}

impl ClientRepository for InMemoryClientRepository {
    fn insert(&self, client: Client) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&client.email) {
            return Err(DomainError::conflict(DUPLICATE_EMAIL));
        }
        map.insert(client.email.clone(), client);
        Ok(())
    }

    fn get(&self, email: &Email) -> DomainResult<Option<Client>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(email).cloned())
    }

    fn find(&self, predicate: &dyn Fn(&Client) -> bool) -> DomainResult<Option<Client>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|c| predicate(*c)).cloned())
    }

    fn update_where(
        &self,
        predicate: &dyn Fn(&Client) -> bool,
        apply: &mut dyn FnMut(&mut Client),
    ) -> DomainResult<Option<Client>> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.values_mut().find(|c| predicate(&**c)).map(|client| {
            apply(client);
            client.clone()
        }))
    }

    fn update(&self, email: &Email, apply: &mut dyn FnMut(&mut Client)) -> DomainResult<Option<Client>> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.get_mut(email).map(|client| {
            apply(client);
            client.clone()
        }))
    }
}
