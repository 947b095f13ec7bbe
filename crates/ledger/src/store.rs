use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use smartquota_core::{DomainError, DomainResult, Email, Period};

use crate::bucket::Bucket;

/// Bucket storage keyed by `(owner, period)`.
///
/// Exactly one bucket exists per key; it is created with defaults on first access.
pub trait LedgerStore: Send + Sync {
    /// Current bucket for the key, creating an empty one if absent.
    fn get_or_create(&self, owner: &Email, period: Period) -> DomainResult<Bucket>;

    /// Run `apply` on the bucket under exclusive access and return its new state.
    fn update(&self, owner: &Email, period: Period, apply: &mut dyn FnMut(&mut Bucket)) -> DomainResult<Bucket>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn get_or_create(&self, owner: &Email, period: Period) -> DomainResult<Bucket> {
        (**self).get_or_create(owner, period)
    }

    fn update(&self, owner: &Email, period: Period, apply: &mut dyn FnMut(&mut Bucket)) -> DomainResult<Bucket> {
        (**self).update(owner, period, apply)
    }
}

/// In-memory ledger for dev/tests. Data is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<HashMap<(Email, Period), Bucket>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buckets materialized so far.
    pub fn bucket_count(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }
}

fn poisoned() -> DomainError {
    DomainError::internal("ledger store lock poisoned")
}

impl LedgerStore for InMemoryLedgerStore {
    fn get_or_create(&self, owner: &Email, period: Period) -> DomainResult<Bucket> {
        let key = (owner.clone(), period);
        if let Some(bucket) = self.inner.read().map_err(|_| poisoned())?.get(&key) {
            return Ok(bucket.clone());
        }

        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.entry(key).or_default().clone())
    }

    fn update(&self, owner: &Email, period: Period, apply: &mut dyn FnMut(&mut Bucket)) -> DomainResult<Bucket> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let bucket = map.entry((owner.clone(), period)).or_default();
        apply(bucket);
        Ok(bucket.clone())
    }
}
