//! Password-reset tokens: random, single-use, expiring.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};

/// How long a reset token stays valid after issuance.
pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

const TOKEN_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    /// Generate a new token expiring [`reset_token_ttl`] after `now`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self {
            token: Alphanumeric.sample_string(&mut rand::thread_rng(), TOKEN_LEN),
            expires_at: now + reset_token_ttl(),
        }
    }

    /// Whether `candidate` is this token and it has not expired at `now`.
    pub fn matches(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        !candidate.is_empty() && self.token == candidate && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_random_and_expire_in_an_hour() {
        let now = Utc::now();
        let a = ResetToken::generate(now);
        let b = ResetToken::generate(now);
        assert_ne!(a.token, b.token);
        assert_eq!(a.token.len(), TOKEN_LEN);
        assert_eq!(a.expires_at, now + Duration::hours(1));
    }

    #[test]
    fn matches_only_before_expiry() {
        let now = Utc::now();
        let t = ResetToken::generate(now);
        assert!(t.matches(&t.token, now + Duration::minutes(59)));
        assert!(!t.matches(&t.token, now + Duration::minutes(60)));
        assert!(!t.matches("other", now));
    }
}
