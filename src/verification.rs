//! Email verification codes
//!
//! Six-digit codes keyed by the email address being confirmed. A code lives
//! for ten minutes; expired codes are swept whenever a new code is sent.
//! The store is process-local and does not survive a restart.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::cache::TtlCache;

/// Default lifetime of a verification code
pub const DEFAULT_CODE_TTL_SECS: i64 = 10 * 60;

/// Generate a random six-digit code (100000..=999999)
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Pending verification codes keyed by email
pub struct VerificationStore {
    codes: Mutex<TtlCache<String, String>>,
}

impl VerificationStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            codes: Mutex::new(TtlCache::new(ttl)),
        }
    }

    /// Generate a code for `email`, replacing any earlier one
    pub async fn issue(&self, email: &str) -> String {
        let code = generate_code();
        self.store_at(email, &code, Utc::now()).await;
        code
    }

    pub async fn store_at(&self, email: &str, code: &str, now: DateTime<Utc>) {
        self.codes
            .lock()
            .await
            .insert_at(email.to_string(), code.to_string(), now);
    }

    /// Remove expired codes, returning how many were dropped
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let removed = self.codes.lock().await.sweep_at(now);
        if removed > 0 {
            tracing::debug!(removed, "Swept expired verification codes");
        }
        removed
    }

    pub async fn verify(&self, email: &str, provided: &str) -> Result<(), VerificationError> {
        self.verify_at(email, provided, Utc::now()).await
    }

    /// Check `provided` against the stored code for `email`
    ///
    /// The provided code is trimmed before comparison. An expired code is
    /// removed. A matching code is left in place until [`consume`](Self::consume).
    pub async fn verify_at(
        &self,
        email: &str,
        provided: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        let mut codes = self.codes.lock().await;
        let key = email.to_string();

        let (stored, issued_at) = codes.peek(&key).ok_or(VerificationError::NotFound)?;

        if issued_at < now - codes.ttl() {
            codes.remove(&key);
            return Err(VerificationError::Expired);
        }

        if stored != provided.trim() {
            return Err(VerificationError::Mismatch);
        }

        Ok(())
    }

    /// Drop the code for `email` once it has been used
    pub async fn consume(&self, email: &str) -> bool {
        self.codes.lock().await.remove(&email.to_string()).is_some()
    }

    pub async fn pending(&self) -> usize {
        self.codes.lock().await.len()
    }
}

impl Default for VerificationStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_CODE_TTL_SECS))
    }
}

/// Reasons a verification attempt fails
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("No verification code found. Please request a new one.")]
    NotFound,

    #[error("Verification code has expired. Please request a new one.")]
    Expired,

    #[error("Invalid verification code")]
    Mismatch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_code_is_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[tokio::test]
    async fn test_verify_matching_code() {
        let store = VerificationStore::default();
        store.store_at("a@example.com", "123456", t0()).await;

        let result = store
            .verify_at("a@example.com", " 123456 ", t0() + Duration::minutes(3))
            .await;
        assert_eq!(result, Ok(()));
        // Still present until consumed
        assert_eq!(store.pending().await, 1);
        assert!(store.consume("a@example.com").await);
        assert_eq!(store.pending().await, 0);
    }

    #[tokio::test]
    async fn test_verify_unknown_email() {
        let store = VerificationStore::default();
        let result = store.verify_at("nobody@example.com", "123456", t0()).await;
        assert_eq!(result, Err(VerificationError::NotFound));
    }

    #[tokio::test]
    async fn test_verify_mismatch() {
        let store = VerificationStore::default();
        store.store_at("a@example.com", "123456", t0()).await;

        let result = store.verify_at("a@example.com", "654321", t0()).await;
        assert_eq!(result, Err(VerificationError::Mismatch));
        assert_eq!(store.pending().await, 1);
    }

    #[tokio::test]
    async fn test_expiry_boundary_at_ten_minutes() {
        let store = VerificationStore::default();
        store.store_at("a@example.com", "123456", t0()).await;

        // Exactly ten minutes old is still valid
        let at_boundary = t0() + Duration::minutes(10);
        assert_eq!(store.verify_at("a@example.com", "123456", at_boundary).await, Ok(()));

        // One millisecond later it has expired and is removed
        let past = at_boundary + Duration::milliseconds(1);
        assert_eq!(
            store.verify_at("a@example.com", "123456", past).await,
            Err(VerificationError::Expired)
        );
        assert_eq!(
            store.verify_at("a@example.com", "123456", past).await,
            Err(VerificationError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_sweep_on_write() {
        let store = VerificationStore::default();
        store.store_at("old@example.com", "111111", t0()).await;
        store
            .store_at("new@example.com", "222222", t0() + Duration::minutes(11))
            .await;

        let removed = store.sweep_at(t0() + Duration::minutes(11)).await;
        assert_eq!(removed, 1);
        assert_eq!(store.pending().await, 1);
    }

    #[tokio::test]
    async fn test_issue_replaces_previous_code() {
        let store = VerificationStore::default();
        store.store_at("a@example.com", "000000", t0()).await;

        let code = store.issue("a@example.com").await;
        assert_eq!(store.pending().await, 1);
        assert_eq!(store.verify("a@example.com", &code).await, Ok(()));
    }
}
