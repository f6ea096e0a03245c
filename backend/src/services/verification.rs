//! In-memory verification code store
//!
//! Codes are six digits, expire after five minutes and allow at most three
//! wrong attempts. Every check outcome other than "pending and wrong but
//! attempts remain" consumes the entry, so a code can never be used twice.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

/// Code lifetime
pub const CODE_TTL_SECS: i64 = 300;

/// Wrong attempts allowed before the code is invalidated
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
struct CodeEntry {
    code: String,
    expires_at: DateTime<Utc>,
    attempts: u32,
}

/// Shared map of phone number to pending verification code.
///
/// Clones share the same underlying map, so the store can live in the
/// application state and be handed to the background sweeper.
#[derive(Debug, Clone, Default)]
pub struct CodeStore {
    entries: Arc<Mutex<HashMap<String, CodeEntry>>>,
}

impl CodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Entries stay coherent even if a holder panicked mid-update, so a
    // poisoned lock is recovered rather than propagated.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, CodeEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a fresh code for `phone`, replacing any previous one
    pub fn put_code(&self, phone: &str, code: &str) {
        let entry = CodeEntry {
            code: code.to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(CODE_TTL_SECS),
            attempts: 0,
        };
        self.entries().insert(phone.to_string(), entry);
    }

    /// Whether an unexpired code is pending for `phone`. Used to throttle
    /// resends: a new code is only sent once the previous one has expired.
    pub fn has_pending(&self, phone: &str) -> bool {
        self.entries()
            .get(phone)
            .map(|e| e.expires_at > Utc::now())
            .unwrap_or(false)
    }

    /// Check `code` against the pending entry for `phone`.
    ///
    /// Returns true only on an exact match of a live code. Expiry, exhausted
    /// attempts and successful matches all remove the entry.
    pub fn check(&self, phone: &str, code: &str) -> bool {
        let mut entries = self.entries();

        let Some(entry) = entries.get_mut(phone) else {
            return false;
        };

        if entry.expires_at <= Utc::now() {
            entries.remove(phone);
            return false;
        }

        entry.attempts += 1;
        if entry.attempts > MAX_ATTEMPTS {
            entries.remove(phone);
            return false;
        }

        if entry.code == code {
            entries.remove(phone);
            return true;
        }

        false
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.entries().retain(|_, e| e.expires_at > now);
    }

    /// Periodically purge expired entries so abandoned codes do not pile up
    pub fn spawn_sweeper(&self, interval: Duration) {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                store.purge_expired();
            }
        });
    }

    #[cfg(test)]
    fn put_with_expiry(&self, phone: &str, code: &str, expires_at: DateTime<Utc>) {
        self.entries().insert(
            phone.to_string(),
            CodeEntry {
                code: code.to_string(),
                expires_at,
                attempts: 0,
            },
        );
    }
}

/// Random six-digit code, never with a leading zero
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE: &str = "+51987654321";

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }

    #[test]
    fn test_correct_code_matches_once() {
        let store = CodeStore::new();
        store.put_code(PHONE, "123456");
        assert!(store.check(PHONE, "123456"));
        // Consumed on success
        assert!(!store.check(PHONE, "123456"));
    }

    #[test]
    fn test_wrong_code_does_not_match() {
        let store = CodeStore::new();
        store.put_code(PHONE, "123456");
        assert!(!store.check(PHONE, "000000"));
        // A wrong attempt does not invalidate the real code
        assert!(store.check(PHONE, "123456"));
    }

    #[test]
    fn test_absent_phone() {
        let store = CodeStore::new();
        assert!(!store.check(PHONE, "123456"));
    }

    #[test]
    fn test_expired_code_is_removed() {
        let store = CodeStore::new();
        store.put_with_expiry(PHONE, "123456", Utc::now() - chrono::Duration::seconds(1));
        assert!(!store.check(PHONE, "123456"));
        assert!(!store.has_pending(PHONE));
    }

    #[test]
    fn test_attempts_are_limited() {
        let store = CodeStore::new();
        store.put_code(PHONE, "123456");
        for _ in 0..MAX_ATTEMPTS {
            assert!(!store.check(PHONE, "000000"));
        }
        // Fourth attempt invalidates the entry even with the right code
        assert!(!store.check(PHONE, "123456"));
        assert!(!store.check(PHONE, "123456"));
    }

    #[test]
    fn test_has_pending_throttles_resend() {
        let store = CodeStore::new();
        assert!(!store.has_pending(PHONE));
        store.put_code(PHONE, "123456");
        assert!(store.has_pending(PHONE));
    }

    #[test]
    fn test_put_replaces_previous_code() {
        let store = CodeStore::new();
        store.put_code(PHONE, "111111");
        store.put_code(PHONE, "222222");
        assert!(!store.check(PHONE, "111111"));
        assert!(store.check(PHONE, "222222"));
    }

    #[test]
    fn test_store_survives_a_poisoned_lock() {
        let store = CodeStore::new();
        store.put_code(PHONE, "123456");

        let clone = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.entries.lock().unwrap();
            panic!("poisoning the lock");
        })
        .join();

        // The store keeps working after an unrelated holder panicked
        assert!(store.has_pending(PHONE));
        assert!(store.check(PHONE, "123456"));
    }

    #[test]
    fn test_purge_expired_keeps_live_entries() {
        let store = CodeStore::new();
        store.put_with_expiry("+51911111111", "111111", Utc::now() - chrono::Duration::seconds(1));
        store.put_code(PHONE, "222222");
        store.purge_expired();
        assert!(!store.has_pending("+51911111111"));
        assert!(store.check(PHONE, "222222"));
    }
}
