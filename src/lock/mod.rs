//! Submission lock: a named, TTL-bound "this visitor already sent this
//! form" marker over pluggable client-scoped storage.
//!
//! This is a UX throttle, not a security control. The record is a single
//! expiry timestamp per lock name; expiry is evaluated lazily on read, and
//! every storage failure reads as "not locked" so a broken cookie jar can
//! never wedge a form shut. Distinct names are fully independent.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub mod store;

pub use store::{LockStore, MemoryLockStore, SessionLockStore, SqliteLockStore, StoreError};

/// Lock name used by every lead-capture surface (popup, contact page, EMI
/// form, mentorship page). One submission quiets them all.
pub const LEAD_GLOBAL_LOCK: &str = "lead-global";

/// Cooldown for the global lead lock.
pub const LEAD_GLOBAL_TTL_SECONDS: u64 = 180;

/// Fixed key of the legacy "has this visitor ever submitted a lead" flag,
/// written to both storage scopes.
pub const LEAD_FLAG_KEY: &str = "lead_submitted";

const LOCK_KEY_PREFIX: &str = "submitted";

pub struct SubmissionLock {
    name: String,
    ttl_seconds: u64,
}

impl SubmissionLock {
    pub fn new(name: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            name: name.into(),
            ttl_seconds,
        }
    }

    /// The global lead lock with its production cooldown.
    pub fn lead_global() -> Self {
        Self::new(LEAD_GLOBAL_LOCK, LEAD_GLOBAL_TTL_SECONDS)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn storage_key(&self) -> String {
        format!("{}:{}", LOCK_KEY_PREFIX, self.name)
    }

    /// True iff a stored expiry for this name still lies in the future.
    pub fn has_submitted(&self, store: &dyn LockStore) -> bool {
        self.has_submitted_at(store, now_millis())
    }

    pub fn has_submitted_at(&self, store: &dyn LockStore, now_ms: i64) -> bool {
        match store.get(&self.storage_key()) {
            Ok(Some(raw)) => raw
                .parse::<i64>()
                .map(|expires_at| now_ms < expires_at)
                .unwrap_or(false),
            Ok(None) => false,
            Err(_) => false,
        }
    }

    /// Write a fresh expiry record. Idempotent; a repeat call just renews
    /// the window.
    pub fn mark_submitted(&self, store: &dyn LockStore) {
        self.mark_submitted_at(store, now_millis());
    }

    pub fn mark_submitted_at(&self, store: &dyn LockStore, now_ms: i64) {
        let ttl_ms = (self.ttl_seconds as i64).saturating_mul(1000);
        let expires_at = now_ms.saturating_add(ttl_ms);
        if let Err(e) = store.set(&self.storage_key(), &expires_at.to_string()) {
            log::debug!("submission lock '{}' could not be persisted: {}", self.name, e);
        }
    }

    /// Drop the record regardless of remaining TTL.
    pub fn clear(&self, store: &dyn LockStore) {
        if let Err(e) = store.remove(&self.storage_key()) {
            log::debug!("submission lock '{}' could not be cleared: {}", self.name, e);
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

type Listener = Box<dyn Fn(bool) + Send + Sync>;

pub struct Subscription {
    name: String,
    id: u64,
}

/// In-process observer registry so every consumer of one lock name inside a
/// request/process sees `mark`/`clear` immediately. There is no cross-process
/// push: a second browser tab re-reads its cookie store on its own next
/// request and may briefly disagree. That staleness window is accepted.
#[derive(Default)]
pub struct LockHub {
    listeners: Mutex<HashMap<String, Vec<(u64, Listener)>>>,
    next_id: AtomicU64,
}

impl LockHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        name: &str,
        listener: impl Fn(bool) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners
                .entry(name.to_string())
                .or_default()
                .push((id, Box::new(listener)));
        }
        Subscription {
            name: name.to_string(),
            id,
        }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        if let Ok(mut listeners) = self.listeners.lock() {
            if let Some(entries) = listeners.get_mut(&subscription.name) {
                entries.retain(|(id, _)| *id != subscription.id);
            }
        }
    }

    /// Mark the lock in `store` and notify every in-process observer.
    pub fn mark(&self, lock: &SubmissionLock, store: &dyn LockStore) {
        lock.mark_submitted(store);
        self.notify(lock.name(), true);
    }

    /// Clear the lock in `store` and notify every in-process observer.
    pub fn clear(&self, lock: &SubmissionLock, store: &dyn LockStore) {
        lock.clear(store);
        self.notify(lock.name(), false);
    }

    fn notify(&self, name: &str, locked: bool) {
        if let Ok(listeners) = self.listeners.lock() {
            if let Some(entries) = listeners.get(name) {
                for (_, listener) in entries {
                    listener(locked);
                }
            }
        }
    }
}

/// Raise the legacy lead flag in both scopes through the same wrapper.
pub fn set_lead_flag(session_scope: &dyn LockStore, durable_scope: &dyn LockStore) {
    for scope in [session_scope, durable_scope] {
        if let Err(e) = scope.set(LEAD_FLAG_KEY, "1") {
            log::debug!("lead flag could not be persisted: {}", e);
        }
    }
}

/// True if either scope still carries the legacy lead flag.
pub fn has_lead_flag(session_scope: &dyn LockStore, durable_scope: &dyn LockStore) -> bool {
    [session_scope, durable_scope]
        .iter()
        .any(|scope| matches!(scope.get(LEAD_FLAG_KEY), Ok(Some(v)) if v == "1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct FailingStore;

    impl LockStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Backend("quota exceeded".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("quota exceeded".to_string()))
        }
    }

    #[test]
    fn lock_expires_after_ttl() {
        let store = MemoryLockStore::new();
        let lock = SubmissionLock::new("lead-global", 180);
        let t0 = 1_700_000_000_000;

        lock.mark_submitted_at(&store, t0);
        assert!(lock.has_submitted_at(&store, t0));
        assert!(lock.has_submitted_at(&store, t0 + 179_999));
        assert!(!lock.has_submitted_at(&store, t0 + 180_000));
        assert!(!lock.has_submitted_at(&store, t0 + 181_000));
    }

    #[test]
    fn locks_with_distinct_names_are_independent() {
        let store = MemoryLockStore::new();
        let a = SubmissionLock::new("a", 60);
        let b = SubmissionLock::new("b", 60);
        let t0 = 1_700_000_000_000;

        a.mark_submitted_at(&store, t0);
        assert!(a.has_submitted_at(&store, t0));
        assert!(!b.has_submitted_at(&store, t0));

        b.mark_submitted_at(&store, t0);
        a.clear(&store);
        assert!(!a.has_submitted_at(&store, t0));
        assert!(b.has_submitted_at(&store, t0));
    }

    #[test]
    fn clear_unlocks_immediately() {
        let store = MemoryLockStore::new();
        let lock = SubmissionLock::new("contact", 3600);
        let t0 = 1_700_000_000_000;

        lock.mark_submitted_at(&store, t0);
        assert!(lock.has_submitted_at(&store, t0 + 1));
        lock.clear(&store);
        assert!(!lock.has_submitted_at(&store, t0 + 1));
    }

    #[test]
    fn remark_renews_the_window() {
        let store = MemoryLockStore::new();
        let lock = SubmissionLock::new("lead-global", 180);
        let t0 = 1_700_000_000_000;

        lock.mark_submitted_at(&store, t0);
        lock.mark_submitted_at(&store, t0 + 100_000);
        assert!(lock.has_submitted_at(&store, t0 + 200_000));
        assert!(!lock.has_submitted_at(&store, t0 + 280_000));
    }

    #[test]
    fn failing_store_reads_as_unlocked() {
        let store = FailingStore;
        let lock = SubmissionLock::new("lead-global", 180);

        lock.mark_submitted(&store);
        assert!(!lock.has_submitted(&store));
        lock.clear(&store);
        assert!(!lock.has_submitted(&store));
    }

    #[test]
    fn garbage_record_reads_as_unlocked() {
        let store = MemoryLockStore::new();
        store.set("submitted:lead-global", "not-a-timestamp").unwrap();
        let lock = SubmissionLock::new("lead-global", 180);
        assert!(!lock.has_submitted_at(&store, 0));
    }

    #[test]
    fn hub_notifies_all_observers_of_one_name() {
        let store = MemoryLockStore::new();
        let hub = LockHub::new();
        let lock = SubmissionLock::new("lead-global", 180);

        let seen_a = Arc::new(AtomicUsize::new(0));
        let seen_b = Arc::new(AtomicUsize::new(0));
        let other = Arc::new(AtomicUsize::new(0));

        let a = Arc::clone(&seen_a);
        hub.subscribe("lead-global", move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let b = Arc::clone(&seen_b);
        hub.subscribe("lead-global", move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        });
        let o = Arc::clone(&other);
        let other_sub = hub.subscribe("newsletter", move |_| {
            o.fetch_add(1, Ordering::SeqCst);
        });

        hub.mark(&lock, &store);
        hub.clear(&lock, &store);

        assert_eq!(seen_a.load(Ordering::SeqCst), 2);
        assert_eq!(seen_b.load(Ordering::SeqCst), 2);
        assert_eq!(other.load(Ordering::SeqCst), 0);

        hub.unsubscribe(other_sub);
    }

    #[test]
    fn unsubscribed_observer_stops_receiving() {
        let store = MemoryLockStore::new();
        let hub = LockHub::new();
        let lock = SubmissionLock::new("lead-global", 180);

        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        let sub = hub.subscribe("lead-global", move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        hub.mark(&lock, &store);
        hub.unsubscribe(sub);
        hub.mark(&lock, &store);

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lead_flag_spans_both_scopes() {
        let session_scope = MemoryLockStore::new();
        let durable_scope = MemoryLockStore::new();

        assert!(!has_lead_flag(&session_scope, &durable_scope));
        set_lead_flag(&session_scope, &durable_scope);
        assert!(has_lead_flag(&session_scope, &durable_scope));

        // Session scope emptied (browser restart analog): the durable copy
        // still answers.
        session_scope.remove(LEAD_FLAG_KEY).unwrap();
        assert!(has_lead_flag(&session_scope, &durable_scope));
    }

    #[test]
    fn lead_flag_survives_one_broken_scope() {
        let durable_scope = MemoryLockStore::new();
        set_lead_flag(&FailingStore, &durable_scope);
        assert!(has_lead_flag(&FailingStore, &durable_scope));
    }
}
