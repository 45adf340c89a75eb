//! Storage accessors backing the submission lock: one trait, three scopes.
//!
//! `SessionLockStore` rides on the visitor's session cookie (the store the
//! production lead forms actually use), `SqliteLockStore` persists across
//! sessions in the `submission_flags` table, and `MemoryLockStore` is the
//! in-process scope used by tests and offline tooling. Values are plain
//! strings; the lock layer decides what they mean.

use std::collections::HashMap;
use std::sync::Mutex;

use actix_session::Session;
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Backend(String),
}

pub trait LockStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process map store.
#[derive(Default)]
pub struct MemoryLockStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockStore for MemoryLockStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Adapter over the actix session cookie. Keys live next to the auth state
/// in the same cookie jar, so every tab of one browser profile shares them.
pub struct SessionLockStore<'a> {
    session: &'a Session,
}

impl<'a> SessionLockStore<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }
}

impl LockStore for SessionLockStore<'_> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.session
            .get::<String>(key)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.session
            .insert(key, value.to_string())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.session.remove(key);
        Ok(())
    }
}

/// Durable cross-session scope over the `submission_flags` table.
pub struct SqliteLockStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteLockStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl LockStore for SqliteLockStore<'_> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT value FROM submission_flags WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO submission_flags (key, value) VALUES (?1, ?2)",
                [key, value],
            )
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM submission_flags WHERE key = ?1", [key])
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
