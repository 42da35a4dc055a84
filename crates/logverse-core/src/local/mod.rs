//! Local device store: JSON values in SQLite, namespaced per user.

mod migrations;
mod session_record;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub use session_record::LocalSessionRecord;

const GLOBAL_NAMESPACE: &str = "app";

/// Storage namespace for a user's keys.
///
/// Namespace and key are stored as separate columns, so two users can never
/// share a slot whatever characters their ids contain.
pub fn user_namespace(user_id: &str) -> Result<String> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(Error::InvalidInput("user id cannot be empty".to_string()));
    }
    Ok(format!("user_{user_id}"))
}

/// Flat display form of a user's key, `user_<id>_<key>`.
pub fn namespaced_key(user_id: &str, key: &str) -> Result<String> {
    Ok(format!("{}_{key}", user_namespace(user_id)?))
}

/// Synchronous key/value store backed by a local SQLite file.
pub struct LocalStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// Open (or create) the store at `path`, running migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        let store = Self::from_connection(conn, Some(path))?;
        tracing::debug!("Opened local store at {:?}", store.path);
        Ok(store)
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        // WAL is unavailable for in-memory databases.
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read a user's value. Missing, unreadable or unparseable values are
    /// all reported as absent.
    pub fn read<T: DeserializeOwned>(&self, user_id: &str, key: &str) -> Option<T> {
        let namespace = match user_namespace(user_id) {
            Ok(namespace) => namespace,
            Err(error) => {
                tracing::warn!("Skipping local read of '{}': {}", key, error);
                return None;
            }
        };
        self.read_in(&namespace, key)
    }

    /// Write a user's value. Callers may ignore the error; the value simply
    /// is not persisted.
    pub fn write<T: Serialize + ?Sized>(&self, user_id: &str, key: &str, value: &T) -> Result<()> {
        self.write_in(&user_namespace(user_id)?, key, value)
    }

    pub fn remove(&self, user_id: &str, key: &str) -> Result<()> {
        self.remove_in(&user_namespace(user_id)?, key)
    }

    /// Read a value that is not tied to a user (e.g. the session record).
    pub fn read_global<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.read_in(GLOBAL_NAMESPACE, key)
    }

    pub fn write_global<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.write_in(GLOBAL_NAMESPACE, key, value)
    }

    pub fn remove_global(&self, key: &str) -> Result<()> {
        self.remove_in(GLOBAL_NAMESPACE, key)
    }

    fn read_in<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let raw = match self.read_raw(namespace, key) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!("Local read of '{}' failed: {}", key, error);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("Ignoring unparseable local value for '{}': {}", key, error);
                None
            }
        }
    }

    fn read_raw(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_in<T: Serialize + ?Sized>(&self, namespace: &str, key: &str, value: &T) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::InvalidInput("storage key cannot be empty".to_string()));
        }
        let serialized = serde_json::to_string(value)?;
        let updated_at = chrono::Utc::now().timestamp_millis();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![namespace, key, serialized, updated_at],
        )?;
        tracing::debug!("Wrote local value {}_{}", namespace, key);
        Ok(())
    }

    fn remove_in(&self, namespace: &str, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM kv WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|error| Error::LocalStore(error.to_string()))
    }
}
