//! Durable key-value stores and the persistence gateway.
//!
//! The gateway writes the whole session as one [`PersistedSnapshot`] under a
//! single key, overwriting the previous one (last writer wins, no diffs), and
//! reads it back once at startup. Two stores implement the key-value
//! contract:
//!
//! - [`SqliteStore`] — a per-world SQLite database:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS kv_store (
//!     key        TEXT PRIMARY KEY,
//!     value      TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//!   with optional WAL mode and a CRC-32 of each value to flag corruption.
//! - [`MemoryStore`] — an in-process map, for tests and throwaway sessions.
//!
//! A snapshot that is present but undecodable is reported as absent with a
//! warning; startup never fails on bad save data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::{GridError, Result};
use crate::oracle::SpawnRule;
use crate::snapshot::PersistedSnapshot;
use crate::state::WorldState;

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 (ISO 3309) of `data` as a lowercase hex string.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

/// Bitwise CRC-32 with the reflected ISO polynomial.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

// ---------------------------------------------------------------------------
// DurableStore
// ---------------------------------------------------------------------------

/// The durable key-value contract the gateway writes through.
pub trait DurableStore {
    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backing storage rejects the write.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// The value stored under `key`, if any.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Remove every stored value.
    ///
    /// # Errors
    /// Returns an error if the backing storage rejects the delete.
    fn clear(&mut self) -> Result<()>;
}

/// In-process store; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl DurableStore for MemoryStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn clear(&mut self) -> Result<()> {
        self.items.clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// Handle to an open SQLite key-value database.
pub struct SqliteStore {
    conn: Connection,
    checksum_enabled: bool,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("checksum_enabled", &self.checksum_enabled)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`.
    ///
    /// The schema is created if missing; WAL mode is enabled when
    /// `config.wal_mode` is `true`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            // journal_mode returns the resulting mode as a row.
            let _mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Cache-grid store opened"
        );

        Ok(Self {
            conn,
            checksum_enabled: config.checksum_enabled,
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn,
            checksum_enabled: config.checksum_enabled,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Database`] on SQLite failures.
    pub fn key_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Run SQLite's integrity check; `Ok(false)` means corruption.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

impl DurableStore for SqliteStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let checksum = self
            .checksum_enabled
            .then(|| crc32_hex(value.as_bytes()));
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![key, value, now, checksum],
        )?;
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value, checksum FROM kv_store WHERE key = ?1")?;

        let result: Option<(String, Option<String>)> = stmt
            .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((value, stored_checksum)) = result else {
            return Ok(None);
        };

        if self.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(value.as_bytes());
                if expected != actual {
                    warn!(
                        key,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch — possible save corruption"
                    );
                }
            }
        }

        Ok(Some(value))
    }

    fn clear(&mut self) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM kv_store", [])?;
        debug!(deleted, "Cleared store");
        Ok(())
    }
}

/// Extension trait that adds an `.optional()` combinator to `rusqlite::Result`.
///
/// Converts `Err(QueryReturnedNoRows)` into `Ok(None)`.
trait OptionalExt<T> {
    /// Convert `QueryReturnedNoRows` into `Ok(None)`.
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// How [`Backend::open_or_recover`] obtained its store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRecovery {
    /// The configured store opened normally.
    Clean,
    /// The database file was unusable. It was moved to this path and a
    /// fresh database created in its place.
    Quarantined(PathBuf),
    /// No database could be created; the session runs in memory only.
    InMemory,
}

/// The store selected by `persistence.backend`.
#[derive(Debug)]
pub enum Backend {
    /// SQLite file at `persistence.db_path`.
    Sqlite(SqliteStore),
    /// Process-local map.
    Memory(MemoryStore),
}

impl Backend {
    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Config`] for an unknown backend name, or
    /// [`GridError::Database`] if the SQLite file cannot be opened.
    pub fn open(config: &PersistenceConfig) -> Result<Self> {
        match config.backend.as_str() {
            "sqlite" => Ok(Self::Sqlite(SqliteStore::open(&config.db_path, config)?)),
            "memory" => Ok(Self::Memory(MemoryStore::new())),
            other => Err(GridError::Config(format!(
                "unknown persistence backend {other:?}"
            ))),
        }
    }

    /// Open the configured backend, recovering from an unusable database.
    ///
    /// A foreign or corrupt SQLite file is moved aside (together with its
    /// `-wal`/`-shm` siblings) and a fresh database is created. If that
    /// also fails the session falls back to a [`MemoryStore`]. Either way
    /// the session starts clean instead of aborting.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Config`] for an unknown backend name; storage
    /// failures are never returned.
    pub fn open_or_recover(config: &PersistenceConfig) -> Result<(Self, StoreRecovery)> {
        let error = match Self::open(config) {
            Ok(backend) => return Ok((backend, StoreRecovery::Clean)),
            Err(e @ GridError::Config(_)) => return Err(e),
            Err(e) => e,
        };
        warn!(path = %config.db_path, error = %error, "Durable store unusable, recovering");

        let db_path = PathBuf::from(&config.db_path);
        let aside = PathBuf::from(format!(
            "{}.corrupt-{}",
            config.db_path,
            Utc::now().format("%Y%m%dT%H%M%S%.3f")
        ));
        match quarantine(&db_path, &aside) {
            Ok(()) => match SqliteStore::open(&db_path, config) {
                Ok(store) => {
                    warn!(
                        quarantined = %aside.display(),
                        "Unusable database moved aside, starting with a fresh one"
                    );
                    return Ok((Self::Sqlite(store), StoreRecovery::Quarantined(aside)));
                }
                Err(e) => warn!(error = %e, "Fresh database could not be created"),
            },
            Err(e) => warn!(error = %e, "Unusable database could not be moved aside"),
        }

        warn!("Falling back to an in-memory store; nothing will survive the process");
        Ok((Self::Memory(MemoryStore::new()), StoreRecovery::InMemory))
    }
}

/// Rename `db_path` and any journal siblings to `aside`.
fn quarantine(db_path: &Path, aside: &Path) -> std::io::Result<()> {
    std::fs::rename(db_path, aside)?;
    for suffix in ["-wal", "-shm"] {
        let mut sibling = db_path.as_os_str().to_owned();
        sibling.push(suffix);
        let sibling = PathBuf::from(sibling);
        if sibling.exists() {
            let mut target = aside.as_os_str().to_owned();
            target.push(suffix);
            std::fs::rename(&sibling, PathBuf::from(target))?;
        }
    }
    Ok(())
}

impl DurableStore for Backend {
    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.set_item(key, value),
            Self::Memory(store) => store.set_item(key, value),
        }
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Sqlite(store) => store.get_item(key),
            Self::Memory(store) => store.get_item(key),
        }
    }

    fn clear(&mut self) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.clear(),
            Self::Memory(store) => store.clear(),
        }
    }
}

// ---------------------------------------------------------------------------
// PersistenceGateway
// ---------------------------------------------------------------------------

/// Saves, loads and resets the whole-session snapshot.
///
/// # Usage
///
/// ```
/// # use cachegrid_core::config::GridConfig;
/// # use cachegrid_core::persistence::{MemoryStore, PersistenceGateway};
/// # use cachegrid_core::state::WorldState;
/// let config = GridConfig::default();
/// let mut gateway = PersistenceGateway::new(MemoryStore::new(), "cachegrid.snapshot");
/// let state = WorldState::from_config(&config);
/// gateway.save(&state)?;
/// let loaded = gateway.load(config.world.spawn_rule())?;
/// assert_eq!(loaded, Some(state));
/// # Ok::<(), cachegrid_core::error::GridError>(())
/// ```
#[derive(Debug)]
pub struct PersistenceGateway<S> {
    store: S,
    key: String,
}

impl<S: DurableStore> PersistenceGateway<S> {
    /// A gateway writing the snapshot under `key` in `store`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The snapshot key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialize `state` and overwrite the stored snapshot. Returns the
    /// encoded size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Serialization`] or a store error.
    pub fn save(&mut self, state: &WorldState) -> Result<usize> {
        let start = Instant::now();
        let json = PersistedSnapshot::capture(state).to_json()?;
        self.store.set_item(&self.key, &json)?;

        debug!(
            caches = state.world.len(),
            inventory = state.player.inventory.len(),
            trail = state.player.trail.len(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved snapshot"
        );
        Ok(json.len())
    }

    /// Read the stored snapshot, surfacing decode failures.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MalformedSnapshot`] for undecodable data, or a
    /// store error.
    pub fn try_load(&self, rule: SpawnRule) -> Result<Option<WorldState>> {
        let start = Instant::now();
        let Some(json) = self.store.get_item(&self.key)? else {
            debug!(key = %self.key, "No snapshot stored");
            return Ok(None);
        };

        let state = PersistedSnapshot::from_json(&json)?.into_state(rule)?;
        debug!(
            caches = state.world.len(),
            inventory = state.player.inventory.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded snapshot"
        );
        Ok(Some(state))
    }

    /// Read the stored snapshot; malformed data counts as absent.
    ///
    /// # Errors
    ///
    /// Returns a store error if the backing storage cannot be read.
    pub fn load(&self, rule: SpawnRule) -> Result<Option<WorldState>> {
        match self.try_load(rule) {
            Err(GridError::MalformedSnapshot(reason)) => {
                warn!(key = %self.key, reason = %reason, "Ignoring malformed snapshot");
                Ok(None)
            }
            other => other,
        }
    }

    /// Destroy the durable snapshot.
    ///
    /// # Errors
    ///
    /// Returns a store error if the delete fails.
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear()?;
        info!(key = %self.key, "Durable snapshot cleared");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
