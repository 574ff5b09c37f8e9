//! `SQLite` connection pool for the truth ledger.
//!
//! The ledger lives in a single `SQLite` file. The pool runs in WAL journal
//! mode so an audit can stream the table while the injector keeps appending.
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time checked)
//! to avoid requiring a database at build time. All queries are
//! parameterized.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::DbError;

/// Default maximum number of connections in the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Default time to wait for a connection or a database lock, in seconds.
const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

/// Configuration for the truth ledger database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Path of the `SQLite` database file.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait on a locked database before failing.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

impl LedgerConfig {
    /// Create a new configuration for the database at `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
        }
    }

    /// The busy timeout as a [`Duration`].
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(&default_ledger_path())
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("truth.db")
}

const fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

const fn default_busy_timeout_secs() -> u64 {
    DEFAULT_BUSY_TIMEOUT_SECS
}

/// Connection pool handle to the ledger database.
#[derive(Debug, Clone)]
pub struct SqliteLedgerPool {
    pool: SqlitePool,
}

impl SqliteLedgerPool {
    /// Open (creating if missing) the ledger database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the configuration is unusable and
    /// [`DbError::Sqlite`] if the database cannot be opened.
    pub async fn connect(config: &LedgerConfig) -> Result<Self, DbError> {
        if config.max_connections == 0 {
            return Err(DbError::Config(
                "max_connections must be at least 1".to_owned(),
            ));
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout());

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.busy_timeout())
            .connect_with(connect_options)
            .await?;

        tracing::info!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            "Opened truth ledger database"
        );

        Ok(Self { pool })
    }

    /// Return a reference to the underlying [`SqlitePool`].
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
