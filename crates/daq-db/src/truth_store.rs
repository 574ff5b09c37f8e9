//! Append-only persistence for ground-truth records.
//!
//! The `truth` table keeps its historical column layout (`tstamp`,
//! `original`, `filename`, `is_signal`) so existing audit notebooks keep
//! working. `SQLite`'s implicit `rowid` provides insertion
//! order; no primary key is enforced.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use daq_types::{Category, TruthRecord};
use futures::{StreamExt as _, TryStreamExt as _};
use futures::stream::{self, BoxStream};
use sqlx::SqlitePool;

use crate::error::DbError;
use crate::sqlite::{LedgerConfig, SqliteLedgerPool};

const CREATE_TABLE: &str = r"CREATE TABLE IF NOT EXISTS truth (
    tstamp TEXT NOT NULL,
    original TEXT NOT NULL,
    filename TEXT NOT NULL,
    is_signal INTEGER NOT NULL
)";

const INSERT_ROW: &str =
    r"INSERT INTO truth (tstamp, original, filename, is_signal) VALUES ($1, $2, $3, $4)";

const SELECT_ALL: &str = r"SELECT tstamp, original, filename, is_signal
    FROM truth
    ORDER BY rowid";

const TABLE_EXISTS: &str =
    r"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'truth'";

/// Operations on the `truth` table.
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct TruthLedger {
    pool: SqlitePool,
}

impl TruthLedger {
    /// Create a ledger bound to an existing connection pool.
    pub fn new(pool: &SqliteLedgerPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    /// Open the ledger database described by `config`.
    ///
    /// The `truth` table is not created here; it appears with the first
    /// [`record`](Self::record).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened.
    pub async fn open(config: &LedgerConfig) -> Result<Self, DbError> {
        let pool = SqliteLedgerPool::connect(config).await?;
        Ok(Self::new(&pool))
    }

    /// Append one truth record.
    ///
    /// The table is created if missing, and both statements run inside a
    /// single transaction: on success exactly one row has been added.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the transaction fails; nothing is
    /// written in that case.
    pub async fn record(&self, record: &TruthRecord) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;

        sqlx::query(INSERT_ROW)
            .bind(record.timestamp)
            .bind(record.source_path.to_string_lossy().into_owned())
            .bind(&record.object_name)
            .bind(record.is_signal)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            object_name = record.object_name,
            is_signal = record.is_signal,
            "Recorded truth row"
        );
        Ok(())
    }

    /// Stream every record in insertion order.
    ///
    /// Rows are fetched lazily as the stream is polled. A ledger that has
    /// never been written to yields an empty stream.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the table lookup fails; errors while
    /// streaming are yielded as items.
    pub async fn all(&self) -> Result<BoxStream<'_, Result<TruthRecord, DbError>>, DbError> {
        if !self.table_exists().await? {
            return Ok(stream::empty().boxed());
        }

        let rows = sqlx::query_as::<_, TruthRow>(SELECT_ALL)
            .fetch(&self.pool)
            .map(|row| row.map(TruthRecord::from).map_err(DbError::from));

        Ok(rows.boxed())
    }

    /// Count the recorded events per category.
    ///
    /// A ledger that has never been written to has zero of each.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the table cannot be read.
    pub async fn category_totals(&self) -> Result<CategoryTotals, DbError> {
        self.all()
            .await?
            .try_fold(CategoryTotals::default(), |mut totals, record| async move {
                totals.add(record.category());
                Ok(totals)
            })
            .await
    }

    /// Close every pooled connection, checkpointing the WAL.
    ///
    /// Clones of this ledger share the pool and are closed too.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Truth ledger closed");
    }

    /// Whether the `truth` table has been created yet.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the catalog query fails.
    pub async fn table_exists(&self) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar(TABLE_EXISTS)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

/// A row from the `truth` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TruthRow {
    /// Emission timestamp.
    pub tstamp: DateTime<Utc>,
    /// Source image path.
    pub original: String,
    /// Object name in the destination bucket.
    pub filename: String,
    /// Whether the event was a signal event.
    pub is_signal: bool,
}

impl From<TruthRow> for TruthRecord {
    fn from(row: TruthRow) -> Self {
        Self {
            timestamp: row.tstamp,
            source_path: PathBuf::from(row.original),
            object_name: row.filename,
            is_signal: row.is_signal,
        }
    }
}

/// Per-category event counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTotals {
    /// Signal events.
    pub signal: u64,
    /// Background events.
    pub background: u64,
}

impl CategoryTotals {
    /// Count one event of `category`.
    pub const fn add(&mut self, category: Category) {
        match category {
            Category::Signal => self.signal = self.signal.saturating_add(1),
            Category::Background => self.background = self.background.saturating_add(1),
        }
    }

    /// Events of either category.
    pub const fn total(&self) -> u64 {
        self.signal.saturating_add(self.background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_count_each_category() {
        let mut totals = CategoryTotals::default();
        assert_eq!(totals.total(), 0);

        totals.add(Category::Signal);
        totals.add(Category::Background);
        totals.add(Category::Background);
        assert_eq!(totals.signal, 1);
        assert_eq!(totals.background, 2);
        assert_eq!(totals.total(), 3);
    }
}
