//! SQLite implementation of ISyncStateStore
//!
//! Each run writes to its own table, named after the run's dataset and
//! environment. The table is created on open if it does not exist.
//!
//! ## Type Mapping
//!
//! | Domain Type               | SQL Type | Strategy                                   |
//! |---------------------------|----------|--------------------------------------------|
//! | FileId                    | TEXT     | `.as_str()` / `FileId::new()`              |
//! | DateTime<FixedOffset>     | TEXT     | `to_rfc3339()` / `parse_from_rfc3339()`    |
//! | SyncStatus                | TEXT     | `Display` / `FromStr`                      |

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use docsync_core::domain::{FileId, SyncRecord, SyncStatus};
use docsync_core::ports::ISyncStateStore;

use crate::CacheError;

/// Layout of timestamps written without an offset, e.g. `2026-10-14 09:00:00`
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// SQLite-based implementation of the sync state store port
pub struct SqliteSyncStateStore {
    pool: SqlitePool,
    table: String,
    select_sql: String,
    upsert_sql: String,
}

/// Returns true if `name` can be used unquoted as a SQLite identifier
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl SqliteSyncStateStore {
    /// Opens the store over `table`, creating the table if needed
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidTableName` if `table` is not a plain
    /// identifier, or `CacheError::MigrationFailed` if it cannot be created.
    pub async fn open(pool: SqlitePool, table: &str) -> Result<Self, CacheError> {
        if !is_plain_identifier(table) {
            return Err(CacheError::InvalidTableName(table.to_string()));
        }

        let ddl = include_str!("migrations/sync_records.sql").replace("{table}", table);
        sqlx::raw_sql(&ddl).execute(&pool).await.map_err(|e| {
            CacheError::MigrationFailed(format!("Failed to create table {table}: {e}"))
        })?;

        tracing::debug!(table, "Sync state table ready");

        Ok(Self {
            select_sql: format!(
                "SELECT file_id, file_name, run_timestamp, status FROM \"{table}\" WHERE file_id = ?"
            ),
            upsert_sql: format!(
                "INSERT INTO \"{table}\" (file_id, file_name, run_timestamp, status)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(file_id) DO UPDATE SET
                     file_name = excluded.file_name,
                     run_timestamp = excluded.run_timestamp,
                     status = excluded.status"
            ),
            table: table.to_string(),
            pool,
        })
    }

    /// Name of the table this store writes to
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of records in the table
    pub async fn count(&self) -> Result<i64, CacheError> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", self.table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

/// Zone-less values come back with a zero offset; the run clock reads those
/// as wall-clock time in its own timezone.
fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, CacheError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts);
    }
    NaiveDateTime::parse_from_str(s, NAIVE_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|e| {
            CacheError::SerializationError(format!("Invalid run_timestamp '{}': {}", s, e))
        })
}

fn record_from_row(row: &SqliteRow) -> Result<SyncRecord, CacheError> {
    let file_id: String = row.try_get("file_id")?;
    let file_name: String = row.try_get("file_name")?;
    let run_timestamp: String = row.try_get("run_timestamp")?;
    let status: String = row.try_get("status")?;

    Ok(SyncRecord {
        file_id: FileId::new(file_id).map_err(|e| CacheError::SerializationError(e.to_string()))?,
        file_name,
        run_timestamp: parse_timestamp(&run_timestamp)?,
        status: status
            .parse::<SyncStatus>()
            .map_err(|e| CacheError::SerializationError(e.to_string()))?,
    })
}

#[async_trait::async_trait]
impl ISyncStateStore for SqliteSyncStateStore {
    async fn get_record(&self, file_id: &FileId) -> anyhow::Result<Option<SyncRecord>> {
        let row = sqlx::query(&self.select_sql)
            .bind(file_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(CacheError::from)?;

        match row {
            Some(row) => Ok(Some(record_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn upsert_many(&self, records: &[SyncRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(CacheError::from)?;
        for record in records {
            sqlx::query(&self.upsert_sql)
                .bind(record.file_id.as_str())
                .bind(&record.file_name)
                .bind(record.run_timestamp.to_rfc3339())
                .bind(record.status.to_string())
                .execute(&mut *tx)
                .await
                .map_err(CacheError::from)?;
        }
        tx.commit().await.map_err(CacheError::from)?;

        tracing::debug!(table = %self.table, records = records.len(), "Upserted sync records");
        Ok(())
    }
}
