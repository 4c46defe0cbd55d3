//! SQLite-backed attendance store.
//!
//! Each ingestion worker holds its own [`Storage`] (one connection, no
//! sharing); the cleanup pass opens another. The destination table name
//! comes from configuration and is validated as an identifier before it
//! is interpolated into SQL.

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Connection, Row, SqliteConnection};
use tracing::info;

use crate::error::{ImportError, Result};
use crate::models::AttendanceRecord;

/// Timestamps below this value mark records that never parsed to a real
/// calendar instant in the legacy importer; the cleanup pass removes them.
/// Stored timestamps are zero-padded `%Y-%m-%d %H:%M:%S` text, so the
/// lexicographic comparison in SQL agrees with chronological order.
pub const INVALID_SENTINEL: &str = "0001-01-01 00:00:00";

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct Storage {
    conn: SqliteConnection,
    collection: String,
}

impl Storage {
    /// Opens a private connection and makes sure the collection table
    /// exists. Connection failures are fatal to the run.
    pub async fn connect(database_path: &str, collection: &str) -> Result<Self> {
        validate_collection_name(collection)?;

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(ImportError::StoreConnection)?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {collection} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                card_id TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                employee_id TEXT NOT NULL,
                name TEXT NOT NULL,
                message TEXT NOT NULL,
                date_time TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_{collection}_date_time ON {collection}(date_time);
            "#
        ))
        .execute(&mut conn)
        .await?;

        Ok(Storage {
            conn,
            collection: collection.to_string(),
        })
    }

    /// Inserts one attendance record.
    pub async fn insert_record(&mut self, record: &AttendanceRecord) -> Result<()> {
        let query = format!(
            r#"
            INSERT INTO {} (card_id, date, time, employee_id, name, message, date_time)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            self.collection
        );

        sqlx::query(&query)
            .bind(&record.card_id)
            .bind(&record.date)
            .bind(&record.time)
            .bind(&record.employee_id)
            .bind(&record.name)
            .bind(&record.message)
            .bind(record.date_time.format(DATE_TIME_FORMAT).to_string())
            .execute(&mut self.conn)
            .await?;

        Ok(())
    }

    /// Removes every record whose timestamp is below the invalid-timestamp
    /// sentinel. Returns the number of rows deleted; running it again
    /// deletes nothing more.
    pub async fn delete_invalid_records(&mut self) -> Result<u64> {
        let query = format!("DELETE FROM {} WHERE date_time < ?", self.collection);
        let result = sqlx::query(&query)
            .bind(INVALID_SENTINEL)
            .execute(&mut self.conn)
            .await?;

        let deleted = result.rows_affected();
        info!(collection = %self.collection, deleted, "cleanup pass finished");
        Ok(deleted)
    }

    /// Number of records currently in the collection.
    pub async fn count_records(&mut self) -> Result<i64> {
        let query = format!("SELECT COUNT(*) AS n FROM {}", self.collection);
        let row = sqlx::query(&query).fetch_one(&mut self.conn).await?;
        Ok(row.get("n"))
    }
}

/// Collection names are interpolated into SQL, so they must be plain
/// identifiers.
fn validate_collection_name(collection: &str) -> Result<()> {
    let mut chars = collection.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ImportError::Config(format!(
            "collection name '{}' must be a plain identifier",
            collection
        )))
    }
}
