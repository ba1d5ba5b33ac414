//! SQLite-backed country cache.

mod countries;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::StoreError;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_max_connections(database_url, DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn with_max_connections(database_url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            // WAL keeps readers unblocked while a refresh transaction is open
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // An in-memory database lives only as long as its connection
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to open database")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS countries (
                name_key TEXT PRIMARY KEY CHECK (length(name_key) > 0),
                name TEXT NOT NULL,
                capital TEXT,
                region TEXT,
                population INTEGER NOT NULL DEFAULT 0 CHECK (population >= 0),
                currency_code TEXT,
                exchange_rate REAL CHECK (exchange_rate IS NULL OR exchange_rate > 0),
                estimated_gdp REAL,
                flag_url TEXT,
                last_refreshed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_countries_region ON countries(region COLLATE NOCASE)")
            .execute(&pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_countries_currency
             ON countries(currency_code COLLATE NOCASE)",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Close all connections. Called once on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Fixed-width UTC timestamps so that SQL string comparison matches time order.
pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_encoding_sorts_chronologically() {
        let earlier = DateTime::parse_from_rfc3339("2025-01-01T09:59:59.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2025-01-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let (a, b) = (encode_timestamp(earlier), encode_timestamp(later));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(decode_timestamp(&a).unwrap(), earlier);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_timestamp("yesterday"),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_schema_is_created() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'countries'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, 1);
    }
}
