//! Country CRUD operations
//!
//! Implementation of the `CountryRepository` port on top of SQLite. Rows are
//! keyed by the canonical (lowercased) name; the display name of the latest
//! write is stored alongside it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use super::{decode_timestamp, encode_timestamp, Database};
use crate::domain::models::{
    canonical_key, CountryFilter, CountryRecord, CountrySort, DeleteOutcome, RecordOutcome,
    SortDirection, SortField,
};
use crate::errors::StoreError;
use crate::ports::CountryRepository;

const SELECT_COLUMNS: &str = "SELECT name, capital, region, population, currency_code,
        exchange_rate, estimated_gdp, flag_url, last_refreshed_at
     FROM countries";

async fn execute_upsert<'e, E>(executor: E, record: &CountryRecord) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    let population = i64::try_from(record.population).map_err(|_| {
        StoreError::Constraint(format!(
            "population {} exceeds storable range",
            record.population
        ))
    })?;

    sqlx::query(
        "INSERT INTO countries (
            name_key, name, capital, region, population, currency_code,
            exchange_rate, estimated_gdp, flag_url, last_refreshed_at
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(name_key) DO UPDATE SET
            name = excluded.name,
            capital = excluded.capital,
            region = excluded.region,
            population = excluded.population,
            currency_code = excluded.currency_code,
            exchange_rate = excluded.exchange_rate,
            estimated_gdp = excluded.estimated_gdp,
            flag_url = excluded.flag_url,
            last_refreshed_at = MAX(countries.last_refreshed_at, excluded.last_refreshed_at)",
    )
    .bind(record.key())
    .bind(record.name.trim())
    .bind(&record.capital)
    .bind(&record.region)
    .bind(population)
    .bind(&record.currency_code)
    .bind(record.exchange_rate)
    .bind(record.estimated_gdp)
    .bind(&record.flag_url)
    .bind(encode_timestamp(record.last_refreshed_at))
    .execute(executor)
    .await?;

    Ok(())
}

fn row_to_record(row: &SqliteRow) -> Result<CountryRecord, StoreError> {
    let population: i64 = row.try_get("population")?;
    let refreshed_at: String = row.try_get("last_refreshed_at")?;

    Ok(CountryRecord {
        name: row.try_get("name")?,
        capital: row.try_get("capital")?,
        region: row.try_get("region")?,
        population: u64::try_from(population)
            .map_err(|_| StoreError::Corrupt(format!("negative population {}", population)))?,
        currency_code: row.try_get("currency_code")?,
        exchange_rate: row.try_get("exchange_rate")?,
        estimated_gdp: row.try_get("estimated_gdp")?,
        flag_url: row.try_get("flag_url")?,
        last_refreshed_at: decode_timestamp(&refreshed_at)?,
    })
}

fn order_clause(sort: Option<CountrySort>) -> &'static str {
    match sort {
        Some(CountrySort {
            field: SortField::EstimatedGdp,
            direction: SortDirection::Desc,
        }) => " ORDER BY estimated_gdp IS NULL, estimated_gdp DESC, name_key ASC",
        Some(CountrySort {
            field: SortField::EstimatedGdp,
            direction: SortDirection::Asc,
        }) => " ORDER BY estimated_gdp IS NULL, estimated_gdp ASC, name_key ASC",
        Some(CountrySort {
            field: SortField::Population,
            direction: SortDirection::Desc,
        }) => " ORDER BY population DESC, name_key ASC",
        Some(CountrySort {
            field: SortField::Population,
            direction: SortDirection::Asc,
        }) => " ORDER BY population ASC, name_key ASC",
        None => " ORDER BY name_key ASC",
    }
}

#[async_trait]
impl CountryRepository for Database {
    async fn upsert(&self, record: &CountryRecord) -> Result<(), StoreError> {
        execute_upsert(&self.pool, record).await
    }

    async fn upsert_batch(
        &self,
        records: &[CountryRecord],
    ) -> Result<Vec<RecordOutcome>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(records.len());

        for record in records {
            match execute_upsert(&mut *tx, record).await {
                Ok(()) => outcomes.push(RecordOutcome::Upserted {
                    name: record.name.clone(),
                }),
                Err(e) if e.is_record_level() => {
                    tracing::warn!(
                        country = %record.name,
                        error = %e,
                        "Skipping country that violates a store constraint"
                    );
                    outcomes.push(RecordOutcome::Skipped {
                        name: record.name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    // Dropping the transaction rolls back every write of this batch
                    tracing::error!(
                        country = %record.name,
                        error = %e,
                        "Aborting country batch"
                    );
                    return Err(e);
                }
            }
        }

        tx.commit().await?;
        Ok(outcomes)
    }

    async fn get(&self, name: &str) -> Result<Option<CountryRecord>, StoreError> {
        let row = sqlx::query(&format!("{} WHERE name_key = ?", SELECT_COLUMNS))
            .bind(canonical_key(name))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn delete(&self, name: &str) -> Result<DeleteOutcome, StoreError> {
        let result = sqlx::query("DELETE FROM countries WHERE name_key = ?")
            .bind(canonical_key(name))
            .execute(&self.pool)
            .await?;

        Ok(if result.rows_affected() == 0 {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted
        })
    }

    async fn list(
        &self,
        filter: &CountryFilter,
        sort: Option<CountrySort>,
    ) -> Result<Vec<CountryRecord>, StoreError> {
        let mut sql = format!("{} WHERE 1=1", SELECT_COLUMNS);
        if filter.region.is_some() {
            sql.push_str(" AND region = ? COLLATE NOCASE");
        }
        if filter.currency_code.is_some() {
            sql.push_str(" AND currency_code = ? COLLATE NOCASE");
        }
        sql.push_str(order_clause(sort));

        let mut query = sqlx::query(&sql);
        if let Some(region) = &filter.region {
            query = query.bind(region.trim());
        }
        if let Some(currency_code) = &filter.currency_code {
            query = query.bind(currency_code.trim());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn most_recent_refresh(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let latest: Option<String> =
            sqlx::query_scalar("SELECT MAX(last_refreshed_at) FROM countries")
                .fetch_one(&self.pool)
                .await?;

        latest.as_deref().map(decode_timestamp).transpose()
    }
}
