//! Transactional full-replace loader
//!
//! Replaces the entire persisted countries dataset inside one transaction:
//! truncate the table set, then insert every normalized record with its
//! currency and language child rows. Any unrecovered failure rolls the
//! whole transaction back, so readers either see the previous dataset or
//! the new one, never a partial refresh.
//!
//! Known trade-off: overlapping runs race on the same tables with
//! last-committer-wins semantics. Strict single-flight callers must add an
//! external lock around the pipeline.

use sqlx::{Connection, PgConnection, PgPool, Postgres, Transaction};
use std::time::Duration;
use tracing::{info, warn};

use futures::FutureExt;

use super::model::{CountryRecord, Currency, Language};
use super::policy::{RetryPolicy, TimeoutPolicy};
use super::LoadError;

/// Session-level statement timeout applied for the duration of a load
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-operation timeout for the truncate
const TRUNCATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-operation timeout for each parent-row insert
const INSERT_TIMEOUT: Duration = Duration::from_secs(15);

/// Retry budget for the truncate
const TRUNCATE_MAX_RETRIES: u32 = 3;

/// Retry budget for each parent-row insert
const INSERT_MAX_RETRIES: u32 = 2;

/// Retry budget for each child-row insert (currencies, languages)
const CHILD_INSERT_MAX_RETRIES: u32 = 3;

/// Loads normalized country records into the relational store
pub struct CountryLoader {
    pool: PgPool,
    statement_timeout: Duration,
    truncate_retry: RetryPolicy,
    truncate_timeout: TimeoutPolicy,
    insert_retry: RetryPolicy,
    insert_timeout: TimeoutPolicy,
    child_retry: RetryPolicy,
}

impl CountryLoader {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
            truncate_retry: RetryPolicy::new(TRUNCATE_MAX_RETRIES),
            truncate_timeout: TimeoutPolicy::new(TRUNCATE_TIMEOUT),
            insert_retry: RetryPolicy::new(INSERT_MAX_RETRIES),
            insert_timeout: TimeoutPolicy::new(INSERT_TIMEOUT),
            child_retry: RetryPolicy::new(CHILD_INSERT_MAX_RETRIES),
        }
    }

    /// Replace the persisted dataset with `records` in one transaction
    ///
    /// Holds a single pooled connection for the whole call. On success the
    /// transaction is committed; on any unrecovered failure it is rolled
    /// back and the error re-raised. The connection always returns to the
    /// pool on the exit path.
    #[tracing::instrument(skip(self, records), fields(count = records.len()))]
    pub async fn load(&self, records: &[CountryRecord]) -> Result<(), LoadError> {
        info!(count = records.len(), "Loading countries into database");

        let mut conn = self.pool.acquire().await?;

        // Statement timeout covers every statement this session runs,
        // including child inserts that carry no per-operation override.
        sqlx::query(&format!(
            "SET statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *conn)
        .await?;

        // Every failure from here on, including begin and commit, must fall
        // through to the timeout reset below before the connection returns
        // to the pool.
        let outcome = self.run_transaction(&mut conn, records).await;

        // The pool reuses this session; restore the ambient timeout.
        if let Err(reset_err) = sqlx::query("SET statement_timeout TO DEFAULT")
            .execute(&mut *conn)
            .await
        {
            warn!(error = %reset_err, "Failed to reset statement timeout");
        }

        outcome
    }

    /// Open a transaction, replace the dataset, commit or roll back
    async fn run_transaction(
        &self,
        conn: &mut PgConnection,
        records: &[CountryRecord],
    ) -> Result<(), LoadError> {
        let mut tx = conn.begin().await?;

        match self.replace_dataset(&mut tx, records).await {
            Ok(()) => {
                tx.commit().await?;
                info!(count = records.len(), "Countries loaded successfully");
                Ok(())
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after load error");
                }
                Err(err)
            },
        }
    }

    /// Truncate and repopulate the table set within the open transaction
    async fn replace_dataset(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        records: &[CountryRecord],
    ) -> Result<(), LoadError> {
        self.truncate_retry
            .run("truncate countries", &mut **tx, |conn| {
                let timeout = self.truncate_timeout.clone();
                async move {
                    timeout
                        .run("truncate countries", async {
                            sqlx::query(
                                "TRUNCATE countries, country_currencies, country_languages \
                                 RESTART IDENTITY CASCADE",
                            )
                            .execute(&mut *conn)
                            .await
                            .map(|_| ())
                            .map_err(LoadError::from)
                        })
                        .await
                }
                .boxed()
            })
            .await?;

        // Sequential on purpose: preserves insertion order and keeps the
        // retry/timeout accounting per statement.
        for record in records {
            let country_id = self
                .insert_retry
                .run("insert country", &mut **tx, |conn| {
                    let timeout = self.insert_timeout.clone();
                    let record = record.clone();
                    async move {
                        timeout
                            .run("insert country", insert_country(conn, &record))
                            .await
                    }
                    .boxed()
                })
                .await?;

            for currency in &record.currencies {
                self.child_retry
                    .run("insert currency", &mut **tx, |conn| {
                        let currency = currency.clone();
                        async move { insert_currency(conn, country_id, &currency).await }.boxed()
                    })
                    .await?;
            }

            for language in &record.languages {
                self.child_retry
                    .run("insert language", &mut **tx, |conn| {
                        let language = language.clone();
                        async move { insert_language(conn, country_id, &language).await }.boxed()
                    })
                    .await?;
            }
        }

        Ok(())
    }
}

async fn insert_country(
    conn: &mut PgConnection,
    record: &CountryRecord,
) -> Result<i64, LoadError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO countries
            (name, official_name, capital, region, subregion,
             population, area, population_density, raw_data)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(&record.name)
    .bind(&record.official_name)
    .bind(&record.capital)
    .bind(&record.region)
    .bind(&record.subregion)
    .bind(record.population)
    .bind(record.area)
    .bind(record.population_density)
    .bind(&record.raw_payload)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

async fn insert_currency(
    conn: &mut PgConnection,
    country_id: i64,
    currency: &Currency,
) -> Result<(), LoadError> {
    sqlx::query(
        "INSERT INTO country_currencies (country_id, code, name, symbol) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(country_id)
    .bind(&currency.code)
    .bind(&currency.name)
    .bind(&currency.symbol)
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_language(
    conn: &mut PgConnection,
    country_id: i64,
    language: &Language,
) -> Result<(), LoadError> {
    sqlx::query(
        "INSERT INTO country_languages (country_id, code, name) VALUES ($1, $2, $3)",
    )
    .bind(country_id)
    .bind(&language.code)
    .bind(&language.name)
    .execute(conn)
    .await?;

    Ok(())
}
