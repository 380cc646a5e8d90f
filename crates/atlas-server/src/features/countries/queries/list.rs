//! List countries query
//!
//! Paginated, filterable list of countries. The filter is a
//! case-insensitive substring match over name, official name, region and
//! subregion.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::load_children;
use crate::features::countries::types::{CountryResponse, CountryRow};
use crate::features::shared::pagination::{PaginationMeta, PaginationParams};

/// Query parameters for listing countries
///
/// `page` and `limit` are kept inline (not flattened) so the axum `Query`
/// extractor can deserialize them from the query string.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListCountriesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl ListCountriesQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCountriesResponse {
    pub data: Vec<CountryResponse>,
    pub meta: PaginationMeta,
}

/// Errors that can occur when listing countries
#[derive(Debug, thiserror::Error)]
pub enum ListCountriesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handle the list countries query
///
/// Results are ordered by name; child lists are fetched for the page in
/// two batched queries and grouped in memory.
#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: &PgPool,
    query: ListCountriesQuery,
) -> Result<ListCountriesResponse, ListCountriesError> {
    let pagination = query.pagination();
    let page = pagination.page();
    let limit = pagination.limit();
    let offset = pagination.offset();

    let pattern = query
        .filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| format!("%{f}%"));

    let total_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM countries \
         WHERE $1::TEXT IS NULL \
            OR name ILIKE $1 OR official_name ILIKE $1 \
            OR region ILIKE $1 OR subregion ILIKE $1",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let rows: Vec<CountryRow> = sqlx::query_as(
        "SELECT id, name, official_name, capital, region, subregion, \
                population, area, population_density \
         FROM countries \
         WHERE $1::TEXT IS NULL \
            OR name ILIKE $1 OR official_name ILIKE $1 \
            OR region ILIKE $1 OR subregion ILIKE $1 \
         ORDER BY name \
         LIMIT $2 OFFSET $3",
    )
    .bind(&pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let (mut currencies, mut languages) = load_children(pool, &ids).await?;

    let data = rows
        .into_iter()
        .map(|row| {
            let row_currencies = currencies.remove(&row.id).unwrap_or_default();
            let row_languages = languages.remove(&row.id).unwrap_or_default();
            row.into_response(row_currencies, row_languages)
        })
        .collect();

    Ok(ListCountriesResponse {
        data,
        meta: PaginationMeta::new(page, limit, total_count),
    })
}
