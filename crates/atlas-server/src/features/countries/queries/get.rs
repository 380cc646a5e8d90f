//! Get country by id query

use sqlx::PgPool;

use super::load_children;
use crate::features::countries::types::{CountryResponse, CountryRow};

/// Query for a single country by surrogate key
#[derive(Debug, Clone, Copy)]
pub struct GetCountryQuery {
    pub id: i64,
}

/// Errors that can occur when fetching a country
#[derive(Debug, thiserror::Error)]
pub enum GetCountryError {
    #[error("Country with id {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handle the get country query
#[tracing::instrument(skip(pool), fields(id = query.id))]
pub async fn handle(
    pool: &PgPool,
    query: GetCountryQuery,
) -> Result<CountryResponse, GetCountryError> {
    let row: Option<CountryRow> = sqlx::query_as(
        "SELECT id, name, official_name, capital, region, subregion, \
                population, area, population_density \
         FROM countries WHERE id = $1",
    )
    .bind(query.id)
    .fetch_optional(pool)
    .await?;

    let row = row.ok_or(GetCountryError::NotFound(query.id))?;

    let (mut currencies, mut languages) = load_children(pool, &[row.id]).await?;
    let row_currencies = currencies.remove(&row.id).unwrap_or_default();
    let row_languages = languages.remove(&row.id).unwrap_or_default();

    Ok(row.into_response(row_currencies, row_languages))
}
