//! Read queries for the countries feature

pub mod get;
pub mod list;

pub use get::{GetCountryError, GetCountryQuery};
pub use list::{ListCountriesError, ListCountriesQuery, ListCountriesResponse};

use sqlx::PgPool;
use std::collections::HashMap;

use super::types::{CurrencyDto, CurrencyRow, LanguageDto, LanguageRow};

/// Fetch the currency and language lists for a set of countries
///
/// Returns maps keyed by country id; countries with no child rows are
/// simply absent.
pub(crate) async fn load_children(
    pool: &PgPool,
    country_ids: &[i64],
) -> Result<
    (
        HashMap<i64, Vec<CurrencyDto>>,
        HashMap<i64, Vec<LanguageDto>>,
    ),
    sqlx::Error,
> {
    let currency_rows: Vec<CurrencyRow> = sqlx::query_as(
        "SELECT country_id, code, name, symbol FROM country_currencies \
         WHERE country_id = ANY($1) ORDER BY id",
    )
    .bind(country_ids)
    .fetch_all(pool)
    .await?;

    let language_rows: Vec<LanguageRow> = sqlx::query_as(
        "SELECT country_id, code, name FROM country_languages \
         WHERE country_id = ANY($1) ORDER BY id",
    )
    .bind(country_ids)
    .fetch_all(pool)
    .await?;

    let mut currencies: HashMap<i64, Vec<CurrencyDto>> = HashMap::new();
    for row in currency_rows {
        currencies
            .entry(row.country_id)
            .or_default()
            .push(row.into());
    }

    let mut languages: HashMap<i64, Vec<LanguageDto>> = HashMap::new();
    for row in language_rows {
        languages
            .entry(row.country_id)
            .or_default()
            .push(row.into());
    }

    Ok((currencies, languages))
}
