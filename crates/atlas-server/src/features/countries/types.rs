//! Response and row types for the countries read API

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Currency item in a country response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrencyDto {
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
}

/// Language item in a country response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguageDto {
    pub code: String,
    pub name: String,
}

/// A country as served by the read API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryResponse {
    pub id: i64,
    pub name: String,
    pub official_name: String,
    pub capital: Option<String>,
    pub region: String,
    pub subregion: Option<String>,
    pub population: i64,
    pub area: Option<f64>,
    pub population_density: Option<f64>,
    pub currencies: Vec<CurrencyDto>,
    pub languages: Vec<LanguageDto>,
}

/// Parent row as selected from `countries`
#[derive(Debug, FromRow)]
pub struct CountryRow {
    pub id: i64,
    pub name: String,
    pub official_name: String,
    pub capital: Option<String>,
    pub region: String,
    pub subregion: Option<String>,
    pub population: i64,
    pub area: Option<f64>,
    pub population_density: Option<f64>,
}

/// Child row as selected from `country_currencies`
#[derive(Debug, FromRow)]
pub struct CurrencyRow {
    pub country_id: i64,
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
}

/// Child row as selected from `country_languages`
#[derive(Debug, FromRow)]
pub struct LanguageRow {
    pub country_id: i64,
    pub code: String,
    pub name: String,
}

impl CountryRow {
    /// Combine the parent row with its child lists into a response
    pub fn into_response(
        self,
        currencies: Vec<CurrencyDto>,
        languages: Vec<LanguageDto>,
    ) -> CountryResponse {
        CountryResponse {
            id: self.id,
            name: self.name,
            official_name: self.official_name,
            capital: self.capital,
            region: self.region,
            subregion: self.subregion,
            population: self.population,
            area: self.area,
            population_density: self.population_density,
            currencies,
            languages,
        }
    }
}

impl From<CurrencyRow> for CurrencyDto {
    fn from(row: CurrencyRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            symbol: row.symbol,
        }
    }
}

impl From<LanguageRow> for LanguageDto {
    fn from(row: LanguageRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
        }
    }
}
