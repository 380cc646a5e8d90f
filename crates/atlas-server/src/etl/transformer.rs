//! Country record transformer
//!
//! Pure mapping from raw source records to the normalized relational shape.
//! No I/O, no shared state; output order matches input order.

use thiserror::Error;
use tracing::debug;

use super::model::{CountryRecord, Currency, Language, RawCountryRecord};

/// A record is missing or carries an unusable value for a required field
///
/// Raised instead of emitting partial data: a single malformed record is
/// fatal to the whole run.
#[derive(Debug, Error)]
#[error("Malformed country record: missing or invalid required field '{field}' in {record}")]
pub struct MalformedRecordError {
    /// Which required field was absent or invalid
    pub field: &'static str,
    /// Short description of the offending record for diagnostics
    pub record: String,
}

/// Transforms raw country records into normalized records
pub struct CountryTransformer;

impl CountryTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Transform a batch of raw records, preserving order
    ///
    /// Fails fast on the first record that lacks a required field
    /// (name, region, population).
    pub fn transform(
        &self,
        raw: Vec<RawCountryRecord>,
    ) -> Result<Vec<CountryRecord>, MalformedRecordError> {
        debug!(count = raw.len(), "Transforming country records");

        raw.into_iter().map(|r| self.transform_record(r)).collect()
    }

    fn transform_record(
        &self,
        raw: RawCountryRecord,
    ) -> Result<CountryRecord, MalformedRecordError> {
        let raw_payload =
            serde_json::to_value(&raw).unwrap_or(serde_json::Value::Null);

        let name = raw.name.ok_or_else(|| malformed("name", &raw_payload))?;
        let region = raw.region.ok_or_else(|| malformed("region", &raw_payload))?;
        let population = raw
            .population
            .ok_or_else(|| malformed("population", &raw_payload))?;
        // The column is BIGINT; a count past i64::MAX is source garbage.
        let population_i64 =
            i64::try_from(population).map_err(|_| malformed("population", &raw_payload))?;

        let capital = raw.capital.and_then(|c| c.into_iter().next());

        let currencies = raw
            .currencies
            .map(|map| {
                map.into_iter()
                    .map(|(code, details)| Currency {
                        code,
                        name: details.name,
                        symbol: details.symbol,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let languages = raw
            .languages
            .map(|map| {
                map.into_iter()
                    .map(|(code, name)| Language { code, name })
                    .collect()
            })
            .unwrap_or_default();

        Ok(CountryRecord {
            name: name.common,
            official_name: name.official,
            capital,
            region,
            subregion: raw.subregion,
            population: population_i64,
            population_density: population_density(population, raw.area),
            area: raw.area,
            currencies,
            languages,
            raw_payload,
        })
    }
}

impl Default for CountryTransformer {
    fn default() -> Self {
        Self::new()
    }
}

/// Population per square kilometer, rounded to 2 decimal places
///
/// `None` when the area is absent or zero.
fn population_density(population: u64, area: Option<f64>) -> Option<f64> {
    match area {
        Some(area) if area > 0.0 => Some(((population as f64 / area) * 100.0).round() / 100.0),
        _ => None,
    }
}

fn malformed(field: &'static str, payload: &serde_json::Value) -> MalformedRecordError {
    let record = payload
        .get("name")
        .and_then(|n| n.get("common"))
        .and_then(|c| c.as_str())
        .map(|c| format!("record '{c}'"))
        .unwrap_or_else(|| "unnamed record".to_string());

    MalformedRecordError { field, record }
}
