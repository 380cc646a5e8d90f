//! Raw and normalized country records
//!
//! `RawCountryRecord` mirrors the external provider's JSON shape with
//! explicit optional fields; fields the schema does not model are kept in
//! the flattened `extra` map so the audit payload round-trips intact.
//! `CountryRecord` is the flattened relational shape consumed by the loader.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Nested name object as received from the source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawCountryName {
    pub common: String,
    pub official: String,
}

/// Currency details as received from the source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawCurrency {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// One country record as received from the external source
///
/// `name`, `region` and `population` are required by policy but optional in
/// the serde shape; presence is enforced by the transformer, which fails the
/// run with a `MalformedRecordError` instead of emitting partial data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawCountryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<RawCountryName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subregion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currencies: Option<BTreeMap<String, RawCurrency>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<BTreeMap<String, String>>,
    /// Source fields not modeled above, preserved for the audit payload
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Normalized currency list item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
}

/// Normalized language list item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Language {
    pub code: String,
    pub name: String,
}

/// The normalized, relationally-shaped country record
///
/// Produced by the transformer and consumed immediately by the loader;
/// never persisted in this form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryRecord {
    pub name: String,
    pub official_name: String,
    pub capital: Option<String>,
    pub region: String,
    pub subregion: Option<String>,
    pub population: i64,
    pub area: Option<f64>,
    /// `round(population / area, 2)` when area is present and nonzero
    pub population_density: Option<f64>,
    pub currencies: Vec<Currency>,
    pub languages: Vec<Language>,
    /// Canonical serialization of the original raw record, retained for audit
    pub raw_payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_round_trips_unknown_fields() {
        let json = serde_json::json!({
            "name": {"common": "Germany", "official": "Federal Republic of Germany"},
            "region": "Europe",
            "population": 83240525u64,
            "cca2": "DE",
            "flags": {"png": "https://example.org/de.png"}
        });

        let record: RawCountryRecord = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(record.extra.get("cca2").unwrap(), "DE");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn test_raw_record_optional_fields_absent() {
        let record: RawCountryRecord = serde_json::from_value(serde_json::json!({
            "name": {"common": "X", "official": "X"},
            "region": "Nowhere",
            "population": 0u64
        }))
        .unwrap();

        assert!(record.capital.is_none());
        assert!(record.subregion.is_none());
        assert!(record.area.is_none());
        assert!(record.currencies.is_none());
        assert!(record.languages.is_none());
    }
}
