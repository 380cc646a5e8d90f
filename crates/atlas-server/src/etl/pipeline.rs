//! ETL pipeline orchestration
//!
//! Composes extractor, transformer and loader into one refresh run. Each
//! run is independent and stateless: any stage failure aborts the run
//! before the next stage starts and propagates to the trigger origin.

use sqlx::PgPool;
use tracing::info;

use super::extractor::{CountryExtractor, ExtractionError};
use super::loader::CountryLoader;
use super::transformer::CountryTransformer;
use super::EtlError;
use crate::config::EtlConfig;

/// Row counts produced by one successful refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshStats {
    pub countries: usize,
    pub currencies: usize,
    pub languages: usize,
}

/// The countries ETL pipeline
pub struct EtlPipeline {
    extractor: CountryExtractor,
    transformer: CountryTransformer,
    loader: CountryLoader,
}

impl EtlPipeline {
    /// Build a pipeline from the ETL configuration and a shared pool
    pub fn new(config: &EtlConfig, pool: PgPool) -> Result<Self, ExtractionError> {
        Ok(Self {
            extractor: CountryExtractor::new(config)?,
            transformer: CountryTransformer::new(),
            loader: CountryLoader::new(pool),
        })
    }

    /// Run one full refresh: extract, transform, load
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<RefreshStats, EtlError> {
        info!("Starting ETL refresh");

        let raw = self.extractor.extract().await?;
        let records = self.transformer.transform(raw)?;

        let stats = RefreshStats {
            countries: records.len(),
            currencies: records.iter().map(|r| r.currencies.len()).sum(),
            languages: records.iter().map(|r| r.languages.len()).sum(),
        };

        self.loader.load(&records).await?;

        info!(
            countries = stats.countries,
            currencies = stats.currencies,
            languages = stats.languages,
            "ETL refresh completed"
        );

        Ok(stats)
    }
}
