//! ETL integration tests
//!
//! These tests need a running PostgreSQL instance and are ignored by
//! default. Point `DATABASE_URL` at a scratch database and run with
//! `cargo test -- --ignored`. Tests share the countries table set and
//! replace it wholesale, so run them single-threaded.

use atlas_server::config::EtlConfig;
use atlas_server::etl::{
    CountryLoader, CountryRecord, Currency, EtlPipeline, Language,
};
use atlas_server::features::countries::queries::{get, list, GetCountryQuery, ListCountriesQuery};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a scratch PostgreSQL database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to PostgreSQL");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

fn germany() -> CountryRecord {
    CountryRecord {
        name: "Germany".to_string(),
        official_name: "Federal Republic of Germany".to_string(),
        capital: Some("Berlin".to_string()),
        region: "Europe".to_string(),
        subregion: Some("Western Europe".to_string()),
        population: 83_240_525,
        area: Some(357_114.0),
        population_density: Some(233.09),
        currencies: vec![Currency {
            code: "EUR".to_string(),
            name: "Euro".to_string(),
            symbol: Some("€".to_string()),
        }],
        languages: vec![Language {
            code: "deu".to_string(),
            name: "German".to_string(),
        }],
        raw_payload: serde_json::json!({"name": {"common": "Germany"}}),
    }
}

fn france() -> CountryRecord {
    CountryRecord {
        name: "France".to_string(),
        official_name: "French Republic".to_string(),
        capital: Some("Paris".to_string()),
        region: "Europe".to_string(),
        subregion: None,
        population: 67_391_582,
        area: Some(551_695.0),
        population_density: Some(122.15),
        currencies: vec![Currency {
            code: "EUR".to_string(),
            name: "Euro".to_string(),
            symbol: Some("€".to_string()),
        }],
        languages: vec![Language {
            code: "fra".to_string(),
            name: "French".to_string(),
        }],
        raw_payload: serde_json::json!({"name": {"common": "France"}}),
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_load_and_read_back_round_trip() {
    let pool = test_pool().await;
    let loader = CountryLoader::new(pool.clone());

    loader.load(&[germany(), france()]).await.unwrap();

    let response = list::handle(
        &pool,
        ListCountriesQuery {
            filter: None,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.meta.total_count, 2);
    assert_eq!(response.data.len(), 2);

    // Ordered by name
    assert_eq!(response.data[0].name, "France");
    assert_eq!(response.data[1].name, "Germany");

    let germany_row = &response.data[1];
    assert_eq!(germany_row.capital.as_deref(), Some("Berlin"));
    assert_eq!(germany_row.population, 83_240_525);
    assert_eq!(germany_row.population_density, Some(233.09));

    // Currencies and languages compare as sets
    let codes: HashSet<_> = germany_row.currencies.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, HashSet::from(["EUR"]));
    let langs: HashSet<_> = germany_row.languages.iter().map(|l| l.code.as_str()).collect();
    assert_eq!(langs, HashSet::from(["deu"]));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_failed_load_preserves_previous_dataset() {
    let pool = test_pool().await;
    let loader = CountryLoader::new(pool.clone());

    loader.load(&[germany()]).await.unwrap();

    // The second record violates the countries.name length constraint, so
    // the refresh fails after the truncate and must roll back.
    let mut poisoned = france();
    poisoned.name = "x".repeat(300);

    let result = loader.load(&[france(), poisoned]).await;
    assert!(result.is_err());

    let response = list::handle(
        &pool,
        ListCountriesQuery {
            filter: None,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.meta.total_count, 1);
    assert_eq!(response.data[0].name, "Germany");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_statement_timeout_reset_after_failed_load() {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a scratch PostgreSQL database");

    // A single connection guarantees the next acquire reuses the session
    // the failed load ran on.
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("Failed to connect to PostgreSQL");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let loader = CountryLoader::new(pool.clone());

    let mut poisoned = germany();
    poisoned.name = "x".repeat(300);
    assert!(loader.load(&[poisoned]).await.is_err());

    let timeout: String = sqlx::query_scalar("SHOW statement_timeout")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(timeout, "0");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_get_by_id_and_not_found() {
    let pool = test_pool().await;
    let loader = CountryLoader::new(pool.clone());

    loader.load(&[germany()]).await.unwrap();

    let listed = list::handle(
        &pool,
        ListCountriesQuery {
            filter: Some("Germany".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let id = listed.data[0].id;

    let fetched = get::handle(&pool, GetCountryQuery { id }).await.unwrap();
    assert_eq!(fetched.name, "Germany");
    assert_eq!(fetched.currencies.len(), 1);

    let missing = get::handle(&pool, GetCountryQuery { id: id + 10_000 }).await;
    assert!(matches!(
        missing,
        Err(atlas_server::features::countries::queries::GetCountryError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_full_pipeline_end_to_end() {
    let pool = test_pool().await;
    let server = MockServer::start().await;

    let payload = serde_json::json!([
        {
            "name": {"common": "Germany", "official": "Federal Republic of Germany"},
            "capital": ["Berlin"],
            "region": "Europe",
            "subregion": "Western Europe",
            "population": 83240525u64,
            "area": 357114.0,
            "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
            "languages": {"deu": "German"}
        },
        {
            "name": {"common": "France", "official": "French Republic"},
            "capital": ["Paris"],
            "region": "Europe",
            "subregion": "Western Europe",
            "population": 67391582u64,
            "area": 551695.0,
            "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
            "languages": {"fra": "French"}
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload))
        .mount(&server)
        .await;

    let config = EtlConfig {
        source_url: format!("{}/countries", server.uri()),
        source_request_timeout_secs: 5,
        refresh_cron: "0 0 * * *".to_string(),
        schedule_enabled: false,
    };

    let pipeline = EtlPipeline::new(&config, pool.clone()).unwrap();
    let stats = pipeline.run().await.unwrap();

    assert_eq!(stats.countries, 2);
    assert_eq!(stats.currencies, 2);
    assert_eq!(stats.languages, 2);

    let response = list::handle(
        &pool,
        ListCountriesQuery {
            filter: None,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.meta.total_count, 2);
    let germany = response
        .data
        .iter()
        .find(|c| c.name == "Germany")
        .expect("Germany should be loaded");
    assert_eq!(germany.population_density, Some(233.09));
    assert_eq!(germany.currencies[0].symbol.as_deref(), Some("€"));
}
