//! Extractor tests against a mock HTTP source

use atlas_server::config::EtlConfig;
use atlas_server::etl::{CountryExtractor, ExtractionError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn etl_config(source_url: String) -> EtlConfig {
    EtlConfig {
        source_url,
        source_request_timeout_secs: 5,
        refresh_cron: "0 0 * * *".to_string(),
        schedule_enabled: false,
    }
}

fn sample_payload() -> serde_json::Value {
    serde_json::json!([
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
            "population": 67391582u64,
            "area": 551695.0,
            "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
            "languages": {"fra": "French"}
        }
    ])
}

#[tokio::test]
async fn test_extract_returns_typed_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let config = etl_config(format!("{}/countries", server.uri()));
    let extractor = CountryExtractor::new(&config).unwrap();

    let records = extractor.extract().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name.as_ref().unwrap().common, "Germany");
    assert_eq!(records[0].capital.as_deref(), Some(["Berlin".to_string()].as_slice()));
    assert_eq!(records[1].region.as_deref(), Some("Europe"));
    assert_eq!(records[1].subregion, None);
}

#[tokio::test]
async fn test_extract_surfaces_status_and_body_on_non_2xx() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let config = etl_config(format!("{}/countries", server.uri()));
    let extractor = CountryExtractor::new(&config).unwrap();

    match extractor.extract().await {
        Err(ExtractionError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert!(body.contains("upstream unavailable"));
        },
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_extract_fails_on_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"an array\"}"))
        .mount(&server)
        .await;

    let config = etl_config(format!("{}/countries", server.uri()));
    let extractor = CountryExtractor::new(&config).unwrap();

    match extractor.extract().await {
        Err(ExtractionError::Decode { snippet, .. }) => {
            assert!(snippet.contains("not"));
        },
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_extract_fails_on_network_error() {
    // Nothing listens on this port
    let config = etl_config("http://127.0.0.1:9/countries".to_string());
    let extractor = CountryExtractor::new(&config).unwrap();

    assert!(matches!(
        extractor.extract().await,
        Err(ExtractionError::Request(_))
    ));
}
