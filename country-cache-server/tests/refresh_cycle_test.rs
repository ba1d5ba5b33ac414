//! End-to-end refresh cycles against mocked external sources.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::io::Write;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use country_cache_server::adapters::inbound::http::{create_router, AppState};
use country_cache_server::adapters::outbound::persistence::Database;
use country_cache_server::bootstrap::services::{assemble, ServiceRegistry};
use country_cache_server::config::Config;
use country_cache_server::domain::models::{CountryFilter, CountrySort, CyclePhase};
use country_cache_server::errors::CycleError;
use country_cache_server::ports::{ArtifactStore, CountryRepository};

const DIRECTORY: &str = r#"[
  {"name": "Wonderland", "capital": "Heart City", "region": "Fantasia",
   "population": 1000000, "flag": "https://flags.example/won.svg",
   "currencies": [{"code": "WON", "name": "Wonder", "symbol": "W"}]},
  {"name": "Noland", "region": "Fantasia", "population": 500000,
   "currencies": []}
]"#;

const RATES: &str = r#"{"result": "success", "base_code": "USD", "rates": {"WON": 2.5}}"#;

struct Harness {
    server: mockito::ServerGuard,
    registry: ServiceRegistry,
    _artifact_dir: tempfile::TempDir,
}

impl Harness {
    async fn new() -> Self {
        let server = mockito::Server::new_async().await;
        let artifact_dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.sources.countries_url = format!("{}/v2/all", server.url());
        config.sources.rates_url = format!("{}/v6/latest/USD", server.url());
        config.sources.timeout_secs = 5;
        config.artifact.path = artifact_dir
            .path()
            .join("cache")
            .join("summary.png")
            .to_string_lossy()
            .into_owned();

        let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
        let registry = assemble(&config, db).unwrap();

        Self {
            server,
            registry,
            _artifact_dir: artifact_dir,
        }
    }

    async fn serve_directory(&mut self, body: &str) -> mockito::Mock {
        self.server
            .mock("GET", "/v2/all")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    async fn serve_rates(&mut self, status: usize, body: &str) -> mockito::Mock {
        self.server
            .mock("GET", "/v6/latest/USD")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    fn app_state(&self) -> AppState {
        AppState {
            repository: self.registry.db.clone(),
            orchestrator: self.registry.orchestrator.clone(),
            countries: self.registry.countries.clone(),
            artifacts: self.registry.artifacts.clone(),
            allowed_origins: Vec::new(),
            cors_disabled: true,
        }
    }
}

#[tokio::test]
async fn test_wonderland_noland_scenario() {
    let mut harness = Harness::new().await;
    let _directory = harness.serve_directory(DIRECTORY).await;
    let _rates = harness.serve_rates(200, RATES).await;

    let report = harness.registry.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.total_fetched, 2);
    assert_eq!(report.upserted, 2);
    assert!(report.artifact_generated);

    let db = &harness.registry.db;
    let wonderland = db.get("wonderland").await.unwrap().unwrap();
    assert_eq!(wonderland.currency_code.as_deref(), Some("WON"));
    assert_eq!(wonderland.exchange_rate, Some(2.5));
    let gdp = wonderland.estimated_gdp.unwrap();
    assert!((4.0e8..=8.0e8).contains(&gdp), "gdp out of range: {gdp}");

    let noland = db.get("Noland").await.unwrap().unwrap();
    assert_eq!(noland.population, 500_000);
    assert_eq!(noland.currency_code, None);
    assert_eq!(noland.exchange_rate, None);
    assert_eq!(noland.estimated_gdp, None);

    let ordered: Vec<String> = db
        .list(&CountryFilter::default(), Some(CountrySort::GDP_DESC))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(ordered, ["Wonderland", "Noland"]);

    let image = harness.registry.artifacts.load().await.unwrap().unwrap();
    assert_eq!(&image[..4], &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_rate_failure_leaves_cache_and_artifact_untouched() {
    let mut harness = Harness::new().await;
    let _directory = harness.serve_directory(DIRECTORY).await;
    let rates = harness.serve_rates(200, RATES).await;
    harness.registry.orchestrator.run_cycle().await.unwrap();

    let before = harness.registry.db.get("Wonderland").await.unwrap();
    let image_before = harness.registry.artifacts.load().await.unwrap();

    rates.remove_async().await;
    let _failing = harness
        .serve_rates(500, r#"{"error": "upstream down"}"#)
        .await;

    let err = harness.registry.orchestrator.run_cycle().await.unwrap_err();
    assert!(matches!(err, CycleError::SourceUnavailable(_)));

    assert_eq!(harness.registry.db.get("Wonderland").await.unwrap(), before);
    assert_eq!(harness.registry.artifacts.load().await.unwrap(), image_before);
}

#[tokio::test]
async fn test_rates_error_result_is_unavailable() {
    let mut harness = Harness::new().await;
    let _directory = harness.serve_directory(DIRECTORY).await;
    let _rates = harness
        .serve_rates(200, r#"{"result": "error", "error-type": "quota-reached"}"#)
        .await;

    let err = harness.registry.orchestrator.run_cycle().await.unwrap_err();

    assert!(matches!(err, CycleError::SourceUnavailable(_)));
    assert_eq!(harness.registry.db.count().await.unwrap(), 0);
    assert!(harness.registry.artifacts.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_entry_is_skipped() {
    let mut harness = Harness::new().await;
    let _directory = harness
        .serve_directory(
            r#"[
              {"name": "Wonderland", "population": 1000000, "currencies": [{"code": "WON"}]},
              {"name": "Brokenland", "population": "a great many"},
              {"population": 42}
            ]"#,
        )
        .await;
    let _rates = harness.serve_rates(200, RATES).await;

    let report = harness.registry.orchestrator.run_cycle().await.unwrap();

    assert_eq!(report.total_fetched, 3);
    assert_eq!(report.upserted, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(
        report.skipped_records[0].name.as_deref(),
        Some("Brokenland")
    );
    assert_eq!(harness.registry.db.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_refresh_is_rejected() {
    let mut harness = Harness::new().await;
    // The directory response is held back until the second trigger has been answered
    let (release, gate) = mpsc::channel::<()>();
    let gate = Mutex::new(gate);
    let _gated_directory = harness
        .server
        .mock("GET", "/v2/all")
        .with_status(200)
        .with_chunked_body(move |w| {
            let _ = gate.lock().map(|rx| rx.recv());
            w.write_all(DIRECTORY.as_bytes())
        })
        .create_async()
        .await;
    let _rates = harness.serve_rates(200, RATES).await;

    let orchestrator = harness.registry.orchestrator.clone();
    let first = tokio::spawn(async move { orchestrator.run_cycle().await });
    while harness.registry.orchestrator.phase() == CyclePhase::Idle {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let second = harness.registry.orchestrator.run_cycle().await;
    assert!(matches!(second, Err(CycleError::InProgress)));

    release.send(()).unwrap();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.upserted, 2);
}

#[tokio::test]
async fn test_refresh_and_image_over_http() {
    let mut harness = Harness::new().await;
    let _directory = harness.serve_directory(DIRECTORY).await;
    let _rates = harness.serve_rates(200, RATES).await;

    let response = create_router(harness.app_state())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/countries/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = create_router(harness.app_state())
        .oneshot(
            Request::builder()
                .uri("/countries/image")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
}
