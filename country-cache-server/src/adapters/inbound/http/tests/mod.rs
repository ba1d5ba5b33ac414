//! Router tests against an in-memory cache and mocked sources.

mod countries_tests;

use axum::{
    body::Body,
    http::{Request, Response},
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use super::{create_router, AppState};
use crate::adapters::outbound::artifacts::MemoryArtifactStore;
use crate::adapters::outbound::persistence::Database;
use crate::adapters::outbound::rendering::PngRenderer;
use crate::application::{CountryService, RefreshOrchestrator, SummaryArtifactBuilder};
use crate::config::ConflictPolicy;
use crate::domain::models::RateTable;
use crate::domain::services::{FixedMultiplierEstimator, GdpEstimator, Normalizer};
use crate::errors::SourceError;
use crate::ports::{CountryRepository, MockCountrySource};

/// Directory with one priced and one unpriced country.
pub(super) fn wonderland_source() -> MockCountrySource {
    let mut source = MockCountrySource::new();
    source.expect_fetch_directory().returning(|| {
        Ok(vec![
            json!({
                "name": "Wonderland",
                "capital": "Heart City",
                "region": "Fantasia",
                "population": 1_000_000,
                "flag": "https://flags.example/won.svg",
                "currencies": [{"code": "WON"}]
            }),
            json!({
                "name": "Noland",
                "region": "Fantasia",
                "population": 500_000,
                "currencies": []
            }),
        ])
    });
    source.expect_fetch_rates().returning(|| {
        Ok(RateTable::new(
            "USD",
            HashMap::from([("WON".to_string(), 2.5)]),
        ))
    });
    source
}

pub(super) fn failing_rates_source() -> MockCountrySource {
    let mut source = MockCountrySource::new();
    source
        .expect_fetch_directory()
        .returning(|| Ok(vec![json!({"name": "Wonderland", "population": 1})]));
    source.expect_fetch_rates().returning(|| {
        Err(SourceError::Status {
            source_name: "Exchange Rates API".to_string(),
            status: 503,
        })
    });
    source
}

pub(super) async fn create_test_app_state(source: MockCountrySource) -> AppState {
    let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
    let repository: Arc<dyn CountryRepository> = db;
    let estimator: Arc<dyn GdpEstimator> = Arc::new(FixedMultiplierEstimator(1000.0));
    let artifacts = Arc::new(MemoryArtifactStore::new());

    let orchestrator = Arc::new(RefreshOrchestrator::new(
        Arc::new(source),
        repository.clone(),
        Normalizer::new(estimator.clone()),
        SummaryArtifactBuilder::new(Arc::new(PngRenderer::new())),
        artifacts.clone(),
        ConflictPolicy::Reject,
        Duration::from_secs(5),
    ));

    AppState {
        repository: repository.clone(),
        orchestrator,
        countries: Arc::new(CountryService::new(repository, estimator)),
        artifacts,
        allowed_origins: vec!["http://localhost:8080".to_string()],
        cors_disabled: false,
    }
}

pub(super) async fn send(state: &AppState, request: Request<Body>) -> Response<Body> {
    create_router(state.clone()).oneshot(request).await.unwrap()
}

pub(super) fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub(super) fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub(super) fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(super) async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub(super) async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
