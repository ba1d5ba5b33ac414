//! REST API for the country cache
//!
//! Exposes the refresh trigger, cached country lookups, direct writes, the
//! cache status, and the summary image. Includes CORS configuration and
//! request tracing.

mod countries;
mod error;
mod refresh;

#[cfg(test)]
mod tests;

pub use countries::{DeleteResponse, ListQuery};
pub use error::ProblemDetails;
pub use refresh::StatusResponse;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

use crate::application::{CountryService, RefreshOrchestrator};
use crate::ports::{ArtifactStore, CountryRepository};

use countries::{
    create_country, delete_country, get_country, get_summary_image, list_countries,
};
use refresh::{get_status, trigger_refresh};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn CountryRepository>,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub countries: Arc<CountryService>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub allowed_origins: Vec<String>,
    pub cors_disabled: bool,
}

pub fn create_router(state: AppState) -> Router {
    let cors = if state.cors_disabled {
        tracing::warn!(
            "CORS is DISABLED - allowing all origins. This should only be used in development!"
        );
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(
                state
                    .allowed_origins
                    .iter()
                    .filter_map(|origin| origin.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "HTTP request started"
            );
        })
        .on_response(
            DefaultOnResponse::new()
                .level(tracing::Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/countries", get(list_countries).post(create_country))
        .route("/countries/refresh", post(trigger_refresh))
        // Static segment, matched ahead of the `:name` capture
        .route("/countries/image", get(get_summary_image))
        .route(
            "/countries/:name",
            get(get_country).delete(delete_country),
        )
        .route("/status", get(get_status))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
