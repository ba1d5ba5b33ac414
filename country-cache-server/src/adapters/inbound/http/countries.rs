//! Country cache endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{AppState, ProblemDetails};
use crate::domain::models::{CountryFilter, CountryRecord, CountrySort, DeleteOutcome};
use crate::errors::WriteError;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub name: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[tracing::instrument(name = "list_countries", skip(state))]
pub async fn list_countries(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CountryRecord>>, ProblemDetails> {
    let sort = match non_empty(query.sort) {
        Some(raw) => Some(CountrySort::parse(&raw).ok_or_else(|| {
            tracing::warn!(sort = %raw, "Rejected unknown sort order");
            ProblemDetails::validation_error(format!(
                "Unsupported sort '{}'. Use gdp_desc, gdp_asc, population_desc or population_asc",
                raw
            ))
        })?),
        None => None,
    };
    let filter = CountryFilter {
        region: non_empty(query.region),
        currency_code: non_empty(query.currency),
    };

    match state.repository.list(&filter, sort).await {
        Ok(records) => {
            tracing::info!(count = records.len(), "Listed countries");
            Ok(Json(records))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list countries");
            Err(e.into())
        }
    }
}

#[tracing::instrument(name = "get_country", skip(state))]
pub async fn get_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CountryRecord>, ProblemDetails> {
    match state.repository.get(&name).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(ProblemDetails::not_found(format!("Country '{}'", name))
            .with_instance(format!("/countries/{}", name))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read country");
            Err(e.into())
        }
    }
}

#[tracing::instrument(name = "delete_country", skip(state))]
pub async fn delete_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteResponse>, ProblemDetails> {
    match state.repository.delete(&name).await {
        Ok(DeleteOutcome::Deleted) => {
            tracing::info!("Country deleted");
            Ok(Json(DeleteResponse {
                message: "Country deleted".to_string(),
                name,
            }))
        }
        Ok(DeleteOutcome::NotFound) => Err(ProblemDetails::not_found(format!(
            "Country '{}'",
            name
        ))
        .with_instance(format!("/countries/{}", name))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete country");
            Err(e.into())
        }
    }
}

#[tracing::instrument(name = "create_country", skip_all)]
pub async fn create_country(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CountryRecord>), ProblemDetails> {
    let Json(input) = body.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected unreadable country body");
        ProblemDetails::validation_error(rejection.body_text())
    })?;

    match state.countries.create_or_overwrite(&input).await {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(WriteError::Validation(v)) => {
            tracing::warn!(error = %v, "Rejected country write");
            Err(v.into())
        }
        Err(WriteError::Storage(e)) => {
            tracing::error!(error = %e, "Failed to write country");
            Err(e.into())
        }
    }
}

#[tracing::instrument(name = "get_summary_image", skip(state))]
pub async fn get_summary_image(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ProblemDetails> {
    match state.artifacts.load().await {
        Ok(Some(bytes)) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes)),
        Ok(None) => Err(ProblemDetails::not_found("Summary image")
            .with_detail("Summary image not found. Run a refresh first")
            .with_instance("/countries/image")),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load summary image");
            Err(ProblemDetails::internal_error(format!(
                "Failed to load summary image: {}",
                e
            )))
        }
    }
}
