use axum::http::StatusCode;
use serde_json::json;

use super::*;
use crate::adapters::inbound::http::DeleteResponse;
use crate::domain::models::CountryRecord;

fn wonderland_body() -> Value {
    json!({
        "name": "Wonderland",
        "capital": "Heart City",
        "region": "Fantasia",
        "population": 1_000_000,
        "currency_code": "WON",
        "exchange_rate": 2.5,
    })
}

#[tokio::test]
async fn test_list_countries_empty() {
    let state = create_test_app_state(MockCountrySource::new()).await;

    let response = send(&state, get("/countries")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_create_country_then_get_case_insensitive() {
    let state = create_test_app_state(MockCountrySource::new()).await;

    let response = send(&state, post_json("/countries", &wonderland_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: CountryRecord = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(created.estimated_gdp, Some(4.0e8));

    let response = send(&state, get("/countries/WONDERLAND")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["name"], "Wonderland");
    assert_eq!(fetched["flag_url"], Value::Null);
    assert!(fetched["last_refreshed_at"].is_string());
}

#[tokio::test]
async fn test_create_country_reports_every_bad_field() {
    let state = create_test_app_state(MockCountrySource::new()).await;

    let response = send(
        &state,
        post_json("/countries", &json!({"population": "lots", "currency_code": 12})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    let problem = body_json(response).await;
    assert_eq!(problem["errors"]["name"], "is required");
    assert_eq!(problem["errors"]["population"], "must be a non-negative integer");
    assert_eq!(
        problem["errors"]["currency_code"],
        "must be a 3-letter currency code"
    );

    let listed = body_json(send(&state, get("/countries")).await).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_create_country_with_unreadable_body() {
    let state = create_test_app_state(MockCountrySource::new()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/countries")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&state, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_missing_country_is_not_found() {
    let state = create_test_app_state(MockCountrySource::new()).await;

    let response = send(&state, get("/countries/Atlantis")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let problem = body_json(response).await;
    assert_eq!(problem["status"], 404);
    assert_eq!(problem["instance"], "/countries/Atlantis");
}

#[tokio::test]
async fn test_delete_country_case_insensitive() {
    let state = create_test_app_state(MockCountrySource::new()).await;
    send(&state, post_json("/countries", &wonderland_body())).await;

    let response = send(&state, delete("/countries/wonderland")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let deleted: DeleteResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(deleted.name, "wonderland");

    let response = send(&state, get("/countries/Wonderland")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_country_is_not_found() {
    let state = create_test_app_state(MockCountrySource::new()).await;

    let response = send(&state, delete("/countries/Atlantis")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_rejects_unknown_sort() {
    let state = create_test_app_state(MockCountrySource::new()).await;

    let response = send(&state, get("/countries?sort=name_sideways")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters_ignore_case() {
    let state = create_test_app_state(MockCountrySource::new()).await;
    send(&state, post_json("/countries", &wonderland_body())).await;
    send(
        &state,
        post_json(
            "/countries",
            &json!({"name": "Elsewhere", "region": "Outer", "population": 3, "currency_code": "ELS"}),
        ),
    )
    .await;

    let listed = body_json(send(&state, get("/countries?region=fantasia")).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Wonderland");

    let listed = body_json(send(&state, get("/countries?currency=els")).await).await;
    assert_eq!(listed[0]["name"], "Elsewhere");
}

#[tokio::test]
async fn test_image_before_any_refresh_is_not_found() {
    let state = create_test_app_state(MockCountrySource::new()).await;

    let response = send(&state, get("/countries/image")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let problem = body_json(response).await;
    assert_eq!(problem["instance"], "/countries/image");
}
