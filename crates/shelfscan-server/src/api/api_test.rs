use axum::body::{to_bytes, Body};
use axum::http::Request;
use shelfscan_core::CleanedProduct;
use tower::ServiceExt;

use super::*;

async fn memory_pool() -> SqlitePool {
    let pool = shelfscan_db::connect_pool(
        "sqlite::memory:",
        shelfscan_db::PoolConfig::single_connection(),
    )
    .await
    .expect("in-memory pool");
    shelfscan_db::run_migrations(&pool)
        .await
        .expect("migrations apply");
    pool
}

fn product(name: &str, brand: Option<&str>, price: f64) -> CleanedProduct {
    CleanedProduct {
        name: name.to_string(),
        brand: brand.map(str::to_string),
        price: Some(price),
        original_price: Some(price),
        discount: None,
        url: Some(format!("https://shop.example/products/{}", name.to_lowercase())),
        image_url: None,
    }
}

async fn seeded_app() -> Router {
    let pool = memory_pool().await;
    shelfscan_db::insert_products(
        &pool,
        &[
            product("Tote", Some("JWomen"), 152.0),
            product("Clutch", Some("Aldo"), 99.5),
            product("Pouch", None, 40.0),
        ],
    )
    .await
    .expect("seed products");
    build_app(AppState { pool })
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 100);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(10_000)), 500);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn normalize_offset_rejects_negatives() {
    assert_eq!(normalize_offset(None), 0);
    assert_eq!(normalize_offset(Some(-5)), 0);
    assert_eq!(normalize_offset(Some(20)), 20);
}

#[test]
fn api_error_codes_map_to_statuses() {
    assert_eq!(
        ApiError::new("r", "not_found", "x").into_response().status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ApiError::new("r", "internal_error", "x")
            .into_response()
            .status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn root_describes_the_service() {
    let (status, json) = get_json(seeded_app().await, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "shelfscan-server");
    assert!(json["meta"]["request_id"].is_string());
    assert!(json["meta"]["timestamp"].is_string());
}

#[tokio::test]
async fn health_reports_database_ok() {
    let (status, json) = get_json(seeded_app().await, "/api/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["database"], "ok");
}

#[tokio::test]
async fn health_is_degraded_when_pool_is_closed() {
    let pool = memory_pool().await;
    pool.close().await;
    let (status, json) = get_json(build_app(AppState { pool }), "/api/v1/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["data"]["status"], "degraded");
}

#[tokio::test]
async fn list_products_returns_rows_in_insert_order() {
    let (status, json) = get_json(seeded_app().await, "/api/v1/products").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, ["Tote", "Clutch", "Pouch"]);
    assert_eq!(json["data"][0]["price"], 152.0);
    assert!(json["data"][2]["brand"].is_null());
}

#[tokio::test]
async fn list_products_pages_and_filters_by_brand() {
    let app = seeded_app().await;

    let (_, paged) = get_json(app.clone(), "/api/v1/products?limit=1&offset=1").await;
    let paged = paged["data"].as_array().expect("data array");
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0]["name"], "Clutch");

    let (_, filtered) = get_json(app, "/api/v1/products?brand=JWomen").await;
    let filtered = filtered["data"].as_array().expect("data array");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["name"], "Tote");
}

#[tokio::test]
async fn get_product_by_id() {
    let (status, json) = get_json(seeded_app().await, "/api/v1/products/2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], 2);
    assert_eq!(json["data"]["brand"], "Aldo");
}

#[tokio::test]
async fn missing_product_is_not_found_envelope() {
    let (status, json) = get_json(seeded_app().await, "/api/v1/products/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn non_numeric_product_id_is_bad_request_envelope() {
    let (status, json) = get_json(seeded_app().await, "/api/v1/products/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn database_failure_is_internal_error() {
    let pool = memory_pool().await;
    pool.close().await;
    let (status, json) = get_json(build_app(AppState { pool }), "/api/v1/products/1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "internal_error");
}

#[tokio::test]
async fn brands_are_distinct_and_sorted() {
    let (status, json) = get_json(seeded_app().await, "/api/v1/brands").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["brands"], serde_json::json!(["Aldo", "JWomen"]));
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let response = seeded_app()
        .await
        .oneshot(
            Request::builder()
                .uri("/api/v1/brands")
                .header(REQUEST_ID_HEADER, "trace-me")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("trace-me")
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
    assert_eq!(json["meta"]["request_id"], "trace-me");
}
