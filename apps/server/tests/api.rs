//! Router tests against an in-memory database.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use kasir_db::{Database, DbConfig};
use kasir_server::{build_router, AppState, ServerConfig};

async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    build_router(AppState::new(db, ServerConfig::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

/// Creates GMS-01 with a Hitam variant and returns the variant id.
async fn gamis(app: &Router, stock: i64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/products",
        Some(json!({
            "code": "GMS-01",
            "name": "Gamis Polos",
            "sell_price": 50000,
            "cost_price": 30000,
            "variants": [{ "color": "Hitam", "stock": stock }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["variants"][0]["id"].as_str().unwrap().to_string()
}

async fn shopee_fee(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/fees",
        Some(json!({
            "marketplace": "Shopee",
            "label": "Biaya Admin",
            "kind": "percentage",
            "value": 8.25
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["value"], 825);
    body["id"].as_str().unwrap().to_string()
}

fn shopee_sale(order_code: &str, variant_id: &str, quantity: i64) -> Value {
    json!({
        "order_code": order_code,
        "marketplace": "Shopee",
        "date": "2026-03-02",
        "lines": [{
            "variant_id": variant_id,
            "quantity": quantity,
            "sell_price": 50000,
            "cost_price": 30000
        }]
    })
}

#[tokio::test]
async fn test_health() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["migrations_total"], body["migrations_applied"]);
}

#[tokio::test]
async fn test_product_errors_map_to_status_codes() {
    let app = app().await;
    gamis(&app, 5).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "code": "GMS-01", "name": "Lagi", "sell_price": 1, "cost_price": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");

    let (status, body) = send(&app, Method::GET, "/api/products/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_preview_does_not_touch_stock() {
    let app = app().await;
    shopee_fee(&app).await;
    let variant_id = gamis(&app, 10).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales/preview",
        Some(json!({
            "marketplace": "Shopee",
            "quantity": 4,
            "sell_price": 50000,
            "cost_price": 30000
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_fee"], 16500);
    assert_eq!(body["zakat"], 1588);
    assert_eq!(body["net_profit"], 61912);
    assert_eq!(body["fees"].as_array().unwrap().len(), 1);

    let (_, product) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(product[0]["variants"][0]["id"], variant_id.as_str());
    assert_eq!(product[0]["variants"][0]["stock"], 10);
}

#[tokio::test]
async fn test_sale_flow_through_rekap() {
    let app = app().await;
    shopee_fee(&app).await;
    let variant_id = gamis(&app, 10).await;

    let (status, order) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(shopee_sale("SHP-001", &variant_id, 4)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["items"][0]["total_fee"], 16500);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(shopee_sale("SHP-002", &variant_id, 7)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "insufficient_stock");

    let (status, orders) = send(&app, Method::GET, "/api/sales?date=2026-03-02", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let (status, outcome) = send(
        &app,
        Method::POST,
        "/api/summaries/archive",
        Some(json!({ "date": "2026-03-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["orders_archived"], 1);
    assert_eq!(outcome["summaries"][0]["day_name"], "Senin");
    assert_eq!(outcome["summaries"][0]["total_net_profit"], 61912);

    let (_, orders) = send(&app, Method::GET, "/api/sales?date=2026-03-02", None).await;
    assert!(orders.as_array().unwrap().is_empty());

    let (status, page) = send(
        &app,
        Method::GET,
        "/api/summaries?month=3&year=2026&marketplace=Shopee",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["totals"]["total_units"], 4);

    let (_, product) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(product[0]["variants"][0]["stock"], 6);
}

#[tokio::test]
async fn test_deleting_a_line_restores_stock() {
    let app = app().await;
    let variant_id = gamis(&app, 10).await;

    let (_, order) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(shopee_sale("SHP-001", &variant_id, 3)),
    )
    .await;
    let item_id = order["items"][0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/sales/items/{}", item_id);
    let (status, outcome) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["units_restored"], 3);
    assert_eq!(outcome["order_removed"], true);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, product) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(product[0]["variants"][0]["stock"], 10);
}

#[tokio::test]
async fn test_search_counts_and_reset() {
    let app = app().await;
    let variant_id = gamis(&app, 10).await;

    for (code, quantity) in [("SHP-001", 2), ("SHP-002", 1)] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/sales",
            Some(shopee_sale(code, &variant_id, quantity)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, orders) = send(
        &app,
        Method::GET,
        "/api/sales?date=2026-03-02&search=shp-002",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["order"]["order_code"], "SHP-002");

    let (status, counts) = send(&app, Method::GET, "/api/sales/counts?date=2026-03-02", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counts[0]["marketplace"], "Shopee");
    assert_eq!(counts[0]["orders"], 2);
    assert_eq!(counts[0]["units"], 3);

    let (status, outcome) = send(&app, Method::POST, "/api/sales/reset?date=2026-03-02", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["orders_removed"], 2);
    assert_eq!(outcome["units_restored"], 3);

    let (_, orders) = send(&app, Method::GET, "/api/sales?date=2026-03-02", None).await;
    assert!(orders.as_array().unwrap().is_empty());

    let (_, product) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(product[0]["variants"][0]["stock"], 10);
}

#[tokio::test]
async fn test_preview_rejects_prices_too_large_to_compute() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales/preview",
        Some(json!({
            "marketplace": "Shopee",
            "quantity": 3,
            "sell_price": i64::MAX / 2,
            "cost_price": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales/preview",
        Some(json!({
            "marketplace": "Shopee",
            "quantity": kasir_core::MAX_LINE_QUANTITY,
            "sell_price": kasir_core::MAX_PRICE,
            "cost_price": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gross_profit"], 999_900_000_000_000_i64);
}

#[tokio::test]
async fn test_inactive_fee_is_not_charged() {
    let app = app().await;
    let fee_id = shopee_fee(&app).await;

    let (status, fee) = send(
        &app,
        Method::PUT,
        &format!("/api/fees/{}/active", fee_id),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fee["is_active"], false);

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/sales/preview",
        Some(json!({
            "marketplace": "Shopee",
            "quantity": 1,
            "sell_price": 100,
            "cost_price": 60
        })),
    )
    .await;
    assert_eq!(body["total_fee"], 0);
    assert_eq!(body["zakat"], 1);

    let (status, fees) = send(&app, Method::GET, "/api/fees?marketplace=Shopee", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fees.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/summaries?month=13", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/sales/preview",
        Some(json!({
            "marketplace": "Shopee",
            "quantity": 0,
            "sell_price": 100,
            "cost_price": 60
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/fees",
        Some(json!({
            "marketplace": "Shopee",
            "label": "Terlalu Besar",
            "kind": "percentage",
            "value": 150.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_marketplaces() {
    let app = app().await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/marketplaces",
        Some(json!({ "name": "Shopee" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/marketplaces",
        Some(json!({ "name": "Shopee" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/marketplaces/{}", created["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = send(&app, Method::GET, "/api/marketplaces", None).await;
    assert!(list.as_array().unwrap().is_empty());
}
