/// HTTP API Integration Tests
///
/// Drives the full router against an in-memory KV backend and a fake
/// market source:
/// - Prices API (GET/POST /api/prices, GET /api/prices/cached)
/// - History API (GET /api/history in all its query modes)
/// - Price change and manual fold endpoints
/// - Mercenary catalog and crafting cost
/// - Malformed request rejections
/// - Health check

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use craftprice_backend::app::create_app;
use craftprice_backend::config::HistorySettings;
use craftprice_backend::external::price_source::{SnapshotSource, SourceError};
use craftprice_backend::models::{PriceInfo, PriceListing, PriceMap};
use craftprice_backend::services::aggregation_service::AggregationService;
use craftprice_backend::services::history_service::HistoryService;
use craftprice_backend::state::AppState;
use craftprice_backend::store::{KvClient, MemoryBackend};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct FakeMarket;

#[async_trait]
impl SnapshotSource for FakeMarket {
    async fn fetch_item(&self, item_name: &str) -> Result<PriceInfo, SourceError> {
        match item_name {
            "missing" => Err(SourceError::BadResponse("no listings page".to_string())),
            _ => Ok(price_info(item_name, 1_000)),
        }
    }
}

fn price_info(item_name: &str, min_price: u64) -> PriceInfo {
    PriceInfo {
        item_name: item_name.to_string(),
        min_price,
        max_price: min_price * 2,
        avg_price: min_price + min_price / 2,
        quantity: 7,
        listings: vec![PriceListing {
            price: min_price,
            quantity: 7,
            seller_name: "seller".to_string(),
        }],
        last_updated: Utc::now(),
    }
}

fn price_map(item_name: &str, min_price: u64) -> PriceMap {
    PriceMap::from([(item_name.to_string(), price_info(item_name, min_price))])
}

struct TestApp {
    router: Router,
    history: HistoryService,
}

fn test_app(kv: KvClient) -> TestApp {
    let kv = Arc::new(kv);
    let history = HistoryService::new(kv.clone(), HistorySettings::new(7));
    let aggregation = AggregationService::new(kv, history.clone());
    let state = AppState {
        history: history.clone(),
        aggregation,
        snapshot_source: Arc::new(FakeMarket),
        tracked_items: Arc::new(vec!["흑철".to_string(), "missing".to_string()]),
    };
    TestApp {
        router: create_app(state),
        history,
    }
}

fn memory_app() -> TestApp {
    test_app(KvClient::with_backend(Arc::new(MemoryBackend::new())))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_store_state() {
    let app = memory_app();
    let (status, body) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["historyEnabled"], true);

    let disabled = test_app(KvClient::unavailable());
    let (_, body) = get(&disabled.router, "/health").await;
    assert_eq!(body["historyEnabled"], false);
}

// ---------------------------------------------------------------------------
// Prices API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_get_prices_records_snapshot() {
    let app = memory_app();
    let (status, body) = get(&app.router, "/api/prices").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["흑철"]["minPrice"], 1_000);
    assert!(body["data"].get("missing").is_none());
    assert!(body["historySaved"].is_object());

    let latest = app.history.get_latest().await.unwrap();
    assert!(latest.prices.contains_key("흑철"));
}

#[tokio::test]
async fn test_get_prices_skip_save() {
    let app = memory_app();
    let (status, body) = get(&app.router, "/api/prices?skipSave=true").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["historySaved"].is_null());
    assert!(app.history.get_latest().await.is_none());
}

#[tokio::test]
async fn test_post_prices_requires_items() {
    let app = memory_app();

    let (status, body) = post_json(&app.router, "/api/prices", json!({ "items": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = post_json(&app.router, "/api/prices", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_prices_fetches_without_saving() {
    let app = memory_app();
    let (status, body) = post_json(&app.router, "/api/prices", json!({ "items": ["정철"] })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["정철"]["itemName"], "정철");
    assert!(app.history.get_latest().await.is_none());
}

#[tokio::test]
async fn test_cached_prices() {
    let app = memory_app();
    let (_, body) = get(&app.router, "/api/prices/cached").await;
    assert_eq!(body["success"], false);

    app.history.save(&price_map("흑철", 500)).await.unwrap();
    let (status, body) = get(&app.router, "/api/prices/cached").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["cached"], true);
    assert_eq!(body["data"]["흑철"]["minPrice"], 500);
}

// ---------------------------------------------------------------------------
// History API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_history_stats_and_full_document() {
    let app = memory_app();
    let now = Utc::now();
    app.history.save_at(&price_map("흑철", 100), now - Duration::minutes(30)).await.unwrap();
    app.history.save_at(&price_map("정철", 200), now - Duration::minutes(10)).await.unwrap();

    let (status, body) = get(&app.router, "/api/history?stats=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalEntries"], 2);
    assert_eq!(body["data"]["itemCount"], 2);

    let (_, body) = get(&app.router, "/api/history").await;
    assert_eq!(body["entriesCount"], 2);
    assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_item_series_with_period() {
    let app = memory_app();
    let now = Utc::now();
    for (minutes_ago, price) in [(40, 300), (20, 100), (5, 200)] {
        app.history
            .save_at(&price_map("흑철", price), now - Duration::minutes(minutes_ago))
            .await
            .unwrap();
    }

    let uri = format!("/api/history?itemName={}&period=24h", encode("흑철"));
    let (status, body) = get(&app.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itemName"], "흑철");
    assert_eq!(body["count"], 3);
    assert_eq!(body["period"], "24h");
    assert_eq!(body["stats"]["historicalHigh"], 300);
    assert_eq!(body["stats"]["historicalLow"], 100);
}

#[tokio::test]
async fn test_history_rejects_bad_period_and_date() {
    let app = memory_app();

    let (status, body) = get(&app.router, "/api/history?itemName=a&period=2y").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = get(&app.router, "/api/history?date=2024-13-40").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_by_date() {
    let app = memory_app();
    let now = Utc::now();
    app.history.save_at(&price_map("흑철", 100), now).await.unwrap();

    let uri = format!("/api/history?date={}", now.date_naive().format("%Y-%m-%d"));
    let (status, body) = get(&app.router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (_, body) = get(&app.router, "/api/history?date=2001-01-01").await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_fold_then_include_daily() {
    let app = memory_app();
    let now = Utc::now();
    app.history.save_at(&price_map("흑철", 100), now - Duration::days(10)).await.unwrap();
    app.history.save_at(&price_map("흑철", 150), now - Duration::minutes(5)).await.unwrap();

    let (status, body) = post_json(&app.router, "/api/history/fold", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["aggregatesCreated"], 1);
    assert_eq!(body["data"]["persisted"], true);

    let uri = format!("/api/history?itemName={}&includeDaily=true", encode("흑철"));
    let (_, body) = get(&app.router, &uri).await;

    // The aged entry is still in the detailed document, so its date is
    // served from the detailed series rather than the aggregate.
    assert_eq!(body["detailedCount"], 2);
    assert_eq!(body["dailyCount"], 1);
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_price_change_endpoint() {
    let app = memory_app();
    let now = Utc::now();
    app.history.save_at(&price_map("흑철", 200), now - Duration::minutes(20)).await.unwrap();
    app.history.save_at(&price_map("흑철", 250), now - Duration::minutes(5)).await.unwrap();

    let uri = format!("/api/history/item/{}/change?price=300", encode("흑철"));
    let (status, body) = get(&app.router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["previousPrice"], 200);
    assert_eq!(body["data"]["change"], 100);
    assert_eq!(body["data"]["changePercent"], 50.0);

    let (status, _) = get(&app.router, "/api/history/item/unknown/change?price=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_without_store_is_empty() {
    let app = test_app(KvClient::unavailable());

    let (status, body) = get(&app.router, "/api/history?stats=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalEntries"], 0);

    let (_, body) = get(&app.router, "/api/prices").await;
    assert_eq!(body["success"], true);
    assert!(body["historySaved"].is_null());
}

// ---------------------------------------------------------------------------
// Malformed requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_malformed_query_uses_error_envelope() {
    let app = memory_app();

    let (status, body) = get(&app.router, "/api/history/item/a/change").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, body) = get(&app.router, "/api/history?itemName=a&includeDaily=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = get(&app.router, "/api/prices?skipSave=maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = memory_app();

    let request = Request::post("/api/prices")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = post_json(&app.router, "/api/prices", json!({ "items": "흑철" })).await;
    assert!(status.is_client_error());
    assert_eq!(body["success"], false);
}

// ---------------------------------------------------------------------------
// Mercenaries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mercenary_catalog() {
    let app = memory_app();

    let (status, body) = get(&app.router, "/api/mercenaries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 15);
    assert_eq!(body["data"][0]["id"], 206);

    let (status, body) = get(&app.router, "/api/mercenaries/157").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["classTypeName"], "전설장수");
    assert_eq!(body["data"]["childMercenaries"][3]["classTypeName"], "개조장수");

    let (status, body) = get(&app.router, "/api/mercenaries/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = get(&app.router, "/api/mercenaries/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_mercenary_cost_uses_stored_prices() {
    let app = memory_app();

    let (status, body) = get(&app.router, "/api/mercenaries/147/cost").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["pricesAt"].is_null());
    assert_eq!(body["data"]["totalCost"], 0);

    let mut prices = price_map("영웅의 영혼석", 1_000);
    prices.extend(price_map("각성석", 30_000));
    app.history.save(&prices).await.unwrap();

    // 147: 100 souls, plus one awakened child (20 souls, 1 awakening stone)
    let (_, body) = get(&app.router, "/api/mercenaries/147/cost").await;
    assert!(body["pricesAt"].is_string());
    assert_eq!(body["name"], "신궁 주몽");
    assert_eq!(body["data"]["mainCost"], 100_000);
    assert_eq!(body["data"]["childCost"], 50_000);
    assert_eq!(body["data"]["totalCost"], 150_000);
    let unpriced = body["data"]["unpricedItems"].as_array().unwrap();
    assert!(unpriced.contains(&json!("뇌전의속성석")));

    let (status, body) = get(&app.router, "/api/mercenaries/costs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 15);
    assert_eq!(body["data"][14]["totalCost"], 150_000);
}
