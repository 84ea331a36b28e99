use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::{ApiJson, ApiQuery, AppError};
use crate::external::price_source::fetch_snapshot;
use crate::services::price_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_prices).post(fetch_selected_prices))
        .route("/cached", get(get_cached_prices))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricesQuery {
    #[serde(default)]
    pub skip_save: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectedItemsRequest {
    pub items: Option<Vec<String>>,
}

/// GET /api/prices - fetch every tracked item and record the snapshot
pub async fn get_prices(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PricesQuery>,
) -> Json<Value> {
    info!("GET /api/prices - Fetching {} tracked items (skipSave={})", state.tracked_items.len(), params.skip_save);
    let outcome = price_service::refresh_snapshot(
        state.snapshot_source.as_ref(),
        &state.history,
        &state.tracked_items,
        params.skip_save,
    )
    .await;

    let history_saved = outcome.saved.as_ref().map(|entry| {
        json!({ "date": entry.date, "hour": entry.hour, "minuteSlot": entry.minute_slot })
    });

    Json(json!({
        "success": true,
        "data": outcome.prices,
        "timestamp": outcome.fetched_at,
        "historySaved": history_saved,
    }))
}

/// POST /api/prices - fetch only the listed items, without recording them
pub async fn fetch_selected_prices(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SelectedItemsRequest>,
) -> Result<Json<Value>, AppError> {
    let items = match req.items {
        Some(items) if !items.is_empty() => items,
        _ => return Err(AppError::Validation("items must be a non-empty list".to_string())),
    };
    info!("POST /api/prices - Fetching {} selected items", items.len());

    let prices = fetch_snapshot(state.snapshot_source.as_ref(), &items).await;
    Ok(Json(json!({
        "success": true,
        "data": prices,
        "timestamp": Utc::now(),
    })))
}

/// GET /api/prices/cached - latest stored snapshot, no upstream fetch
pub async fn get_cached_prices(State(state): State<AppState>) -> Json<Value> {
    info!("GET /api/prices/cached - Reading latest stored snapshot");
    match price_service::cached_prices(&state.history).await {
        Some((timestamp, prices)) => Json(json!({
            "success": true,
            "data": prices,
            "timestamp": timestamp,
            "cached": true,
        })),
        None => {
            warn!("No stored price snapshot available");
            Json(json!({ "success": false, "error": "No stored price data" }))
        }
    }
}
