use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::{ApiPath, AppError};
use crate::models::mercenary::{get_all_mercenaries, get_mercenary_by_id};
use crate::models::{MercenaryListItem, PriceMap};
use crate::services::{mercenary_service, price_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_mercenaries))
        .route("/costs", get(get_all_costs))
        .route("/:id", get(get_mercenary))
        .route("/:id/cost", get(get_mercenary_cost))
}

/// Latest stored prices, or an empty map when nothing has been recorded yet.
async fn current_prices(state: &AppState) -> (Option<DateTime<Utc>>, PriceMap) {
    match price_service::cached_prices(&state.history).await {
        Some((timestamp, prices)) => (Some(timestamp), prices),
        None => {
            warn!("No stored price snapshot; costing with empty prices");
            (None, PriceMap::new())
        }
    }
}

/// GET /api/mercenaries - catalog summary
pub async fn list_mercenaries() -> Json<Value> {
    info!("GET /api/mercenaries - Listing catalog");
    let items: Vec<MercenaryListItem> = get_all_mercenaries().iter().map(MercenaryListItem::from).collect();
    Json(json!({ "success": true, "count": items.len(), "data": items }))
}

/// GET /api/mercenaries/:id - full recipe including children
pub async fn get_mercenary(ApiPath(id): ApiPath<u32>) -> Result<Json<Value>, AppError> {
    info!("GET /api/mercenaries/{} - Getting recipe", id);
    let mercenary = get_mercenary_by_id(id)
        .ok_or_else(|| AppError::NotFound(format!("Mercenary {} not found", id)))?;
    Ok(Json(json!({ "success": true, "data": mercenary })))
}

/// GET /api/mercenaries/:id/cost - crafting cost at the latest stored prices
pub async fn get_mercenary_cost(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> Result<Json<Value>, AppError> {
    info!("GET /api/mercenaries/{}/cost - Computing crafting cost", id);
    let mercenary = get_mercenary_by_id(id)
        .ok_or_else(|| AppError::NotFound(format!("Mercenary {} not found", id)))?;

    let (prices_at, prices) = current_prices(&state).await;
    let cost = mercenary_service::crafting_cost(mercenary, &prices);
    Ok(Json(json!({
        "success": true,
        "mercenaryId": mercenary.id,
        "name": mercenary.name,
        "data": cost,
        "pricesAt": prices_at,
    })))
}

/// GET /api/mercenaries/costs - crafting cost of every legendary mercenary
pub async fn get_all_costs(State(state): State<AppState>) -> Json<Value> {
    info!("GET /api/mercenaries/costs - Computing all crafting costs");
    let (prices_at, prices) = current_prices(&state).await;
    let costs = mercenary_service::all_crafting_costs(&prices);
    Json(json!({
        "success": true,
        "count": costs.len(),
        "data": costs,
        "pricesAt": prices_at,
    }))
}
