use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::{ApiPath, ApiQuery, AppError};
use crate::models::ChartPeriod;
use crate::services::series_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_history))
        .route("/item/:item_name/change", get(get_price_change))
        .route("/fold", post(fold_aged_entries))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub item_name: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub stats: bool,
    #[serde(default)]
    pub include_daily: bool,
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceChangeQuery {
    pub price: u64,
}

/// GET /api/history - stats, one item's series, one date, or the whole document
pub async fn get_history(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryQuery>,
) -> Result<Json<Value>, AppError> {
    if params.stats {
        info!("GET /api/history?stats=true - Getting history stats");
        let stats = state.history.get_stats().await;
        return Ok(Json(json!({ "success": true, "data": stats })));
    }

    if let Some(item_name) = params.item_name.as_deref() {
        return get_item_series(&state, item_name, &params).await.map(Json);
    }

    if let Some(date) = params.date.as_deref() {
        info!("GET /api/history?date={} - Getting entries for date", date);
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("Invalid date: {}. Expected YYYY-MM-DD", date)))?;
        let entries = state.history.get_by_date(date).await;
        return Ok(Json(json!({
            "success": true,
            "date": date,
            "count": entries.len(),
            "data": entries,
        })));
    }

    info!("GET /api/history - Getting full history");
    let history = state.history.read().await;
    Ok(Json(json!({
        "success": true,
        "entriesCount": history.entries.len(),
        "data": history,
    })))
}

async fn get_item_series(
    state: &AppState,
    item_name: &str,
    params: &HistoryQuery,
) -> Result<Value, AppError> {
    info!(
        "GET /api/history?itemName={} - Getting item history (includeDaily={})",
        item_name, params.include_daily
    );

    let period = params
        .period
        .as_deref()
        .map(str::parse::<ChartPeriod>)
        .transpose()?;

    let (series, detailed_count, daily_count) = if params.include_daily {
        let both =
            series_service::get_item_history_with_daily(&state.history, &state.aggregation, item_name).await;
        let merged = series_service::merge_with_daily(&both.detailed, &both.daily);
        (merged, both.detailed.len(), Some(both.daily.len()))
    } else {
        let detailed = state.history.get_item_history(item_name).await;
        let count = detailed.len();
        (detailed, count, None)
    };

    let stats = series_service::series_stats(&series);
    let data = match period {
        Some(period) => series_service::downsample(&series, period, Utc::now()),
        None => series,
    };

    let mut body = json!({
        "success": true,
        "itemName": item_name,
        "count": data.len(),
        "detailedCount": detailed_count,
        "stats": stats,
        "data": data,
    });
    if let Some(daily_count) = daily_count {
        body["dailyCount"] = json!(daily_count);
    }
    if let Some(period) = period {
        body["period"] = json!(period.as_str());
    }
    Ok(body)
}

/// GET /api/history/item/:item_name/change?price=N
pub async fn get_price_change(
    ApiPath(item_name): ApiPath<String>,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PriceChangeQuery>,
) -> Result<Json<Value>, AppError> {
    info!("GET /api/history/item/{}/change - Computing price change", item_name);
    let history = state.history.get_item_history(&item_name).await;
    let change = series_service::price_change(&history, params.price).ok_or_else(|| {
        AppError::NotFound(format!("Not enough history for {} to compute a change", item_name))
    })?;
    Ok(Json(json!({ "success": true, "itemName": item_name, "data": change })))
}

/// POST /api/history/fold - fold aged entries into daily aggregates now
pub async fn fold_aged_entries(State(state): State<AppState>) -> Json<Value> {
    info!("POST /api/history/fold - Folding aged entries");
    let report = state.aggregation.fold_aged_entries().await;
    Json(json!({ "success": true, "data": report }))
}
