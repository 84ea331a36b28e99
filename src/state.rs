use std::sync::Arc;

use crate::external::price_source::SnapshotSource;
use crate::services::aggregation_service::AggregationService;
use crate::services::history_service::HistoryService;

#[derive(Clone)]
pub struct AppState {
    pub history: HistoryService,
    pub aggregation: AggregationService,
    pub snapshot_source: Arc<dyn SnapshotSource>,
    pub tracked_items: Arc<Vec<String>>,
}
