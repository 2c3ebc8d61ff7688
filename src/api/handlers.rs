use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::dataset::{DataService, Snapshot};
use crate::models::{
    ActivityBucketRow, AggregatedRow, CampaignSummaryRow, DateRange, Dimension, Filter,
    MonthlyPoint,
};
use crate::pipeline::{
    alerts, by_campaign, by_dimension, by_nudge_bucket, reshape_monthly, sort_in_place,
    AlertRule, CampaignSortKey, FilterEngine, FunnelSortKey, SortDirection, TriggeredAlert,
};

pub struct AppState {
    pub data: Arc<DataService>,
    pub engine: FilterEngine,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Filter state shared by every data endpoint
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Comma separated
    pub products: Option<String>,
    /// Comma separated
    pub projects: Option<String>,
}

impl FilterParams {
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::default()
            .with_products(split_list(self.products.as_deref()))
            .with_projects(split_list(self.projects.as_deref()));

        // A lone `to` has nothing to anchor it and is ignored
        if let Some(from) = self.from {
            filter = filter.with_date_range(DateRange {
                from: Some(from),
                to: self.to,
            });
        }
        filter
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct FunnelQuery {
    #[serde(default = "default_dimension")]
    pub by: Dimension,
    #[serde(default)]
    pub sort: FunnelSortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

fn default_dimension() -> Dimension {
    Dimension::Product
}

#[derive(Debug, Deserialize)]
pub struct CampaignQuery {
    #[serde(default)]
    pub sort: CampaignSortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub generation: u64,
    pub loaded_at: Option<DateTime<Utc>>,
    pub campaign_records: usize,
    pub activity_records: usize,
    pub monthly_records: usize,
    pub failures: Vec<String>,
    pub open_end: String,
}

impl StatusResponse {
    fn new(snapshot: &Snapshot, engine: &FilterEngine) -> Self {
        Self {
            generation: snapshot.generation,
            loaded_at: snapshot.loaded_at,
            campaign_records: snapshot.campaign.len(),
            activity_records: snapshot.activity.len(),
            monthly_records: snapshot.monthly.len(),
            failures: snapshot.failures.clone(),
            open_end: engine.open_end().to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct DimensionsResponse {
    pub products: Vec<String>,
    pub projects: Vec<String>,
}

#[derive(Serialize)]
pub struct FunnelRow {
    #[serde(flatten)]
    pub row: AggregatedRow,
    pub rate: f64,
}

#[derive(Serialize)]
pub struct CampaignRow {
    #[serde(flatten)]
    pub row: CampaignSummaryRow,
    pub delivery_rate: f64,
    pub click_rate: f64,
}

/// Load status of the current snapshot
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.data.snapshot();
    Json(StatusResponse::new(&snapshot, &state.engine))
}

/// Product and project selector options
pub async fn dimensions(State(state): State<Arc<AppState>>) -> Json<DimensionsResponse> {
    let snapshot = state.data.snapshot();
    Json(DimensionsResponse {
        products: snapshot.distinct_products.clone(),
        projects: snapshot.distinct_projects.clone(),
    })
}

/// Monthly rollups; never narrowed by the filter
pub async fn monthly(State(state): State<Arc<AppState>>) -> Json<Vec<MonthlyPoint>> {
    let snapshot = state.data.snapshot();
    Json(reshape_monthly(&snapshot.monthly))
}

/// Delivery funnel grouped by product or project
pub async fn funnel(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
    Query(query): Query<FunnelQuery>,
) -> Json<Vec<FunnelRow>> {
    let snapshot = state.data.snapshot();
    let view = state.engine.apply(&snapshot, &params.to_filter());

    let mut rows = by_dimension(view.campaign.iter().copied(), query.by);
    sort_in_place(&mut rows, query.sort, query.direction);

    Json(
        rows.into_iter()
            .map(|row| FunnelRow {
                rate: row.rate(),
                row,
            })
            .collect(),
    )
}

/// Per-campaign performance table
pub async fn campaigns(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
    Query(query): Query<CampaignQuery>,
) -> Json<Vec<CampaignRow>> {
    let snapshot = state.data.snapshot();
    let view = state.engine.apply(&snapshot, &params.to_filter());

    let mut rows = by_campaign(view.campaign.iter().copied());
    sort_in_place(&mut rows, query.sort, query.direction);

    Json(
        rows.into_iter()
            .map(|row| CampaignRow {
                delivery_rate: row.delivery_rate(),
                click_rate: row.click_rate(),
                row,
            })
            .collect(),
    )
}

/// Activity levels by nudge-count bucket
pub async fn nudge_activity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Json<Vec<ActivityBucketRow>> {
    let snapshot = state.data.snapshot();
    let view = state.engine.apply(&snapshot, &params.to_filter());

    Json(by_nudge_bucket(view.activity.iter().copied()))
}

/// Evaluate a threshold rule against the filtered campaign records
pub async fn evaluate_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
    Json(rule): Json<AlertRule>,
) -> Json<Vec<TriggeredAlert>> {
    let snapshot = state.data.snapshot();
    let view = state.engine.apply(&snapshot, &params.to_filter());

    Json(alerts::evaluate(&rule, view.campaign.iter().copied()))
}

/// Reload all datasets now
pub async fn reload(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.data.load().await;
    Json(StatusResponse::new(&snapshot, &state.engine))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
