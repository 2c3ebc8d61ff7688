//! Client-side filtering and aggregation pipeline
//!
//! Raw dataset snapshots flow through the filter engine, then one of the aggregators, then the
//! sort engine. Every stage is a pure function of its inputs and can be recomputed at will.

pub mod aggregate;
pub mod alerts;
pub mod dimensions;
pub mod filter;
pub mod ratio;
pub mod sort;

pub use aggregate::{by_campaign, by_dimension, by_nudge_bucket};
pub use alerts::{AlertCondition, AlertMetric, AlertRule, TriggeredAlert};
pub use dimensions::distinct_values;
pub use filter::{parse_record_date, reshape_monthly, FilterEngine, FilteredView};
pub use ratio::safe_ratio;
pub use sort::{
    sort_in_place, sorted, CampaignSortKey, FunnelSortKey, SortDirection, SortState, SortValue,
    Sortable,
};
