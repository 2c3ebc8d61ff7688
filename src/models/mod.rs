pub mod filter;
pub mod records;
pub mod rows;

pub use filter::{DateRange, Dimension, Filter, OpenEndPolicy};
pub use records::{ActivityLevel, ActivityRecord, CampaignRecord, MonthlyRecord, Scoped};
pub use rows::{ActivityBucketRow, AggregatedRow, CampaignSummaryRow, MonthlyPoint, NudgeBucket};
