//! Summary rows produced by the aggregators

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pipeline::ratio::safe_ratio;

/// Delivery totals for one product or project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub name: String,
    pub sent: u64,
    pub delivered: u64,
}

impl AggregatedRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: 0,
            delivered: 0,
        }
    }

    /// delivered / sent, 0 when nothing was sent
    pub fn rate(&self) -> f64 {
        safe_ratio(self.delivered as f64, self.sent as f64)
    }
}

/// Totals for one `(campaign_name, product, project)` identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSummaryRow {
    #[serde(rename = "campaignName")]
    pub campaign_name: String,
    pub product: String,
    pub project: String,
    pub sent: u64,
    pub delivered: u64,
    pub clicks: u64,
    pub cost: f64,
}

impl CampaignSummaryRow {
    pub fn delivery_rate(&self) -> f64 {
        safe_ratio(self.delivered as f64, self.sent as f64)
    }

    pub fn click_rate(&self) -> f64 {
        safe_ratio(self.clicks as f64, self.delivered as f64)
    }
}

/// Fixed nudge-count buckets, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NudgeBucket {
    #[serde(rename = "1-2")]
    OneToTwo,
    #[serde(rename = "3-4")]
    ThreeToFour,
    #[serde(rename = "5-6")]
    FiveToSix,
    #[serde(rename = "7-8")]
    SevenToEight,
    #[serde(rename = "9+")]
    NineOrMore,
}

impl NudgeBucket {
    pub const ALL: [NudgeBucket; 5] = [
        NudgeBucket::OneToTwo,
        NudgeBucket::ThreeToFour,
        NudgeBucket::FiveToSix,
        NudgeBucket::SevenToEight,
        NudgeBucket::NineOrMore,
    ];

    pub fn for_count(nudges_sent: u64) -> Self {
        match nudges_sent {
            0..=2 => NudgeBucket::OneToTwo,
            3..=4 => NudgeBucket::ThreeToFour,
            5..=6 => NudgeBucket::FiveToSix,
            7..=8 => NudgeBucket::SevenToEight,
            _ => NudgeBucket::NineOrMore,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NudgeBucket::OneToTwo => "1-2",
            NudgeBucket::ThreeToFour => "3-4",
            NudgeBucket::FiveToSix => "5-6",
            NudgeBucket::SevenToEight => "7-8",
            NudgeBucket::NineOrMore => "9+",
        }
    }

    /// Position within [`NudgeBucket::ALL`]
    pub(crate) fn slot(&self) -> usize {
        match self {
            NudgeBucket::OneToTwo => 0,
            NudgeBucket::ThreeToFour => 1,
            NudgeBucket::FiveToSix => 2,
            NudgeBucket::SevenToEight => 3,
            NudgeBucket::NineOrMore => 4,
        }
    }
}

/// Activity-level counts for one nudge bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityBucketRow {
    #[serde(rename = "nudge")]
    pub bucket: NudgeBucket,
    pub inactive: u64,
    pub active: u64,
    pub highly_active: u64,
}

impl ActivityBucketRow {
    pub fn empty(bucket: NudgeBucket) -> Self {
        Self {
            bucket,
            inactive: 0,
            active: 0,
            highly_active: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.inactive
            .saturating_add(self.active)
            .saturating_add(self.highly_active)
    }
}

/// A monthly rollup reshaped for charting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// Original `YYYY-MM` key
    pub month_key: String,
    /// Full month name, e.g. "July"
    pub month: String,
    /// First day of the month
    pub period: NaiveDate,
    pub sent: u64,
    pub delivered: u64,
    pub cost: f64,
}
