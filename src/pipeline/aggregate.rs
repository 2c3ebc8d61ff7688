//! Grouping and rollups over already-filtered records.
//!
//! Every function here is pure: output is derived from the input records alone and groups are
//! emitted in first-seen order. Ordering for display is left to the sort engine.

use std::collections::HashMap;

use crate::models::{
    ActivityBucketRow, ActivityLevel, ActivityRecord, AggregatedRow, CampaignRecord,
    CampaignSummaryRow, Dimension, NudgeBucket,
};
use crate::pipeline::dimensions::dimension_value;

/// Sum `sent` and `delivered` per value of `dimension`.
///
/// Every record lands in exactly one group, including an empty-string group.
pub fn by_dimension<'a, I>(records: I, dimension: Dimension) -> Vec<AggregatedRow>
where
    I: IntoIterator<Item = &'a CampaignRecord>,
{
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    let mut rows: Vec<AggregatedRow> = Vec::new();

    for record in records {
        let name = dimension_value(record, dimension);
        let slot = *slots.entry(name).or_insert_with(|| {
            rows.push(AggregatedRow::new(name));
            rows.len() - 1
        });
        let row = &mut rows[slot];
        row.sent = row.sent.saturating_add(record.sent);
        row.delivered = row.delivered.saturating_add(record.delivered);
    }

    rows
}

/// Roll campaign records up to one row per `(campaign_name, product, project)`.
///
/// Records without a campaign name are skipped.
pub fn by_campaign<'a, I>(records: I) -> Vec<CampaignSummaryRow>
where
    I: IntoIterator<Item = &'a CampaignRecord>,
{
    let mut slots: HashMap<(&'a str, &'a str, &'a str), usize> = HashMap::new();
    let mut rows: Vec<CampaignSummaryRow> = Vec::new();

    for record in records {
        if record.campaign_name.is_empty() {
            continue;
        }

        let key = (
            record.campaign_name.as_str(),
            record.product.as_str(),
            record.project.as_str(),
        );
        let slot = *slots.entry(key).or_insert_with(|| {
            rows.push(CampaignSummaryRow {
                campaign_name: record.campaign_name.clone(),
                product: record.product.clone(),
                project: record.project.clone(),
                sent: 0,
                delivered: 0,
                clicks: 0,
                cost: 0.0,
            });
            rows.len() - 1
        });

        let row = &mut rows[slot];
        row.sent = row.sent.saturating_add(record.sent);
        row.delivered = row.delivered.saturating_add(record.delivered);
        row.clicks = row.clicks.saturating_add(record.clicks);
        row.cost += record.cost;
    }

    rows
}

/// Count activity levels per nudge bucket. All five buckets are always present.
pub fn by_nudge_bucket<'a, I>(records: I) -> Vec<ActivityBucketRow>
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let mut rows: Vec<ActivityBucketRow> =
        NudgeBucket::ALL.iter().copied().map(ActivityBucketRow::empty).collect();

    for record in records {
        let row = &mut rows[NudgeBucket::for_count(record.nudges_sent).slot()];
        match record.activity_level {
            ActivityLevel::Inactive => row.inactive += 1,
            ActivityLevel::Active => row.active += 1,
            ActivityLevel::HighlyActive => row.highly_active += 1,
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(name: &str, product: &str, project: &str, sent: u64, delivered: u64) -> CampaignRecord {
        CampaignRecord {
            date: "2025-07-01".to_string(),
            product: product.to_string(),
            project: project.to_string(),
            campaign_name: name.to_string(),
            sent,
            delivered,
            clicks: 0,
            cost: 0.0,
        }
    }

    fn activity(nudges_sent: u64, level: ActivityLevel) -> ActivityRecord {
        ActivityRecord {
            date: "2025-07-01".to_string(),
            product: "P1".to_string(),
            project: "X".to_string(),
            activity_level: level,
            nudges_sent,
        }
    }

    #[test]
    fn by_dimension_preserves_totals() {
        let records = vec![
            campaign("C1", "P1", "X", 100, 80),
            campaign("C2", "P2", "X", 40, 10),
            campaign("C3", "P1", "Y", 60, 60),
        ];

        let rows = by_dimension(&records, Dimension::Product);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "P1");
        assert_eq!(rows[0].sent, 160);
        assert_eq!(rows[0].delivered, 140);

        let sent: u64 = rows.iter().map(|r| r.sent).sum();
        let delivered: u64 = rows.iter().map(|r| r.delivered).sum();
        assert_eq!(sent, 200);
        assert_eq!(delivered, 150);
    }

    #[test]
    fn by_dimension_keeps_empty_values_as_a_group() {
        let records = vec![campaign("C1", "", "X", 5, 5), campaign("C2", "P1", "X", 5, 4)];

        let rows = by_dimension(&records, Dimension::Product);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "");
        assert_eq!(rows[0].sent, 5);
    }

    #[test]
    fn by_campaign_groups_on_full_identity() {
        let records = vec![
            campaign("C1", "P1", "X", 100, 80),
            campaign("C1", "P1", "Y", 10, 10),
            campaign("C1", "P1", "X", 50, 40),
        ];

        let rows = by_campaign(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].project, "X");
        assert_eq!(rows[0].sent, 150);
        assert_eq!(rows[1].project, "Y");
    }

    #[test]
    fn by_campaign_key_does_not_collide_on_concatenation() {
        // "ab" + "c" and "a" + "bc" would collapse under a concatenated key
        let records = vec![campaign("ab", "c", "X", 1, 1), campaign("a", "bc", "X", 1, 1)];

        assert_eq!(by_campaign(&records).len(), 2);
    }

    #[test]
    fn by_campaign_skips_unnamed_records() {
        let records = vec![campaign("", "P1", "X", 100, 80), campaign("C1", "P1", "X", 1, 1)];

        let rows = by_campaign(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].campaign_name, "C1");
    }

    #[test]
    fn zero_sent_campaign_has_zero_rates() {
        let records = vec![campaign("C1", "P1", "X", 0, 0)];

        let rows = by_campaign(&records);
        assert_eq!(rows[0].delivery_rate(), 0.0);
        assert_eq!(rows[0].click_rate(), 0.0);
    }

    #[test]
    fn nudge_buckets_are_fixed_and_counted() {
        let records = vec![
            activity(1, ActivityLevel::Active),
            activity(3, ActivityLevel::Inactive),
            activity(7, ActivityLevel::HighlyActive),
            activity(12, ActivityLevel::Active),
        ];

        let rows = by_nudge_bucket(&records);
        let labels: Vec<&str> = rows.iter().map(|r| r.bucket.label()).collect();
        assert_eq!(labels, vec!["1-2", "3-4", "5-6", "7-8", "9+"]);

        assert_eq!(rows[0].active, 1);
        assert_eq!(rows[1].inactive, 1);
        assert_eq!(rows[2].total(), 0);
        assert_eq!(rows[3].highly_active, 1);
        assert_eq!(rows[4].active, 1);
    }

    #[test]
    fn nudge_bucket_boundaries() {
        assert_eq!(NudgeBucket::for_count(0), NudgeBucket::OneToTwo);
        assert_eq!(NudgeBucket::for_count(2), NudgeBucket::OneToTwo);
        assert_eq!(NudgeBucket::for_count(4), NudgeBucket::ThreeToFour);
        assert_eq!(NudgeBucket::for_count(6), NudgeBucket::FiveToSix);
        assert_eq!(NudgeBucket::for_count(8), NudgeBucket::SevenToEight);
        assert_eq!(NudgeBucket::for_count(9), NudgeBucket::NineOrMore);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let mut first = campaign("C1", "P1", "X", u64::MAX, u64::MAX);
        first.clicks = u64::MAX;
        let second = first.clone();
        let records = vec![first, second];

        let rows = by_dimension(&records, Dimension::Product);
        assert_eq!(rows[0].sent, u64::MAX);
        assert_eq!(rows[0].delivered, u64::MAX);

        let rows = by_campaign(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sent, u64::MAX);
        assert_eq!(rows[0].clicks, u64::MAX);
        assert_eq!(rows[0].delivery_rate(), 1.0);

        let mut bucket = ActivityBucketRow::empty(NudgeBucket::NineOrMore);
        bucket.inactive = u64::MAX;
        bucket.active = 1;
        assert_eq!(bucket.total(), u64::MAX);
    }

    #[test]
    fn empty_inputs_produce_empty_or_zeroed_output() {
        let campaigns: Vec<CampaignRecord> = Vec::new();
        let activities: Vec<ActivityRecord> = Vec::new();

        assert!(by_dimension(&campaigns, Dimension::Project).is_empty());
        assert!(by_campaign(&campaigns).is_empty());
        let buckets = by_nudge_bucket(&activities);
        assert_eq!(buckets.len(), 5);
        assert!(buckets.iter().all(|r| r.total() == 0));
    }
}
