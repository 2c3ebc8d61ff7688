//! Shared inclusion predicate for the campaign and activity datasets.
//!
//! Rules are applied in order: the record date must parse (fail-closed), fall inside the
//! inclusive date window, and match the product and project allow-lists. Monthly rollups are
//! never filtered by product or project; they are only reshaped for charting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::dataset::Snapshot;
use crate::models::{
    ActivityRecord, CampaignRecord, DateRange, Filter, MonthlyPoint, MonthlyRecord, OpenEndPolicy,
    Scoped,
};

/// Filtered, borrowed view over a snapshot
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub campaign: Vec<&'a CampaignRecord>,
    pub activity: Vec<&'a ActivityRecord>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEngine {
    open_end: OpenEndPolicy,
}

impl FilterEngine {
    pub fn new(open_end: OpenEndPolicy) -> Self {
        Self { open_end }
    }

    pub fn open_end(&self) -> OpenEndPolicy {
        self.open_end
    }

    /// Whether `record` passes every applicable test of `filter`
    pub fn included<R: Scoped>(&self, record: &R, filter: &Filter) -> bool {
        let Some(date) = parse_record_date(record.date()) else {
            return false;
        };

        self.in_window(date, filter.date_range.as_ref())
            && allows(&filter.products, record.product())
            && allows(&filter.projects, record.project())
    }

    /// Apply `filter` to the campaign and activity collections of `snapshot`
    pub fn apply<'a>(&self, snapshot: &'a Snapshot, filter: &Filter) -> FilteredView<'a> {
        let campaign: Vec<&CampaignRecord> = snapshot
            .campaign
            .iter()
            .filter(|record| self.included(*record, filter))
            .collect();
        let activity: Vec<&ActivityRecord> = snapshot
            .activity
            .iter()
            .filter(|record| self.included(*record, filter))
            .collect();

        debug!(
            campaign = campaign.len(),
            activity = activity.len(),
            "applied dashboard filter"
        );

        FilteredView {
            campaign,
            activity,
        }
    }

    fn in_window(&self, date: NaiveDate, range: Option<&DateRange>) -> bool {
        let Some(from) = range.and_then(|r| r.from) else {
            return true;
        };
        let to = range
            .and_then(|r| r.to)
            .unwrap_or_else(|| self.open_upper_bound(from));

        from <= date && date <= to
    }

    fn open_upper_bound(&self, from: NaiveDate) -> NaiveDate {
        match self.open_end {
            OpenEndPolicy::SingleDay => from,
            OpenEndPolicy::ThroughToday => Utc::now().date_naive(),
        }
    }
}

fn allows(allow_list: &[String], value: &str) -> bool {
    allow_list.is_empty() || allow_list.iter().any(|allowed| allowed == value)
}

/// Calendar date of a record, from `YYYY-MM-DD` or an ISO-8601 date-time.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    raw.parse::<NaiveDateTime>().ok().map(|dt| dt.date())
}

/// Reshape monthly rollups for charting; months that do not parse are dropped.
pub fn reshape_monthly(records: &[MonthlyRecord]) -> Vec<MonthlyPoint> {
    records
        .iter()
        .filter_map(|record| {
            let period =
                NaiveDate::parse_from_str(&format!("{}-01", record.month), "%Y-%m-%d").ok()?;
            Some(MonthlyPoint {
                month_key: record.month.clone(),
                month: period.format("%B").to_string(),
                period,
                sent: record.sent,
                delivered: record.delivered,
                cost: record.cost,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn campaign(date: &str, product: &str, project: &str) -> CampaignRecord {
        CampaignRecord {
            date: date.to_string(),
            product: product.to_string(),
            project: project.to_string(),
            campaign_name: "C1".to_string(),
            sent: 10,
            delivered: 9,
            clicks: 1,
            cost: 0.5,
        }
    }

    #[test]
    fn unparseable_dates_are_excluded_even_without_filter() {
        let engine = FilterEngine::default();
        let record = campaign("not-a-date", "P1", "X");
        assert!(!engine.included(&record, &Filter::default()));

        let record = campaign("", "P1", "X");
        assert!(!engine.included(&record, &Filter::default()));
    }

    #[test]
    fn date_range_is_inclusive_at_both_ends() {
        let engine = FilterEngine::default();
        let filter =
            Filter::default().with_date_range(DateRange::between(day("2025-07-01"), day("2025-07-03")));

        assert!(engine.included(&campaign("2025-07-01", "P1", "X"), &filter));
        assert!(engine.included(&campaign("2025-07-03", "P1", "X"), &filter));
        assert!(!engine.included(&campaign("2025-06-30", "P1", "X"), &filter));
        assert!(!engine.included(&campaign("2025-07-04", "P1", "X"), &filter));
    }

    #[test]
    fn missing_from_disables_the_date_test() {
        let engine = FilterEngine::default();
        let filter = Filter::default().with_date_range(DateRange {
            from: None,
            to: Some(day("2020-01-01")),
        });
        assert!(engine.included(&campaign("2025-07-01", "P1", "X"), &filter));
    }

    #[test]
    fn single_day_policy_closes_open_range_at_from() {
        let engine = FilterEngine::new(OpenEndPolicy::SingleDay);
        let filter = Filter::default().with_date_range(DateRange::starting(day("2025-07-01")));

        assert!(engine.included(&campaign("2025-07-01", "P1", "X"), &filter));
        assert!(!engine.included(&campaign("2025-07-02", "P1", "X"), &filter));
    }

    #[test]
    fn through_today_policy_excludes_future_records() {
        let engine = FilterEngine::new(OpenEndPolicy::ThroughToday);
        let filter = Filter::default().with_date_range(DateRange::starting(day("2020-01-01")));

        assert!(engine.included(&campaign("2021-05-05", "P1", "X"), &filter));
        assert!(!engine.included(&campaign("2999-01-01", "P1", "X"), &filter));
    }

    #[test]
    fn datetime_strings_use_their_calendar_day() {
        let engine = FilterEngine::default();
        let filter =
            Filter::default().with_date_range(DateRange::between(day("2025-07-01"), day("2025-07-01")));

        assert!(engine.included(&campaign("2025-07-01T23:15:00Z", "P1", "X"), &filter));
        assert!(engine.included(&campaign("2025-07-01T08:00:00", "P1", "X"), &filter));
    }

    #[test]
    fn allow_lists_restrict_product_and_project() {
        let engine = FilterEngine::default();
        let filter = Filter::default()
            .with_products(["P1", "P2"])
            .with_projects(["X"]);

        assert!(engine.included(&campaign("2025-07-01", "P1", "X"), &filter));
        assert!(engine.included(&campaign("2025-07-01", "P2", "X"), &filter));
        assert!(!engine.included(&campaign("2025-07-01", "P3", "X"), &filter));
        assert!(!engine.included(&campaign("2025-07-01", "P1", "Y"), &filter));
    }

    #[test]
    fn inclusion_is_repeatable() {
        let engine = FilterEngine::default();
        let filter = Filter::default().with_products(["P1"]);
        let record = campaign("2025-07-01", "P1", "X");

        let first = engine.included(&record, &filter);
        let second = engine.included(&record, &filter);
        assert_eq!(first, second);
    }

    #[test]
    fn monthly_reshape_names_months_and_drops_invalid() {
        let records = vec![
            MonthlyRecord {
                month: "2025-07".to_string(),
                sent: 100,
                delivered: 90,
                cost: 12.5,
            },
            MonthlyRecord {
                month: "July".to_string(),
                sent: 1,
                delivered: 1,
                cost: 0.0,
            },
            MonthlyRecord {
                month: "2025-08".to_string(),
                sent: 50,
                delivered: 45,
                cost: 3.0,
            },
        ];

        let points = reshape_monthly(&records);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].month, "July");
        assert_eq!(points[0].month_key, "2025-07");
        assert_eq!(points[0].period, day("2025-07-01"));
        assert_eq!(points[1].month, "August");
    }
}
