//! Column sorting for dashboard tables.
//!
//! Sorting never mutates its input and is stable, so rows with equal keys keep their
//! relative order across re-sorts. Derived metrics (rates) are computed per comparison
//! through [`safe_ratio`](crate::pipeline::ratio::safe_ratio).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{AggregatedRow, CampaignSummaryRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Comparable value of one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Text(&'a str),
    Number(f64),
}

/// Rows that can be ordered by a named column
pub trait Sortable {
    type Key: Copy + PartialEq;

    fn sort_value(&self, key: Self::Key) -> SortValue<'_>;
}

/// Current column and direction of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K: Copy + PartialEq> SortState<K> {
    pub fn ascending(key: K) -> Self {
        Self {
            key,
            direction: SortDirection::Asc,
        }
    }

    /// Next state after the user picks `key`: the same column flips direction,
    /// a different column starts ascending.
    pub fn request(current: Option<Self>, key: K) -> Self {
        match current {
            Some(state) if state.key == key => Self {
                key,
                direction: state.direction.flipped(),
            },
            _ => Self::ascending(key),
        }
    }
}

/// Return a sorted copy of `rows`
pub fn sorted<T>(rows: &[T], key: T::Key, direction: SortDirection) -> Vec<T>
where
    T: Sortable + Clone,
{
    let mut out = rows.to_vec();
    sort_in_place(&mut out, key, direction);
    out
}

/// Sort an owned vector, e.g. freshly aggregated rows
pub fn sort_in_place<T: Sortable>(rows: &mut [T], key: T::Key, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ordering = compare_values(a.sort_value(key), b.sort_value(key));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_values(a: SortValue<'_>, b: SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Text(a), SortValue::Text(b)) => collate(a, b),
        (SortValue::Number(a), SortValue::Number(b)) => zero_nan(a).total_cmp(&zero_nan(b)),
        // a column is homogeneous; mixed values only appear if a key is misdeclared
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
    }
}

/// Case-insensitive ordering with a byte-order tie-break
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn zero_nan(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

/// Columns of the product / project funnel table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FunnelSortKey {
    #[default]
    Name,
    Sent,
    Delivered,
    Rate,
}

impl Sortable for AggregatedRow {
    type Key = FunnelSortKey;

    fn sort_value(&self, key: FunnelSortKey) -> SortValue<'_> {
        match key {
            FunnelSortKey::Name => SortValue::Text(&self.name),
            FunnelSortKey::Sent => SortValue::Number(self.sent as f64),
            FunnelSortKey::Delivered => SortValue::Number(self.delivered as f64),
            FunnelSortKey::Rate => SortValue::Number(self.rate()),
        }
    }
}

/// Columns of the campaign performance table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CampaignSortKey {
    #[default]
    CampaignName,
    Product,
    Project,
    Sent,
    Delivered,
    Clicks,
    Cost,
    DeliveryRate,
    ClickRate,
}

impl Sortable for CampaignSummaryRow {
    type Key = CampaignSortKey;

    fn sort_value(&self, key: CampaignSortKey) -> SortValue<'_> {
        match key {
            CampaignSortKey::CampaignName => SortValue::Text(&self.campaign_name),
            CampaignSortKey::Product => SortValue::Text(&self.product),
            CampaignSortKey::Project => SortValue::Text(&self.project),
            CampaignSortKey::Sent => SortValue::Number(self.sent as f64),
            CampaignSortKey::Delivered => SortValue::Number(self.delivered as f64),
            CampaignSortKey::Clicks => SortValue::Number(self.clicks as f64),
            CampaignSortKey::Cost => SortValue::Number(self.cost),
            CampaignSortKey::DeliveryRate => SortValue::Number(self.delivery_rate()),
            CampaignSortKey::ClickRate => SortValue::Number(self.click_rate()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, sent: u64, delivered: u64) -> AggregatedRow {
        AggregatedRow {
            name: name.to_string(),
            sent,
            delivered,
        }
    }

    fn campaign(name: &str, sent: u64, delivered: u64, clicks: u64) -> CampaignSummaryRow {
        CampaignSummaryRow {
            campaign_name: name.to_string(),
            product: "P1".to_string(),
            project: "X".to_string(),
            sent,
            delivered,
            clicks,
            cost: 0.0,
        }
    }

    #[test]
    fn equal_keys_keep_original_order() {
        let rows = vec![row("a", 5, 0), row("b", 5, 0)];

        let asc = sorted(&rows, FunnelSortKey::Sent, SortDirection::Asc);
        assert_eq!(asc[0].name, "a");
        assert_eq!(asc[1].name, "b");

        let desc = sorted(&rows, FunnelSortKey::Sent, SortDirection::Desc);
        assert_eq!(desc[0].name, "a");
        assert_eq!(desc[1].name, "b");
    }

    #[test]
    fn input_is_not_mutated() {
        let rows = vec![row("b", 1, 1), row("a", 2, 2)];
        let _ = sorted(&rows, FunnelSortKey::Name, SortDirection::Asc);
        assert_eq!(rows[0].name, "b");
    }

    #[test]
    fn text_sorting_ignores_case() {
        let rows = vec![row("beta", 0, 0), row("Alpha", 0, 0), row("alpha", 0, 0)];

        let names: Vec<String> = sorted(&rows, FunnelSortKey::Name, SortDirection::Asc)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta"]);
    }

    #[test]
    fn rate_is_derived_with_zero_guard() {
        let rows = vec![row("half", 10, 5), row("none", 0, 0), row("full", 4, 4)];

        let names: Vec<String> = sorted(&rows, FunnelSortKey::Rate, SortDirection::Desc)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["full", "half", "none"]);
    }

    #[test]
    fn click_rate_sorts_zero_delivered_as_zero() {
        let rows = vec![campaign("a", 10, 10, 5), campaign("b", 10, 0, 3), campaign("c", 10, 10, 1)];

        let names: Vec<String> = sorted(&rows, CampaignSortKey::ClickRate, SortDirection::Asc)
            .into_iter()
            .map(|r| r.campaign_name)
            .collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn repeating_a_key_toggles_direction() {
        let first = SortState::request(None, CampaignSortKey::CampaignName);
        assert_eq!(first.direction, SortDirection::Asc);

        let second = SortState::request(Some(first), CampaignSortKey::CampaignName);
        assert_eq!(second.direction, SortDirection::Desc);

        let third = SortState::request(Some(second), CampaignSortKey::CampaignName);
        assert_eq!(third.direction, SortDirection::Asc);
    }

    #[test]
    fn new_key_resets_to_ascending() {
        let state = SortState {
            key: CampaignSortKey::Cost,
            direction: SortDirection::Desc,
        };
        let next = SortState::request(Some(state), CampaignSortKey::Sent);
        assert_eq!(next, SortState::ascending(CampaignSortKey::Sent));
    }

    #[test]
    fn toggled_state_sorts_descending() {
        let rows = vec![campaign("a", 1, 1, 0), campaign("c", 1, 1, 0), campaign("b", 1, 1, 0)];

        let state = SortState::request(None, CampaignSortKey::CampaignName);
        let state = SortState::request(Some(state), CampaignSortKey::CampaignName);
        let names: Vec<String> = sorted(&rows, state.key, state.direction)
            .into_iter()
            .map(|r| r.campaign_name)
            .collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }
}
