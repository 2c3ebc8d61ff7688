//! Threshold alerts evaluated per product over filtered campaign records.
//!
//! Rules are evaluated on demand and never stored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::CampaignRecord;
use crate::pipeline::ratio::safe_ratio;

const DEFAULT_TEMPLATE: &str =
    "{metric} for {product} is {value}, which is {condition} the threshold of {threshold}.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMetric {
    /// Percentage of sent messages that were delivered
    DeliveryRate,
    Cost,
    SentCount,
}

impl AlertMetric {
    fn label(&self) -> &'static str {
        match self {
            AlertMetric::DeliveryRate => "Delivery rate",
            AlertMetric::Cost => "Cost",
            AlertMetric::SentCount => "Sent count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCondition {
    Below,
    Above,
}

impl AlertCondition {
    fn label(&self) -> &'static str {
        match self {
            AlertCondition::Below => "below",
            AlertCondition::Above => "above",
        }
    }

    fn triggered(&self, value: f64, threshold: f64) -> bool {
        match self {
            AlertCondition::Below => value < threshold,
            AlertCondition::Above => value > threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub metric: AlertMetric,
    pub condition: AlertCondition,
    pub threshold: f64,
    /// Template with `{product}`, `{value}` and `{threshold}` placeholders
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub product: String,
    pub metric: AlertMetric,
    pub value: f64,
    pub threshold: f64,
    pub message: String,
}

#[derive(Default)]
struct ProductTotals {
    sent: u64,
    delivered: u64,
    cost: f64,
}

impl ProductTotals {
    fn metric(&self, metric: AlertMetric) -> f64 {
        match metric {
            AlertMetric::DeliveryRate => {
                safe_ratio(self.delivered as f64, self.sent as f64) * 100.0
            }
            AlertMetric::Cost => self.cost,
            AlertMetric::SentCount => self.sent as f64,
        }
    }
}

/// Evaluate `rule` for every product present in `records`, in product order
pub fn evaluate<'a, I>(rule: &AlertRule, records: I) -> Vec<TriggeredAlert>
where
    I: IntoIterator<Item = &'a CampaignRecord>,
{
    let mut totals: BTreeMap<&'a str, ProductTotals> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(record.product.as_str()).or_default();
        entry.sent = entry.sent.saturating_add(record.sent);
        entry.delivered = entry.delivered.saturating_add(record.delivered);
        entry.cost += record.cost;
    }

    totals
        .into_iter()
        .filter_map(|(product, totals)| {
            let value = totals.metric(rule.metric);
            if !rule.condition.triggered(value, rule.threshold) {
                return None;
            }
            Some(TriggeredAlert {
                product: product.to_string(),
                metric: rule.metric,
                value,
                threshold: rule.threshold,
                message: render_message(rule, product, value),
            })
        })
        .collect()
}

/// Expand placeholders in one pass so substituted text is never re-expanded
fn render_message(rule: &AlertRule, product: &str, value: f64) -> String {
    let template = rule.message.as_deref().unwrap_or(DEFAULT_TEMPLATE);
    let mut out = String::with_capacity(template.len() + product.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        let Some(close) = tail.find('}') else {
            rest = tail;
            break;
        };
        let placeholder = &tail[1..close];
        match placeholder {
            "metric" => out.push_str(rule.metric.label()),
            "condition" => out.push_str(rule.condition.label()),
            "product" => out.push_str(product),
            "value" => out.push_str(&format_number(value)),
            "threshold" => out.push_str(&format_number(rule.threshold)),
            _ => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }

    // Whatever is left holds no complete placeholder
    out.push_str(rest);
    out
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
