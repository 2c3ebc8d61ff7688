use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive calendar-day window. `to` may be open; see [`OpenEndPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn starting(from: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }
}

/// Filter state supplied by the dashboard on every interaction.
///
/// Empty `products` / `projects` lists mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
}

impl Filter {
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = products.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projects = projects.into_iter().map(Into::into).collect();
        self
    }
}

/// How a date range with a `from` but no `to` is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenEndPolicy {
    /// The range covers the single day `from`.
    #[default]
    SingleDay,
    /// The range runs through the current UTC day.
    ThroughToday,
}

impl fmt::Display for OpenEndPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenEndPolicy::SingleDay => f.write_str("single_day"),
            OpenEndPolicy::ThroughToday => f.write_str("through_today"),
        }
    }
}

/// Campaign dimension used for selector options and funnel grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Product,
    Project,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Product => "Product",
            Dimension::Project => "Project",
        }
    }
}
