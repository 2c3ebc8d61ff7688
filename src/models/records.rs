use serde::{Deserialize, Deserializer, Serialize};

/// One day of activity for one campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecord {
    /// ISO-8601 calendar date, kept raw so unparseable dates can be excluded at filter time
    pub date: String,
    pub product: String,
    pub project: String,
    #[serde(rename = "campaignName", default)]
    pub campaign_name: String,
    pub sent: u64,
    pub delivered: u64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Inactive,
    Active,
    HighlyActive,
}

/// A user-activity snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub date: String,
    pub product: String,
    pub project: String,
    pub activity_level: ActivityLevel,
    pub nudges_sent: u64,
}

/// Pre-aggregated totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// `YYYY-MM`
    pub month: String,
    pub sent: u64,
    pub delivered: u64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub cost: f64,
}

/// Records that carry a date and the two filterable dimensions
pub trait Scoped {
    fn date(&self) -> &str;
    fn product(&self) -> &str;
    fn project(&self) -> &str;
}

impl Scoped for CampaignRecord {
    fn date(&self) -> &str {
        &self.date
    }

    fn product(&self) -> &str {
        &self.product
    }

    fn project(&self) -> &str {
        &self.project
    }
}

impl Scoped for ActivityRecord {
    fn date(&self) -> &str {
        &self.date
    }

    fn product(&self) -> &str {
        &self.product
    }

    fn project(&self) -> &str {
        &self.project
    }
}

/// Optional numeric fields may be absent or explicitly `null`; both mean zero.
fn zero_if_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_record_defaults_optional_numbers() {
        let record: CampaignRecord = serde_json::from_str(
            r#"{"date":"2025-07-01","product":"P1","project":"X","campaignName":"C1","sent":10,"delivered":8,"clicks":null}"#,
        )
        .unwrap();

        assert_eq!(record.clicks, 0);
        assert_eq!(record.cost, 0.0);
        assert_eq!(record.campaign_name, "C1");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let record: ActivityRecord = serde_json::from_str(
            r#"{"date":"2025-07-01","product":"P1","project":"X","activity_level":"highly_active","nudges_sent":4,"user_id":"u-1"}"#,
        )
        .unwrap();

        assert_eq!(record.activity_level, ActivityLevel::HighlyActive);
        assert_eq!(record.nudges_sent, 4);
    }

    #[test]
    fn unknown_activity_level_is_rejected() {
        let result: Result<ActivityRecord, _> = serde_json::from_str(
            r#"{"date":"2025-07-01","product":"P1","project":"X","activity_level":"dormant","nudges_sent":4}"#,
        );
        assert!(result.is_err());
    }
}
