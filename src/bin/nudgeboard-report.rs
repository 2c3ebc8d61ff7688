use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use nudgeboard::config::Config;
use nudgeboard::dataset::{DataService, LogReporter};
use nudgeboard::models::{DateRange, Dimension, Filter};
use nudgeboard::pipeline::{
    alerts, by_campaign, by_dimension, by_nudge_bucket, reshape_monthly, sort_in_place,
    AlertCondition, AlertMetric, AlertRule, CampaignSortKey, FilterEngine, FunnelSortKey,
    SortDirection,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nudgeboard-report")]
#[command(about = "Print nudge campaign reports from the configured datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD); requires --from
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
    /// Restrict to a product; repeatable
    #[arg(long = "product")]
    products: Vec<String>,
    /// Restrict to a project; repeatable
    #[arg(long = "project")]
    projects: Vec<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Filter {
        let filter = Filter::default()
            .with_products(self.products.iter().cloned())
            .with_projects(self.projects.iter().cloned());

        match self.from {
            Some(from) => filter.with_date_range(DateRange {
                from: Some(from),
                to: self.to,
            }),
            None => filter,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupBy {
    Product,
    Project,
}

#[derive(Clone, Copy, ValueEnum)]
enum FunnelColumn {
    Name,
    Sent,
    Delivered,
    Rate,
}

#[derive(Clone, Copy, ValueEnum)]
enum CampaignColumn {
    Name,
    Product,
    Project,
    Sent,
    Delivered,
    Clicks,
    Cost,
    DeliveryRate,
    ClickRate,
}

#[derive(Clone, Copy, ValueEnum)]
enum Metric {
    DeliveryRate,
    Cost,
    SentCount,
}

#[derive(Subcommand)]
enum Commands {
    /// List distinct products and projects
    Dimensions,
    /// Monthly sent, delivered and cost totals
    Monthly,
    /// Delivery funnel per product or project
    Funnel {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value = "product")]
        by: GroupBy,
        #[arg(long, value_enum, default_value = "name")]
        sort: FunnelColumn,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Per-campaign performance
    Campaigns {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value = "name")]
        sort: CampaignColumn,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// User activity by nudges received
    Nudges {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Products crossing a threshold
    Alerts {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum)]
        metric: Metric,
        /// Trigger when the value is below the threshold instead of above it
        #[arg(long)]
        below: bool,
        #[arg(long)]
        threshold: f64,
    },
}

fn direction(desc: bool) -> SortDirection {
    if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let data = DataService::new(
        config.data.build_source()?,
        config.data.paths(),
        Arc::new(LogReporter),
    );
    let snapshot = data.load().await;
    let engine = FilterEngine::new(config.data.open_end);

    match cli.command {
        Commands::Dimensions => {
            println!("Products:");
            for product in &snapshot.distinct_products {
                println!("  {}", product);
            }
            println!("Projects:");
            for project in &snapshot.distinct_projects {
                println!("  {}", project);
            }
        }
        Commands::Monthly => {
            println!("{:<10} {:<12} {:>12} {:>12} {:>12}", "Key", "Month", "Sent", "Delivered", "Cost");
            println!("{}", "-".repeat(62));
            for point in reshape_monthly(&snapshot.monthly) {
                println!(
                    "{:<10} {:<12} {:>12} {:>12} {:>12.2}",
                    point.month_key, point.month, point.sent, point.delivered, point.cost
                );
            }
        }
        Commands::Funnel {
            filter,
            by,
            sort,
            desc,
        } => {
            let dimension = match by {
                GroupBy::Product => Dimension::Product,
                GroupBy::Project => Dimension::Project,
            };
            let key = match sort {
                FunnelColumn::Name => FunnelSortKey::Name,
                FunnelColumn::Sent => FunnelSortKey::Sent,
                FunnelColumn::Delivered => FunnelSortKey::Delivered,
                FunnelColumn::Rate => FunnelSortKey::Rate,
            };

            let view = engine.apply(&snapshot, &filter.to_filter());
            let mut rows = by_dimension(view.campaign.iter().copied(), dimension);
            sort_in_place(&mut rows, key, direction(desc));

            println!("{:<30} {:>12} {:>12} {:>8}", dimension.label(), "Sent", "Delivered", "Rate");
            println!("{}", "-".repeat(65));
            for row in rows {
                println!(
                    "{:<30} {:>12} {:>12} {:>7.1}%",
                    row.name,
                    row.sent,
                    row.delivered,
                    row.rate() * 100.0
                );
            }
        }
        Commands::Campaigns { filter, sort, desc } => {
            let key = match sort {
                CampaignColumn::Name => CampaignSortKey::CampaignName,
                CampaignColumn::Product => CampaignSortKey::Product,
                CampaignColumn::Project => CampaignSortKey::Project,
                CampaignColumn::Sent => CampaignSortKey::Sent,
                CampaignColumn::Delivered => CampaignSortKey::Delivered,
                CampaignColumn::Clicks => CampaignSortKey::Clicks,
                CampaignColumn::Cost => CampaignSortKey::Cost,
                CampaignColumn::DeliveryRate => CampaignSortKey::DeliveryRate,
                CampaignColumn::ClickRate => CampaignSortKey::ClickRate,
            };

            let view = engine.apply(&snapshot, &filter.to_filter());
            let mut rows = by_campaign(view.campaign.iter().copied());
            sort_in_place(&mut rows, key, direction(desc));

            println!(
                "{:<30} {:<15} {:<15} {:>10} {:>10} {:>8} {:>10} {:>8} {:>8}",
                "Campaign", "Product", "Project", "Sent", "Delivered", "Clicks", "Cost", "Deliv%", "Click%"
            );
            println!("{}", "-".repeat(122));
            for row in rows {
                println!(
                    "{:<30} {:<15} {:<15} {:>10} {:>10} {:>8} {:>10.2} {:>7.1}% {:>7.1}%",
                    row.campaign_name,
                    row.product,
                    row.project,
                    row.sent,
                    row.delivered,
                    row.clicks,
                    row.cost,
                    row.delivery_rate() * 100.0,
                    row.click_rate() * 100.0
                );
            }
        }
        Commands::Nudges { filter } => {
            let view = engine.apply(&snapshot, &filter.to_filter());

            println!("{:<8} {:>10} {:>10} {:>15}", "Nudges", "Inactive", "Active", "Highly active");
            println!("{}", "-".repeat(46));
            for row in by_nudge_bucket(view.activity.iter().copied()) {
                println!(
                    "{:<8} {:>10} {:>10} {:>15}",
                    row.bucket.label(),
                    row.inactive,
                    row.active,
                    row.highly_active
                );
            }
        }
        Commands::Alerts {
            filter,
            metric,
            below,
            threshold,
        } => {
            let rule = AlertRule {
                metric: match metric {
                    Metric::DeliveryRate => AlertMetric::DeliveryRate,
                    Metric::Cost => AlertMetric::Cost,
                    Metric::SentCount => AlertMetric::SentCount,
                },
                condition: if below {
                    AlertCondition::Below
                } else {
                    AlertCondition::Above
                },
                threshold,
                message: None,
            };

            let view = engine.apply(&snapshot, &filter.to_filter());
            let triggered = alerts::evaluate(&rule, view.campaign.iter().copied());
            if triggered.is_empty() {
                println!("No products crossed the threshold.");
            } else {
                for alert in triggered {
                    println!("⚠ {}", alert.message);
                }
            }
        }
    }

    Ok(())
}
