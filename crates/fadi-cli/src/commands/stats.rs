use chrono::{DateTime, Utc};
use fadi_core::models::SnapshotSummary;
use serde::Serialize;

use crate::commands::common::{load_catalog, CatalogContext};
use crate::error::CliError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    #[serde(flatten)]
    pub summary: SnapshotSummary,
    pub last_updated: DateTime<Utc>,
}

pub async fn run_stats(
    context: &CatalogContext,
    from_file: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let service = context.service()?;
    let files = context.files().ok();
    let snapshot = load_catalog(files.as_ref(), &service, from_file).await?;
    let report = StatsReport {
        summary: snapshot.summary(),
        last_updated: snapshot.last_fetch_time(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_stats(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_stats(report: &StatsReport) -> Vec<String> {
    let summary = &report.summary;
    vec![
        format!("Products:     {}", summary.total_products),
        format!("Featured:     {}", summary.featured_count),
        format!("On sale:      {}", summary.on_sale_count),
        format!(
            "Stock:        {} in stock, {} out of stock, {} on backorder",
            summary.in_stock_count, summary.out_of_stock_count, summary.on_backorder_count
        ),
        format!("Categories:   {}", summary.category_count),
        format!(
            "Last updated: {}",
            report.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    ]
}
