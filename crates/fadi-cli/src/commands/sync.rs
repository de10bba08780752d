use fadi_core::models::SnapshotSummary;
use fadi_core::{CacheStats, RefreshOutcome};
use serde::Serialize;

use crate::commands::common::CatalogContext;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub outcome: RefreshOutcome,
    pub stats: CacheStats,
    pub summary: SnapshotSummary,
}

pub async fn run_sync(context: &CatalogContext, as_json: bool) -> Result<(), CliError> {
    let service = context.service()?;
    let (snapshot, outcome) = service.get_catalog_with_outcome().await?;
    let report = SyncReport {
        outcome,
        stats: service.stats(),
        summary: snapshot.summary(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_sync_report(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    let mut lines = vec![format!("Sync: {}", report.outcome)];
    if let Some(fetched_at) = report.stats.last_fetch_time {
        lines.push(format!(
            "Cached {} products (ids {}..={}), fetched {}",
            report.stats.entry_count,
            report.stats.min_id.unwrap_or_default(),
            report.stats.max_id.unwrap_or_default(),
            fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    lines.push(format!(
        "{} featured, {} on sale, {} in stock",
        report.summary.featured_count, report.summary.on_sale_count, report.summary.in_stock_count
    ));
    lines
}
