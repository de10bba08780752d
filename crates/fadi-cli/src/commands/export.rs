use std::path::Path;

use chrono::Utc;
use fadi_core::snapshot_file::write_snapshot_files;

use crate::commands::common::CatalogContext;
use crate::error::CliError;

/// Fetch the whole catalog from the store and write both snapshot documents.
///
/// Refuses to run without store credentials so an existing export is never
/// replaced by an empty catalog.
pub async fn run_export(context: &CatalogContext, output_dir: Option<&Path>) -> Result<(), CliError> {
    if !context.config.is_configured() {
        return Err(CliError::StoreNotConfigured);
    }

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => context.files()?.dir().to_path_buf(),
    };

    let service = context.service()?;
    let snapshot = service.force_refresh().await?;
    let written = write_snapshot_files(&dir, &snapshot, Utc::now())?;

    println!("{} products", snapshot.total_count());
    println!("{}", written.products.display());
    println!("{}", written.metadata.display());
    Ok(())
}
