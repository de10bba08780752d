//! fadi CLI - Mirror and inspect the FadiTools product catalog
//!
//! Reads WooCommerce credentials from the environment (or a `.env` file),
//! syncs the catalog, and exports the static snapshot documents.

mod cli;
mod commands;
mod error;


use clap::Parser;
use fadi_core::CatalogConfig;

use crate::cli::{Cli, Commands};
use crate::commands::common::CatalogContext;
use crate::commands::export::run_export;
use crate::commands::list::{build_filter, run_list, ListOptions};
use crate::commands::show::run_show;
use crate::commands::stats::run_stats;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["fadi_core=info", "fadi_cli=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let context = CatalogContext::new(CatalogConfig::from_env()?, cli.snapshot_dir);

    match cli.command {
        Commands::Sync { json } => run_sync(&context, json).await?,
        Commands::List {
            category,
            on_sale,
            featured,
            in_stock,
            search,
            limit,
            from_file,
            json,
        } => {
            let options = ListOptions {
                filter: build_filter(category, on_sale, featured, in_stock, search),
                limit,
                from_file,
                as_json: json,
            };
            run_list(&context, options).await?;
        }
        Commands::Show {
            slug,
            from_file,
            json,
        } => run_show(&context, &slug, from_file, json).await?,
        Commands::Export { output_dir } => run_export(&context, output_dir.as_deref()).await?,
        Commands::Stats { from_file, json } => run_stats(&context, from_file, json).await?,
    }

    Ok(())
}
