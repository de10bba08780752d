use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fadi")]
#[command(about = "Mirror and inspect the FadiTools product catalog")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding exported snapshot files (overrides CATALOG_SNAPSHOT_DIR)
    #[arg(long, global = true, value_name = "PATH")]
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one sync cycle against the store and report what happened
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List catalog products
    #[command(alias = "ls")]
    List {
        /// Category slug or numeric id
        #[arg(long)]
        category: Option<String>,
        /// Only products currently on sale
        #[arg(long)]
        on_sale: bool,
        /// Only featured products
        #[arg(long)]
        featured: bool,
        /// Only products in stock
        #[arg(long)]
        in_stock: bool,
        /// Case-insensitive text search
        #[arg(long)]
        search: Option<String>,
        /// Number of products to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Read the exported snapshot instead of the live store
        #[arg(long)]
        from_file: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one product by slug
    Show {
        /// Product slug
        slug: String,
        /// Read the exported snapshot instead of the live store
        #[arg(long)]
        from_file: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch the full catalog and write the static snapshot documents
    Export {
        /// Target directory (defaults to the snapshot directory)
        #[arg(short, long, value_name = "PATH")]
        output_dir: Option<PathBuf>,
    },
    /// Catalog summary counts
    Stats {
        /// Read the exported snapshot instead of the live store
        #[arg(long)]
        from_file: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
