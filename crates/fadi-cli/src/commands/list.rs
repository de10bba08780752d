use fadi_core::{CacheSnapshot, CatalogEntry, CatalogFilter};

use crate::commands::common::{
    format_product_lines, load_catalog, product_to_list_item, CatalogContext, ProductListItem,
};
use crate::error::CliError;

pub struct ListOptions {
    pub filter: CatalogFilter,
    pub limit: usize,
    pub from_file: bool,
    pub as_json: bool,
}

pub async fn run_list(context: &CatalogContext, options: ListOptions) -> Result<(), CliError> {
    let service = context.service()?;
    let files = context.files().ok();
    let snapshot = load_catalog(files.as_ref(), &service, options.from_file).await?;
    let products = select_products(&snapshot, &options.filter, options.limit);

    if options.as_json {
        let json_items = products
            .iter()
            .map(|entry| product_to_list_item(entry))
            .collect::<Vec<ProductListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if products.is_empty() {
        println!("No products match.");
    } else {
        for line in format_product_lines(&products) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn build_filter(
    category: Option<String>,
    on_sale: bool,
    featured: bool,
    in_stock: bool,
    search: Option<String>,
) -> CatalogFilter {
    CatalogFilter {
        category: fadi_core::util::normalize_text_option(category),
        on_sale,
        featured,
        in_stock,
        search: fadi_core::util::normalize_text_option(search),
    }
}

pub fn select_products<'a>(
    snapshot: &'a CacheSnapshot,
    filter: &CatalogFilter,
    limit: usize,
) -> Vec<&'a CatalogEntry> {
    let mut products = filter.apply(snapshot);
    products.truncate(limit);
    products
}
