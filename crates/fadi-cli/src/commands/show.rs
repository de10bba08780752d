use crate::commands::common::{
    find_product, format_price, load_catalog, product_to_detail, CatalogContext, ProductDetail,
};
use crate::error::CliError;

const RELATED_LIMIT: usize = 4;

pub async fn run_show(
    context: &CatalogContext,
    slug: &str,
    from_file: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let service = context.service()?;
    let files = context.files().ok();
    let snapshot = load_catalog(files.as_ref(), &service, from_file).await?;

    let entry = find_product(&snapshot, &service, slug).await?;
    let related = snapshot.related(&entry, RELATED_LIMIT);
    let detail = product_to_detail(&entry, &related);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        for line in format_product_detail(&detail, &format_price(&entry)) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_product_detail(detail: &ProductDetail, price: &str) -> Vec<String> {
    let item = &detail.item;
    let mut lines = vec![
        format!("{} (#{})", item.name, item.id),
        format!("  slug:     {}", item.slug),
        format!("  price:    {price}"),
        format!("  stock:    {}", item.stock_status),
    ];
    if let Some(discount) = detail.discount_percent {
        lines.push(format!("  discount: {discount}%"));
    }
    if let Some(sku) = detail.sku.as_deref() {
        lines.push(format!("  sku:      {sku}"));
    }
    if !item.categories.is_empty() {
        lines.push(format!("  category: {}", item.categories.join(", ")));
    }
    if let Some(link) = item.link.as_deref() {
        lines.push(format!("  link:     {link}"));
    }
    if !detail.summary.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {}", detail.summary));
    }
    if !detail.related.is_empty() {
        lines.push(String::new());
        lines.push("  Related:".to_string());
        lines.extend(
            detail
                .related
                .iter()
                .map(|related| format!("    {} ({})", related.name, related.slug)),
        );
    }
    lines
}
