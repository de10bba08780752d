//! WooCommerce product JSON schema and conversion into [`CatalogEntry`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::models::{
    CatalogEntry, MetaEntry, ProductCategory, ProductImage, ProductKind, StockStatus,
};
use crate::util::normalize_text_option;
use crate::{Error, Result};

const WOO_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Deserialize)]
struct RawProduct {
    id: u64,
    name: String,
    slug: String,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    short_description: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    regular_price: Option<String>,
    #[serde(default)]
    sale_price: Option<String>,
    #[serde(default)]
    on_sale: bool,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    stock_status: Option<String>,
    #[serde(default)]
    stock_quantity: Option<i64>,
    #[serde(default)]
    images: Vec<RawImage>,
    #[serde(default)]
    categories: Vec<RawTerm>,
    #[serde(default)]
    tags: Vec<RawTerm>,
    #[serde(default)]
    date_created: Option<String>,
    #[serde(default)]
    date_created_gmt: Option<String>,
    #[serde(default)]
    date_modified: Option<String>,
    #[serde(default)]
    date_modified_gmt: Option<String>,
    #[serde(default)]
    meta_data: Vec<RawMeta>,
    #[serde(default)]
    external_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    #[serde(default)]
    id: u64,
    src: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    alt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTerm {
    id: u64,
    name: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    key: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Parse a WooCommerce `/products` response body.
///
/// The body must be a JSON array of product objects. Every product needs an
/// id, name, slug, creation date and modification date; one malformed product
/// rejects the whole page.
pub fn parse_products(body: &str) -> Result<Vec<CatalogEntry>> {
    let raw = serde_json::from_str::<Vec<RawProduct>>(body)
        .map_err(|error| Error::InvalidPayload(format!("product list: {error}")))?;
    raw.into_iter().map(CatalogEntry::try_from).collect()
}

impl TryFrom<RawProduct> for CatalogEntry {
    type Error = Error;

    fn try_from(raw: RawProduct) -> Result<Self> {
        let id = raw.id;
        let slug = normalize_text_option(Some(raw.slug))
            .ok_or_else(|| Error::InvalidPayload(format!("product {id} has an empty slug")))?;

        let date_created = parse_product_date(
            id,
            "date_created",
            raw.date_created_gmt.as_deref(),
            raw.date_created.as_deref(),
        )?;
        let date_modified = parse_product_date(
            id,
            "date_modified",
            raw.date_modified_gmt.as_deref(),
            raw.date_modified.as_deref(),
        )?;

        Ok(Self {
            id,
            name: raw.name.trim().to_string(),
            slug,
            permalink: normalize_text_option(raw.permalink),
            sku: normalize_text_option(raw.sku),
            kind: parse_kind(raw.kind.as_deref()),
            description: raw.description.unwrap_or_default(),
            short_description: raw.short_description.unwrap_or_default(),
            price: normalize_text_option(raw.price),
            regular_price: normalize_text_option(raw.regular_price),
            sale_price: normalize_text_option(raw.sale_price),
            on_sale: raw.on_sale,
            featured: raw.featured,
            stock_status: parse_stock_status(id, raw.stock_status.as_deref())?,
            stock_quantity: raw.stock_quantity,
            images: raw
                .images
                .into_iter()
                .filter(|image| !image.src.trim().is_empty())
                .map(|image| ProductImage {
                    id: image.id,
                    src: image.src.trim().to_string(),
                    name: image.name.unwrap_or_default(),
                    alt: image.alt.unwrap_or_default(),
                })
                .collect(),
            categories: raw.categories.into_iter().map(RawTerm::into_category).collect(),
            tags: raw.tags.into_iter().map(RawTerm::into_category).collect(),
            date_created,
            date_modified,
            meta_data: raw
                .meta_data
                .into_iter()
                .map(|meta| MetaEntry {
                    key: meta.key,
                    value: meta.value,
                })
                .collect(),
            external_url: normalize_text_option(raw.external_url),
        })
    }
}

impl RawTerm {
    fn into_category(self) -> ProductCategory {
        ProductCategory {
            id: self.id,
            name: self.name,
            slug: self.slug,
        }
    }
}

/// Prefer the GMT variant; WooCommerce omits the offset on both.
fn parse_product_date(
    id: u64,
    field: &str,
    gmt: Option<&str>,
    local: Option<&str>,
) -> Result<DateTime<Utc>> {
    let raw = gmt
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| local.map(str::trim).filter(|value| !value.is_empty()))
        .ok_or_else(|| Error::InvalidPayload(format!("product {id} is missing {field}")))?;

    parse_instant(raw).ok_or_else(|| {
        Error::InvalidPayload(format!("product {id} has unparsable {field}: {raw}"))
    })
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, WOO_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_stock_status(id: u64, raw: Option<&str>) -> Result<StockStatus> {
    match raw.map(str::trim) {
        None | Some("instock") => Ok(StockStatus::InStock),
        Some("outofstock") => Ok(StockStatus::OutOfStock),
        Some("onbackorder") => Ok(StockStatus::OnBackorder),
        Some(other) => Err(Error::InvalidPayload(format!(
            "product {id} has unknown stock_status '{other}'"
        ))),
    }
}

fn parse_kind(raw: Option<&str>) -> ProductKind {
    match raw.map(str::trim) {
        None | Some("simple") => ProductKind::Simple,
        Some("variable") => ProductKind::Variable,
        Some("grouped") => ProductKind::Grouped,
        Some("external") => ProductKind::External,
        Some(_) => ProductKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const PRODUCT_JSON: &str = r#"
    [
      {
        "id": 812,
        "name": " Makita DHP482 Combi Drill ",
        "slug": "makita-dhp482",
        "permalink": "https://faditools.example/product/makita-dhp482/",
        "type": "external",
        "sku": "",
        "description": "<p>18V LXT</p>",
        "short_description": "<p>Compact <b>combi</b></p>",
        "price": "89.99",
        "regular_price": "119.99",
        "sale_price": "89.99",
        "on_sale": true,
        "featured": true,
        "stock_status": "onbackorder",
        "stock_quantity": null,
        "images": [
          {"id": 5, "src": "https://cdn.example/drill.jpg", "name": "drill", "alt": "Drill"},
          {"id": 6, "src": "  ", "name": "broken", "alt": ""}
        ],
        "categories": [{"id": 15, "name": "Power Tools", "slug": "power-tools"}],
        "tags": [],
        "date_created": "2024-02-10T12:00:00",
        "date_created_gmt": "2024-02-10T10:00:00",
        "date_modified": "2024-03-01T08:15:00",
        "date_modified_gmt": "2024-03-01T06:15:00",
        "meta_data": [{"id": 1, "key": "affiliate_url", "value": "https://amzn.example/dhp482"}],
        "external_url": "https://shop.example/dhp482",
        "average_rating": "4.50"
      }
    ]
    "#;

    #[test]
    fn parse_products_maps_woocommerce_fields() {
        let products = parse_products(PRODUCT_JSON).unwrap();
        assert_eq!(products.len(), 1);

        let product = &products[0];
        assert_eq!(product.id, 812);
        assert_eq!(product.name, "Makita DHP482 Combi Drill");
        assert_eq!(product.kind, ProductKind::External);
        assert_eq!(product.sku, None);
        assert_eq!(product.price.as_deref(), Some("89.99"));
        assert_eq!(product.stock_status, StockStatus::OnBackorder);
        assert_eq!(product.images.len(), 1);
        assert_eq!(
            product.primary_image().map(|image| image.src.as_str()),
            Some("https://cdn.example/drill.jpg")
        );
        assert_eq!(product.categories[0].slug, "power-tools");
        assert_eq!(
            product.date_created,
            Utc.with_ymd_and_hms(2024, 2, 10, 10, 0, 0).unwrap()
        );
        assert_eq!(
            product.date_modified,
            Utc.with_ymd_and_hms(2024, 3, 1, 6, 15, 0).unwrap()
        );
        assert_eq!(product.affiliate_url(), Some("https://amzn.example/dhp482"));
        assert_eq!(product.discount_percent(), Some(25));
    }

    #[test]
    fn parse_products_falls_back_to_local_dates() {
        let body = r#"[{"id": 1, "name": "A", "slug": "a",
            "date_created": "2024-01-01T00:00:00",
            "date_modified": "2024-01-02T00:00:00Z"}]"#;
        let products = parse_products(body).unwrap();
        assert_eq!(
            products[0].date_created,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(products[0].stock_status, StockStatus::InStock);
    }

    #[test]
    fn parse_products_rejects_missing_dates() {
        let body = r#"[{"id": 3, "name": "A", "slug": "a", "date_created_gmt": "2024-01-01T00:00:00"}]"#;
        let error = parse_products(body).unwrap_err();
        match error {
            Error::InvalidPayload(message) => {
                assert!(message.contains("product 3"));
                assert!(message.contains("date_modified"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_products_rejects_unknown_stock_status() {
        let body = r#"[{"id": 4, "name": "A", "slug": "a", "stock_status": "discontinued",
            "date_created_gmt": "2024-01-01T00:00:00", "date_modified_gmt": "2024-01-01T00:00:00"}]"#;
        assert!(matches!(
            parse_products(body),
            Err(Error::InvalidPayload(message)) if message.contains("discontinued")
        ));
    }

    #[test]
    fn parse_products_rejects_non_array_bodies() {
        assert!(matches!(
            parse_products(r#"{"code": "rest_no_route"}"#),
            Err(Error::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_products(r#"[{"id": "abc"}]"#),
            Err(Error::InvalidPayload(_))
        ));
    }

    #[test]
    fn parse_products_accepts_empty_page() {
        assert!(parse_products("[]").unwrap().is_empty());
    }
}
