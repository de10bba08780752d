use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fadi_core::models::{CategoryCount, SnapshotSummary};
use fadi_core::util::normalize_slug;
use fadi_core::{
    CacheState, CacheStats, CatalogEntry, CatalogFilter, CatalogService, CatalogSource, Clock,
    SystemClock,
};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

const DEFAULT_PER_PAGE: usize = 24;
const MAX_PER_PAGE: usize = 100;
const RELATED_LIMIT: usize = 4;

pub struct AppState<S, C = SystemClock> {
    pub service: Arc<CatalogService<S, C>>,
    admin_token: Option<Arc<str>>,
}

impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            admin_token: self.admin_token.clone(),
        }
    }
}

impl<S, C> AppState<S, C> {
    pub fn new(service: Arc<CatalogService<S, C>>, admin_token: Option<String>) -> Self {
        Self {
            service,
            admin_token: admin_token.map(Arc::from),
        }
    }
}

pub fn app_router<S, C>(state: AppState<S, C>) -> Router
where
    S: CatalogSource + 'static,
    C: Clock + 'static,
{
    let admin_routes = Router::new()
        .route("/stats", get(cache_stats::<S, C>))
        .route("/refresh", post(refresh_cache::<S, C>))
        .route("/clear", post(clear_cache::<S, C>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin::<S, C>,
        ));

    let catalog_routes = Router::new()
        .route("/products", get(list_products::<S, C>))
        .route("/products/{slug}", get(show_product::<S, C>))
        .route("/categories", get(list_categories::<S, C>))
        .nest("/cache", admin_routes);

    Router::new()
        .route("/healthz", get(healthz::<S, C>))
        .nest("/v1", catalog_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    cache: CacheState,
    configured: bool,
}

async fn healthz<S: CatalogSource, C: Clock>(
    State(state): State<AppState<S, C>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        cache: state.service.state(),
        configured: state.service.source().is_configured(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ProductListQuery {
    category: Option<String>,
    on_sale: Option<bool>,
    featured: Option<bool>,
    in_stock: Option<bool>,
    search: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
}

impl ProductListQuery {
    fn filter(&self) -> CatalogFilter {
        CatalogFilter {
            category: fadi_core::util::normalize_text_option(self.category.clone()),
            on_sale: self.on_sale.unwrap_or(false),
            featured: self.featured.unwrap_or(false),
            in_stock: self.in_stock.unwrap_or(false),
            search: fadi_core::util::normalize_text_option(self.search.clone()),
        }
    }

    fn paging(&self) -> Result<(usize, usize), AppError> {
        let page = self.page.unwrap_or(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if page == 0 {
            return Err(AppError::bad_request("page must be >= 1"));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::bad_request(format!(
                "per_page must be in [1, {MAX_PER_PAGE}]"
            )));
        }
        Ok((page, per_page))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductPage {
    products: Vec<CatalogEntry>,
    total: usize,
    page: usize,
    per_page: usize,
    total_pages: usize,
    last_updated: DateTime<Utc>,
}

async fn list_products<S: CatalogSource, C: Clock>(
    State(state): State<AppState<S, C>>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductPage>, AppError> {
    let (page, per_page) = query.paging()?;
    let snapshot = state.service.get_catalog().await?;

    let matching = query.filter().apply(&snapshot);
    let total = matching.len();
    let products = matching
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .cloned()
        .collect();

    Ok(Json(ProductPage {
        products,
        total,
        page,
        per_page,
        total_pages: total.div_ceil(per_page),
        last_updated: snapshot.last_fetch_time(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductDetailResponse {
    product: CatalogEntry,
    related: Vec<CatalogEntry>,
}

async fn show_product<S: CatalogSource, C: Clock>(
    State(state): State<AppState<S, C>>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let slug = normalize_slug(&slug).ok_or_else(|| AppError::bad_request("empty product slug"))?;
    let snapshot = state.service.get_catalog().await?;
    let product = snapshot
        .by_slug(&slug)
        .ok_or_else(|| AppError::not_found(format!("no product with slug '{slug}'")))?;
    let related = snapshot
        .related(product, RELATED_LIMIT)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(ProductDetailResponse {
        product: product.clone(),
        related,
    }))
}

async fn list_categories<S: CatalogSource, C: Clock>(
    State(state): State<AppState<S, C>>,
) -> Result<Json<Vec<CategoryCount>>, AppError> {
    let snapshot = state.service.get_catalog().await?;
    Ok(Json(snapshot.categories()))
}

async fn require_admin<S: CatalogSource, C: Clock>(
    State(state): State<AppState<S, C>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state
        .admin_token
        .as_deref()
        .ok_or_else(|| AppError::Forbidden("cache maintenance is disabled".to_string()))?;
    let token = extract_bearer_token(request.headers())?;
    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        return Err(AppError::unauthorized("Invalid admin token"));
    }
    Ok(next.run(request).await)
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Authorization header is not valid UTF-8"))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AppError::unauthorized("Authorization header must be `Bearer <token>`"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::unauthorized(
            "Authorization scheme must be `Bearer`",
        ));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::unauthorized("Bearer token is empty"));
    }

    Ok(token)
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[derive(Debug, Serialize)]
struct CacheStatsResponse {
    state: CacheState,
    stats: CacheStats,
    summary: Option<SnapshotSummary>,
}

async fn cache_stats<S: CatalogSource, C: Clock>(
    State(state): State<AppState<S, C>>,
) -> Json<CacheStatsResponse> {
    let service = &state.service;
    Json(CacheStatsResponse {
        state: service.state(),
        stats: service.stats(),
        summary: service.store().snapshot().map(|snapshot| snapshot.summary()),
    })
}

async fn refresh_cache<S: CatalogSource, C: Clock>(
    State(state): State<AppState<S, C>>,
) -> Result<Json<CacheStats>, AppError> {
    let snapshot = state.service.force_refresh().await?;
    tracing::info!(
        endpoint = "cache_refresh",
        products = snapshot.total_count(),
        "Catalog cache rebuilt on request"
    );
    Ok(Json(state.service.stats()))
}

#[derive(Debug, Serialize)]
struct ClearResponse {
    cleared: bool,
}

async fn clear_cache<S: CatalogSource, C: Clock>(
    State(state): State<AppState<S, C>>,
) -> Json<ClearResponse> {
    Json(ClearResponse {
        cleared: state.service.clear_cache(),
    })
}
