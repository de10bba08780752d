//! Exercises the WooCommerce client against an in-process fake store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fadi_core::client::{AuthMode, Credentials, OrderBy, SortOrder};
use fadi_core::fetch::fetch_full_snapshot;
use fadi_core::{CatalogSource, Error, ProductQuery, WooCommerceClient};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[derive(Clone, Copy)]
enum Behaviour {
    Products(u64),
    Unauthorized,
    Garbage,
    Slow,
}

#[derive(Clone)]
struct FakeStore {
    behaviour: Behaviour,
    requests: Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>,
}

impl FakeStore {
    fn requests(&self) -> Vec<(HashMap<String, String>, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

fn product(id: u64) -> Value {
    json!({
        "id": id,
        "name": format!("Tool {id}"),
        "slug": format!("tool-{id}"),
        "type": "simple",
        "price": "19.99",
        "stock_status": "instock",
        "date_created_gmt": format!("2024-01-{:02}T10:00:00", id % 28 + 1),
        "date_modified_gmt": "2024-02-01T10:00:00",
        "images": [],
        "categories": [{ "id": 5, "name": "Drills", "slug": "drills" }]
    })
}

async fn list_products(
    State(store): State<FakeStore>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    store
        .requests
        .lock()
        .unwrap()
        .push((params.clone(), authorization));

    match store.behaviour {
        Behaviour::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "code": "woocommerce_rest_cannot_view",
                "message": "Sorry, you cannot list resources.",
                "data": { "status": 401 }
            })),
        )
            .into_response(),
        Behaviour::Garbage => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        Behaviour::Slow => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!([])).into_response()
        }
        Behaviour::Products(total) => {
            let page = params["page"].parse::<u64>().unwrap();
            let per_page = params["per_page"].parse::<u64>().unwrap();
            let first = (page - 1) * per_page;
            let ids = (1..=total)
                .rev()
                .skip(usize::try_from(first).unwrap())
                .take(usize::try_from(per_page).unwrap())
                .map(product)
                .collect::<Vec<_>>();
            Json(Value::Array(ids)).into_response()
        }
    }
}

async fn spawn_store(behaviour: Behaviour) -> (String, FakeStore) {
    let store = FakeStore {
        behaviour,
        requests: Arc::default(),
    };
    let app = Router::new()
        .route("/wp-json/wc/v3/products", get(list_products))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake store");
    let address = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake store");
    });

    (format!("http://{address}"), store)
}

fn client(base_url: &str, auth_mode: AuthMode) -> WooCommerceClient {
    WooCommerceClient::new(
        base_url,
        Credentials {
            consumer_key: "ck_test".to_string(),
            consumer_secret: "cs_test".to_string(),
        },
        auth_mode,
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn basic_auth_request_carries_listing_parameters() {
    let (base_url, store) = spawn_store(Behaviour::Products(3)).await;
    let client = client(&base_url, AuthMode::Basic);

    let query = ProductQuery {
        order_by: OrderBy::Modified,
        order: SortOrder::Asc,
        ..ProductQuery::page_of(25)
    };
    let page = client.fetch_page(&query).await.unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(page[0].slug, "tool-3");
    assert_eq!(page[0].categories[0].slug, "drills");

    let requests = store.requests();
    let (params, authorization) = &requests[0];
    assert_eq!(params["page"], "1");
    assert_eq!(params["per_page"], "25");
    assert_eq!(params["orderby"], "modified");
    assert_eq!(params["order"], "asc");
    assert_eq!(params["status"], "publish");
    assert!(!params.contains_key("consumer_key"));
    assert_eq!(authorization.as_deref(), Some("Basic Y2tfdGVzdDpjc190ZXN0"));
}

#[tokio::test]
async fn query_string_auth_sends_credentials_as_parameters() {
    let (base_url, store) = spawn_store(Behaviour::Products(1)).await;
    let client = client(&base_url, AuthMode::QueryString);

    client.fetch_page(&ProductQuery::default()).await.unwrap();

    let (params, authorization) = &store.requests()[0];
    assert_eq!(params["consumer_key"], "ck_test");
    assert_eq!(params["consumer_secret"], "cs_test");
    assert_eq!(authorization, &None);
}

#[tokio::test]
async fn error_status_maps_to_http_error_with_store_message() {
    let (base_url, _store) = spawn_store(Behaviour::Unauthorized).await;
    let client = client(&base_url, AuthMode::Basic);

    let error = client
        .fetch_page(&ProductQuery::default())
        .await
        .unwrap_err();
    match error {
        Error::Http { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("cannot list resources"));
            assert!(message.contains("woocommerce_rest_cannot_view"));
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_an_invalid_payload() {
    let (base_url, _store) = spawn_store(Behaviour::Garbage).await;
    let client = client(&base_url, AuthMode::Basic);

    let error = client
        .fetch_page(&ProductQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(error, Error::InvalidPayload(_)));
}

#[tokio::test]
async fn slow_store_times_out() {
    let (base_url, _store) = spawn_store(Behaviour::Slow).await;
    let client = WooCommerceClient::new(
        &base_url,
        Credentials {
            consumer_key: "ck_test".to_string(),
            consumer_secret: "cs_test".to_string(),
        },
        AuthMode::Basic,
        Duration::from_millis(200),
    )
    .unwrap();

    let error = client
        .fetch_page(&ProductQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(error, Error::Timeout(_)), "{error:?}");
    assert!(error.is_transient());
}

#[tokio::test]
async fn full_snapshot_walks_every_page() {
    let (base_url, store) = spawn_store(Behaviour::Products(250)).await;
    let client = client(&base_url, AuthMode::Basic);

    let entries = fetch_full_snapshot(&client, 100).await.unwrap();
    assert_eq!(entries.len(), 250);
    assert_eq!(entries.first().map(|e| e.id), Some(250));
    assert_eq!(entries.last().map(|e| e.id), Some(1));

    let pages = store
        .requests()
        .iter()
        .map(|(params, _)| params["page"].clone())
        .collect::<Vec<_>>();
    assert_eq!(pages, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn unconfigured_client_never_calls_out() {
    let client = WooCommerceClient::unconfigured().unwrap();
    assert!(!client.is_configured());
    assert!(client.endpoint().is_none());

    let error = client
        .fetch_page(&ProductQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(error, Error::Config(_)));
}
