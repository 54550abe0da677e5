// Integration tests for `CollectionClient` using wiremock.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gridline_api::{CollectionClient, Error, ListParams, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CollectionClient) {
    let server = MockServer::start().await;
    let client = CollectionClient::from_reqwest(
        &server.uri(),
        "master-data/other-products",
        reqwest::Client::new(),
    )
    .unwrap();
    (server, client)
}

fn first_page(search: Option<&str>) -> ListParams {
    ListParams {
        page: 1,
        limit: 10,
        search: search.map(str::to_owned),
    }
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_with_search() {
    let (server, client) = setup().await;

    let body = json!({
        "data": {
            "items": [
                { "id": 1, "product_name": "Shoe rack", "product_code": "SR-1" },
                { "id": 2, "product_name": "Shoe horn", "product_code": "SH-2" },
            ],
            "pagination": { "total": 2, "totalPages": 1 }
        }
    });

    Mock::given(method("GET"))
        .and(path("/master-data/other-products"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .and(query_param("search", "shoe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.list(&first_page(Some("shoe"))).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1]["product_name"], "Shoe horn");
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.pagination.total_pages, 1);
}

#[tokio::test]
async fn test_list_without_search_omits_param() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/master-data/other-products"))
        .and(query_param_is_missing("search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "items": [], "pagination": { "total": 0, "totalPages": 0 } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.list(&first_page(None)).await.unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_list_entity_specific_items_key() {
    let server = MockServer::start().await;
    let client = CollectionClient::from_reqwest(&server.uri(), "sub-menus", reqwest::Client::new())
        .unwrap()
        .with_items_key("subMenus");

    Mock::given(method("GET"))
        .and(path("/sub-menus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "subMenus": [{ "id": "a1", "nameEn": "About" }],
                "pagination": { "total": 1, "totalPages": 1 }
            }
        })))
        .mount(&server)
        .await;

    let page = client.list(&first_page(None)).await.unwrap();
    assert_eq!(page.items, vec![json!({ "id": "a1", "nameEn": "About" })]);
}

#[tokio::test]
async fn test_create_posts_payload() {
    let (server, client) = setup().await;

    let payload = json!({ "product_name": "Lamp", "product_code": "LP-1", "status": 1 });

    Mock::given(method("POST"))
        .and(path("/master-data/other-products"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "id": 9, "product_name": "Lamp", "product_code": "LP-1", "status": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create(&payload).await.unwrap();
    assert_eq!(created["id"], 9);
}

#[tokio::test]
async fn test_update_puts_to_item_url() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/master-data/other-products/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 9, "product_name": "Desk lamp" })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .update("9", &json!({ "product_name": "Desk lamp" }))
        .await
        .unwrap();
    assert_eq!(updated["product_name"], "Desk lamp");
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/master-data/other-products/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete("9").await.unwrap();
}

#[tokio::test]
async fn test_bearer_token_header() {
    let server = MockServer::start().await;
    let transport = TransportConfig::default()
        .with_bearer_token(secrecy::SecretString::from("s3cret".to_owned()));
    let client = CollectionClient::new(&server.uri(), "items", &transport).unwrap();

    Mock::given(method("DELETE"))
        .and(path("/items/1"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.delete("1").await.unwrap();
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_error_message_is_decoded() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/master-data/other-products"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "duplicate code",
            "code": "DUPLICATE_KEY"
        })))
        .mount(&server)
        .await;

    let err = client.create(&json!({ "product_code": "1" })).await.unwrap_err();
    match err {
        Error::Http {
            status,
            message,
            code,
        } => {
            assert_eq!(status, 409);
            assert_eq!(message, "duplicate code");
            assert_eq!(code.as_deref(), Some("DUPLICATE_KEY"));
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/master-data/other-products/3"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;

    let err = client.delete("3").await.unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("database offline"));
}

#[tokio::test]
async fn test_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/master-data/other-products/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.update("404", &json!({})).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_malformed_list_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/master-data/other-products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client.list(&first_page(None)).await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("proxy error")),
        other => panic!("expected Deserialization error, got {other:?}"),
    }
}
