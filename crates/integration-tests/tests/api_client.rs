//! API client behavior against the in-process backend: paths, headers,
//! bodies, and how statuses map to errors.

#![allow(clippy::indexing_slicing)]

use qkart_core::{AddressId, ProductId};
use qkart_integration_tests::{Canned, FakeBackend, product, sample_catalog};
use qkart_storefront::api::{ApiClient, ApiError};
use qkart_storefront::config::BackendConfig;
use secrecy::SecretString;
use serde_json::json;
use url::Url;

fn token(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

#[tokio::test]
async fn test_list_products_decodes_catalog() {
    let backend = FakeBackend::new().catalog(sample_catalog()).start().await;

    let products = backend
        .client()
        .list_products()
        .await
        .expect("Failed to list products");

    assert_eq!(products, sample_catalog());
    let requests = backend.requests_to("GET", "/products");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].authorization.is_none());
    assert!(requests[0].request_id.is_some());
}

#[tokio::test]
async fn test_list_products_is_cached() {
    let backend = FakeBackend::new().catalog(sample_catalog()).start().await;
    let client = ApiClient::new(&BackendConfig::new(backend.endpoint().clone()))
        .expect("Failed to build client");

    client.list_products().await.expect("first fetch");
    client.list_products().await.expect("second fetch");
    assert_eq!(backend.requests_to("GET", "/products").len(), 1);

    client.invalidate_catalog().await;
    client.list_products().await.expect("fetch after invalidation");
    assert_eq!(backend.requests_to("GET", "/products").len(), 2);
}

#[tokio::test]
async fn test_search_sends_value_query() {
    let backend = FakeBackend::new().catalog(sample_catalog()).start().await;

    let products = backend
        .client()
        .search_products("fashion")
        .await
        .expect("Failed to search");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, ProductId::new("p2"));
    let requests = backend.requests_to("GET", "/products/search");
    assert_eq!(requests[0].query.as_deref(), Some("value=fashion"));
}

#[tokio::test]
async fn test_search_not_found_is_empty() {
    let backend = FakeBackend::new().catalog(sample_catalog()).start().await;

    let products = backend
        .client()
        .search_products("spaceship")
        .await
        .expect("404 should map to an empty result");

    assert!(products.is_empty());
}

#[tokio::test]
async fn test_server_message_is_kept() {
    let backend = FakeBackend::new().start().await;
    backend.respond_with(
        "GET",
        "/products",
        Canned::status(500, "Internal Server Error"),
    );

    let err = backend
        .client()
        .list_products()
        .await
        .expect_err("500 should fail");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.server_message(), Some("Internal Server Error"));
    assert!(!err.is_connectivity());
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let backend = FakeBackend::new().start().await;
    backend.respond_with("GET", "/products", Canned::Malformed);

    let err = backend
        .client()
        .list_products()
        .await
        .expect_err("HTML should not decode");

    assert!(matches!(err, ApiError::Parse(_)));
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("Failed to reserve a port")
        .port();
    let endpoint = Url::parse(&format!("http://127.0.0.1:{port}/api/v1/")).expect("valid URL");

    let client = ApiClient::new(&BackendConfig::new(endpoint)).expect("Failed to build client");
    let err = client
        .list_products()
        .await
        .expect_err("closed port should fail");

    assert!(matches!(err, ApiError::Http(_)));
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn test_cart_calls_carry_bearer_token() {
    let backend = FakeBackend::new()
        .product(product("p1", "Laptop", "Electronics", 100.0))
        .account("crio-user", "learnbydoing", 5000.0)
        .cart_record("crio-user", "p1", 2)
        .start()
        .await;
    let token = token(&backend.token("crio-user").expect("account exists"));

    let records = backend
        .client()
        .get_cart(&token)
        .await
        .expect("Failed to get cart");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].qty, 2);
    let requests = backend.requests_to("GET", "/cart");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer token-crio-user")
    );
}

#[tokio::test]
async fn test_update_cart_body() {
    let backend = FakeBackend::new()
        .product(product("p1", "Laptop", "Electronics", 100.0))
        .account("crio-user", "learnbydoing", 5000.0)
        .start()
        .await;
    let token = token("token-crio-user");

    let records = backend
        .client()
        .update_cart(&token, &ProductId::new("p1"), 3)
        .await
        .expect("Failed to update cart");

    assert_eq!(records[0].qty, 3);
    let requests = backend.requests_to("POST", "/cart");
    assert_eq!(requests[0].body, Some(json!({ "productId": "p1", "qty": 3 })));
}

#[tokio::test]
async fn test_update_cart_to_zero_removes_record() {
    let backend = FakeBackend::new()
        .product(product("p1", "Laptop", "Electronics", 100.0))
        .account("crio-user", "learnbydoing", 5000.0)
        .cart_record("crio-user", "p1", 1)
        .start()
        .await;

    let records = backend
        .client()
        .update_cart(&token("token-crio-user"), &ProductId::new("p1"), 0)
        .await
        .expect("Failed to update cart");

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let backend = FakeBackend::new()
        .account("crio-user", "learnbydoing", 5000.0)
        .start()
        .await;

    let err = backend
        .client()
        .get_cart(&token("forged"))
        .await
        .expect_err("unknown token should fail");

    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_address_round_trip_bodies() {
    let backend = FakeBackend::new()
        .account("crio-user", "learnbydoing", 5000.0)
        .start()
        .await;
    let client = backend.client();
    let token = token("token-crio-user");

    let addresses = client
        .add_address(&token, "221B Baker Street, London")
        .await
        .expect("Failed to add address");
    assert_eq!(addresses.len(), 1);
    assert_eq!(
        backend.requests_to("POST", "/user/addresses")[0].body,
        Some(json!({ "address": "221B Baker Street, London" }))
    );

    let addresses = client
        .delete_address(&token, &addresses[0].id)
        .await
        .expect("Failed to delete address");
    assert!(addresses.is_empty());
    assert_eq!(
        backend.requests_to("DELETE", "/user/addresses/addr-1").len(),
        1
    );
}

#[tokio::test]
async fn test_checkout_body_and_ack() {
    let backend = FakeBackend::new()
        .product(product("p1", "Laptop", "Electronics", 100.0))
        .account("crio-user", "learnbydoing", 5000.0)
        .cart_record("crio-user", "p1", 2)
        .address("crio-user", "221B Baker Street, London")
        .start()
        .await;

    backend
        .client()
        .checkout(&token("token-crio-user"), &AddressId::new("addr-1"))
        .await
        .expect("Failed to check out");

    assert_eq!(
        backend.requests_to("POST", "/cart/checkout")[0].body,
        Some(json!({ "addressId": "addr-1" }))
    );
    let account = backend.account("crio-user").expect("account exists");
    assert!((account.balance - 4800.0).abs() < f64::EPSILON);
    assert!(account.cart.is_empty());
}

#[tokio::test]
async fn test_login_response() {
    let backend = FakeBackend::new()
        .account("crio-user", "learnbydoing", 5000.0)
        .start()
        .await;

    let response = backend
        .client()
        .login("crio-user", "learnbydoing")
        .await
        .expect("Failed to log in");

    assert_eq!(response.token, "token-crio-user");
    assert_eq!(response.username, "crio-user");
    assert!((response.balance - 5000.0).abs() < f64::EPSILON);
    assert_eq!(
        backend.requests_to("POST", "/auth/login")[0].body,
        Some(json!({ "username": "crio-user", "password": "learnbydoing" }))
    );
}

#[tokio::test]
async fn test_register_taken_username() {
    let backend = FakeBackend::new()
        .account("crio-user", "learnbydoing", 5000.0)
        .start()
        .await;

    let err = backend
        .client()
        .register("crio-user", "learnbydoing")
        .await
        .expect_err("taken username should fail");

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.server_message(), Some("Username is already taken"));
}
