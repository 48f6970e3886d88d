//! Integration test support for the QKart storefront client.
//!
//! [`FakeBackend`] builds an in-process QKart REST API on `axum`, bound to an
//! ephemeral port, with just enough behavior to drive the client flows:
//! catalog and search, per-account carts and addresses, checkout against a
//! wallet, register and login. Every request is recorded so tests can check
//! headers and bodies, and any route can be made to answer with a canned
//! failure.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = FakeBackend::new()
//!     .product(product("p1", "Laptop", "Electronics", 100.0))
//!     .account("crio-user", "learnbydoing", 5000.0)
//!     .start()
//!     .await;
//!
//! let products = backend.client().list_products().await?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use qkart_core::{Address, AddressId, CartRecord, Product, ProductId};
use qkart_storefront::api::{ApiClient, REQUEST_ID_HEADER};
use qkart_storefront::config::BackendConfig;

/// Path prefix the API is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Balance given to accounts created through `POST /auth/register`.
pub const STARTING_BALANCE: f64 = 5000.0;

// =============================================================================
// Fixtures
// =============================================================================

/// Build a catalog product.
#[must_use]
pub fn product(id: &str, name: &str, category: &str, cost: f64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: category.to_string(),
        cost,
        rating: 4,
        image: format!("https://images.example.com/{id}.png"),
    }
}

/// A small catalog spanning a few categories.
#[must_use]
pub fn sample_catalog() -> Vec<Product> {
    vec![
        product("p1", "Laptop", "Electronics", 100.0),
        product("p2", "Tan Leatherette Weekender Duffle", "Fashion", 150.0),
        product("p3", "YONEX Smash Badminton Racquet", "Sports", 100.0),
        product("p4", "Atomic Habits", "Books", 19.5),
    ]
}

// =============================================================================
// State
// =============================================================================

/// A user known to the fake backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub password: String,
    pub token: String,
    pub balance: f64,
    pub cart: Vec<CartRecord>,
    pub addresses: Vec<Address>,
    next_address: u32,
}

impl Account {
    fn new(username: &str, password: &str, balance: f64) -> Self {
        Self {
            password: password.to_string(),
            token: format!("token-{username}"),
            balance,
            cart: Vec::new(),
            addresses: Vec::new(),
            next_address: 1,
        }
    }

    fn add_address(&mut self, address: &str) -> AddressId {
        let id = AddressId::new(format!("addr-{}", self.next_address));
        self.next_address += 1;
        self.addresses.push(Address {
            id: id.clone(),
            address: address.to_string(),
        });
        id
    }
}

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path below [`API_PREFIX`].
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub body: Option<Value>,
}

/// A response forced onto a route.
#[derive(Debug, Clone)]
pub enum Canned {
    /// Error status with an optional `message` in the body.
    Status { status: u16, message: Option<String> },
    /// 200 with a body that isn't JSON.
    Malformed,
}

impl Canned {
    #[must_use]
    pub fn status(status: u16, message: &str) -> Self {
        Self::Status {
            status,
            message: Some(message.to_string()),
        }
    }
}

impl IntoResponse for Canned {
    fn into_response(self) -> Response {
        match self {
            Self::Status { status, message } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let body = message.map_or_else(
                    || json!({ "success": false }),
                    |message| json!({ "success": false, "message": message }),
                );
                (status, Json(body)).into_response()
            }
            Self::Malformed => (StatusCode::OK, "<html>not json</html>").into_response(),
        }
    }
}

#[derive(Debug, Default)]
struct BackendState {
    catalog: Vec<Product>,
    accounts: HashMap<String, Account>,
    requests: Vec<RecordedRequest>,
    canned: HashMap<(String, String), Canned>,
    delays: HashMap<(String, String), Duration>,
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Builder and handle
// =============================================================================

/// Seeds the fake backend before it starts.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: BackendState,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn product(mut self, product: Product) -> Self {
        self.state.catalog.push(product);
        self
    }

    #[must_use]
    pub fn catalog(mut self, products: Vec<Product>) -> Self {
        self.state.catalog.extend(products);
        self
    }

    #[must_use]
    pub fn account(mut self, username: &str, password: &str, balance: f64) -> Self {
        self.state
            .accounts
            .insert(username.to_string(), Account::new(username, password, balance));
        self
    }

    /// Put a record in an existing account's cart. The product doesn't have
    /// to be in the catalog.
    #[must_use]
    pub fn cart_record(mut self, username: &str, product_id: &str, qty: u32) -> Self {
        if let Some(account) = self.state.accounts.get_mut(username) {
            account.cart.push(CartRecord::new(product_id, qty));
        }
        self
    }

    #[must_use]
    pub fn address(mut self, username: &str, address: &str) -> Self {
        if let Some(account) = self.state.accounts.get_mut(username) {
            account.add_address(address);
        }
        self
    }

    /// Bind to an ephemeral port and serve in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener can't be bound.
    pub async fn start(self) -> TestBackend {
        let state: Shared = Arc::new(Mutex::new(self.state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        let endpoint = Url::parse(&format!("http://{addr}{API_PREFIX}/"))
            .expect("Fake backend URL is valid");

        let app = router(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        TestBackend {
            endpoint,
            state,
            server,
        }
    }
}

/// A running fake backend. Stops when dropped.
#[derive(Debug)]
pub struct TestBackend {
    endpoint: Url,
    state: Shared,
    server: JoinHandle<()>,
}

impl TestBackend {
    /// Base URL, ending in `/api/v1/`.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Backend settings with catalog caching turned off.
    #[must_use]
    pub fn config(&self) -> BackendConfig {
        BackendConfig::new(self.endpoint.clone()).without_cache()
    }

    /// An API client for this backend, without catalog caching.
    ///
    /// # Panics
    ///
    /// Panics if the client can't be built.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("Failed to build API client")
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Requests received for one method and path.
    #[must_use]
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Answer `method path` with `canned` from now on.
    pub fn respond_with(&self, method: &str, path: &str, canned: Canned) {
        lock(&self.state)
            .canned
            .insert((method.to_string(), path.to_string()), canned);
    }

    /// Go back to normal handling for `method path`.
    pub fn clear_response(&self, method: &str, path: &str) {
        lock(&self.state)
            .canned
            .remove(&(method.to_string(), path.to_string()));
    }

    /// Hold every response to `method path` for `delay` before answering.
    pub fn delay(&self, method: &str, path: &str, delay: Duration) {
        lock(&self.state)
            .delays
            .insert((method.to_string(), path.to_string()), delay);
    }

    #[must_use]
    pub fn account(&self, username: &str) -> Option<Account> {
        lock(&self.state).accounts.get(username).cloned()
    }

    /// Bearer token the backend issues to `username`.
    #[must_use]
    pub fn token(&self, username: &str) -> Option<String> {
        self.account(username).map(|a| a.token)
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Routes
// =============================================================================

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/cart", get(get_cart).post(update_cart))
        .route("/cart/checkout", post(checkout))
        .route("/user/addresses", get(list_addresses).post(add_address))
        .route("/user/addresses/{id}", delete(delete_address))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .with_state(state.clone());

    Router::new()
        .nest(API_PREFIX, api)
        .layer(middleware::from_fn_with_state(state, record))
}

/// Record the request, wait out any configured delay, then either answer
/// with a canned response or pass it on untouched.
async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    let header_value = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let path = parts.uri.path();
    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: path.strip_prefix(API_PREFIX).unwrap_or(path).to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header_value(header::AUTHORIZATION.as_str()),
        request_id: header_value(REQUEST_ID_HEADER),
        body: serde_json::from_slice(&bytes).ok(),
    };

    let (canned, delay) = {
        let mut state = lock(&state);
        let key = (recorded.method.clone(), recorded.path.clone());
        let canned = state.canned.get(&key).cloned();
        let delay = state.delays.get(&key).copied();
        state.requests.push(recorded);
        (canned, delay)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match canned {
        Some(canned) => canned.into_response(),
        None => next.run(Request::from_parts(parts, Body::from(bytes))).await,
    }
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Run `f` against the account owning the request's bearer token.
fn authed(
    state: &Shared,
    headers: &HeaderMap,
    f: impl FnOnce(&mut Account, &[Product]) -> Response,
) -> Response {
    let Some(token) = bearer(headers) else {
        return reject(
            StatusCode::UNAUTHORIZED,
            "Protected route, Oauth2 Bearer token not found",
        );
    };

    let mut guard = lock(state);
    let BackendState {
        accounts, catalog, ..
    } = &mut *guard;
    match accounts.values_mut().find(|a| a.token == token) {
        Some(account) => f(account, catalog),
        None => reject(StatusCode::UNAUTHORIZED, "Invalid token"),
    }
}

async fn list_products(State(state): State<Shared>) -> Response {
    Json(lock(&state).catalog.clone()).into_response()
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    value: String,
}

async fn search_products(State(state): State<Shared>, Query(query): Query<SearchQuery>) -> Response {
    let needle = query.value.to_lowercase();
    let matches: Vec<Product> = lock(&state)
        .catalog
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    if matches.is_empty() {
        return reject(StatusCode::NOT_FOUND, "No products found");
    }
    Json(matches).into_response()
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    authed(&state, &headers, |account, _| {
        Json(account.cart.clone()).into_response()
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartBody {
    product_id: String,
    qty: u32,
}

async fn update_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartBody>,
) -> Response {
    authed(&state, &headers, |account, catalog| {
        let product_id = ProductId::new(body.product_id);
        if !catalog.iter().any(|p| p.id == product_id) {
            return reject(StatusCode::BAD_REQUEST, "Product doesn't exist");
        }

        let existing = account.cart.iter().position(|r| r.product_id == product_id);
        match (existing, body.qty) {
            (Some(index), 0) => {
                account.cart.remove(index);
            }
            (None, 0) => {
                return reject(StatusCode::BAD_REQUEST, "Product not in cart");
            }
            (Some(index), qty) => {
                if let Some(record) = account.cart.get_mut(index) {
                    record.qty = qty;
                }
            }
            (None, qty) => account.cart.push(CartRecord::new(product_id, qty)),
        }
        Json(account.cart.clone()).into_response()
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutBody {
    address_id: String,
}

async fn checkout(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Response {
    authed(&state, &headers, |account, catalog| {
        if account.cart.is_empty() {
            return reject(StatusCode::BAD_REQUEST, "Cart is empty");
        }
        if !account
            .addresses
            .iter()
            .any(|a| a.id.as_str() == body.address_id)
        {
            return reject(StatusCode::BAD_REQUEST, "Bad Address");
        }

        let total: f64 = account
            .cart
            .iter()
            .filter_map(|record| {
                catalog
                    .iter()
                    .find(|p| p.id == record.product_id)
                    .map(|p| p.cost * f64::from(record.qty))
            })
            .sum();
        if total > account.balance {
            return reject(
                StatusCode::BAD_REQUEST,
                "Wallet balance not sufficient to place order",
            );
        }

        account.balance -= total;
        account.cart.clear();
        Json(json!({ "success": true })).into_response()
    })
}

async fn list_addresses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    authed(&state, &headers, |account, _| {
        Json(account.addresses.clone()).into_response()
    })
}

#[derive(Deserialize)]
struct AddressBody {
    address: String,
}

async fn add_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<AddressBody>,
) -> Response {
    authed(&state, &headers, |account, _| {
        if body.address.chars().count() < 20 {
            return reject(
                StatusCode::BAD_REQUEST,
                "Address should be greater than 20 characters",
            );
        }
        account.add_address(&body.address);
        Json(account.addresses.clone()).into_response()
    })
}

async fn delete_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    authed(&state, &headers, |account, _| {
        let Some(index) = account.addresses.iter().position(|a| a.id.as_str() == id) else {
            return reject(StatusCode::NOT_FOUND, "Address to delete was not found");
        };
        account.addresses.remove(index);
        Json(account.addresses.clone()).into_response()
    })
}

#[derive(Deserialize)]
struct CredentialsBody {
    username: String,
    password: String,
}

async fn register(State(state): State<Shared>, Json(body): Json<CredentialsBody>) -> Response {
    let mut state = lock(&state);
    if state.accounts.contains_key(&body.username) {
        return reject(StatusCode::BAD_REQUEST, "Username is already taken");
    }
    let account = Account::new(&body.username, &body.password, STARTING_BALANCE);
    state.accounts.insert(body.username, account);
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<CredentialsBody>) -> Response {
    let state = lock(&state);
    let Some(account) = state.accounts.get(&body.username) else {
        return reject(StatusCode::BAD_REQUEST, "Username does not exist");
    };
    if account.password != body.password {
        return reject(StatusCode::BAD_REQUEST, "Password is incorrect");
    }

    Json(json!({
        "success": true,
        "token": account.token,
        "username": body.username,
        "balance": account.balance,
    }))
    .into_response()
}
