//! QKart REST API client.
//!
//! # Architecture
//!
//! - The remote service is the source of truth for products, carts,
//!   addresses, and wallet accounting - NO local copies beyond a session
//! - Plain JSON over HTTP via `reqwest`
//! - Authenticated calls carry the session's bearer token
//! - The product list is cached in memory via `moka`; search results are not
//!
//! # Example
//!
//! ```rust,ignore
//! use qkart_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.backend)?;
//!
//! let products = client.list_products().await?;
//! let records = client.update_cart(&token, &products[0].id, 1).await?;
//! ```

mod cache;
pub mod types;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use qkart_core::{Address, AddressId, CartRecord, Product, ProductId};

use crate::config::BackendConfig;

use cache::{CacheKey, CacheValue};
use types::{
    AddAddressRequest, CheckoutRequest, CredentialsRequest, ErrorBody, LoginResponse,
    SuccessResponse, UpdateCartRequest,
};

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Errors that can occur when talking to the QKart API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never got a response (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error: {status} - {}", .message.as_deref().unwrap_or("(no message)"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// Response body was not the JSON we expected.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(String),
}

impl ApiError {
    /// HTTP status of a server rejection, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `message` the server sent with its rejection, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }

    /// Whether the failure is a connectivity or parse problem rather than a
    /// server rejection.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Parse(_) | Self::Url(_))
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the QKart REST API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    endpoint: Url,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("cached", &self.inner.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(16)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                endpoint: config.endpoint.clone(),
                cache,
            }),
        })
    }

    /// Base URL of the remote service.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Build the URL for a path under the endpoint, one segment at a time so
    /// identifiers are percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(format!("{} cannot be a base", self.inner.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner.client.request(method, url)
    }

    fn authed_request(&self, method: Method, url: Url, token: &SecretString) -> RequestBuilder {
        self.request(method, url).bearer_auth(token.expose_secret())
    }

    /// Send a request and decode its JSON body.
    ///
    /// Non-success statuses become [`ApiError::Api`] carrying the server's
    /// `message` when the body has one.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(request_id = %request_id, "Sending API request");

        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            tracing::warn!(
                request_id = %request_id,
                status = %status,
                message = ?message,
                "QKart API returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse QKart API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Send a request expecting `{success: true}`.
    async fn send_ack(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let ack: SuccessResponse = self.send(request).await?;
        if ack.success {
            Ok(())
        } else {
            Err(ApiError::Api {
                status: StatusCode::OK.as_u16(),
                message: ack.message,
            })
        }
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the full product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(cache) = &self.inner.cache
            && let Some(CacheValue::Products(products)) = cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let url = self.url(&["products"])?;
        let products: Vec<Product> = self.send(self.request(Method::GET, url)).await?;

        if let Some(cache) = &self.inner.cache {
            cache
                .insert(CacheKey::Products, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    /// Search products by name or category.
    ///
    /// A 404 from the service means nothing matched and yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for any other reason.
    #[instrument(skip(self), fields(text = %text))]
    pub async fn search_products(&self, text: &str) -> Result<Vec<Product>, ApiError> {
        let mut url = self.url(&["products", "search"])?;
        url.query_pairs_mut().append_pair("value", text);

        match self.send(self.request(Method::GET, url)).await {
            Err(ApiError::Api { status: 404, .. }) => {
                debug!("No products matched search");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Drop any cached catalog.
    pub async fn invalidate_catalog(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate(&CacheKey::Products).await;
        }
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the raw cart records for the session's user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &SecretString) -> Result<Vec<CartRecord>, ApiError> {
        let url = self.url(&["cart"])?;
        self.send(self.authed_request(Method::GET, url, token)).await
    }

    /// Set the quantity of a product in the cart.
    ///
    /// `qty` is the new absolute quantity; 0 asks the service to remove the
    /// record. Returns the updated cart records.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn update_cart(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<CartRecord>, ApiError> {
        let url = self.url(&["cart"])?;
        let body = UpdateCartRequest { product_id, qty };
        self.send(self.authed_request(Method::POST, url, token).json(&body))
            .await
    }

    /// Place an order for the current cart, shipped to `address_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the service refuses the
    /// order.
    #[instrument(skip(self, token), fields(address_id = %address_id))]
    pub async fn checkout(
        &self,
        token: &SecretString,
        address_id: &AddressId,
    ) -> Result<(), ApiError> {
        let url = self.url(&["cart", "checkout"])?;
        let body = CheckoutRequest { address_id };
        self.send_ack(self.authed_request(Method::POST, url, token).json(&body))
            .await
    }

    // =========================================================================
    // Address Methods
    // =========================================================================

    /// Get the saved shipping addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_addresses(&self, token: &SecretString) -> Result<Vec<Address>, ApiError> {
        let url = self.url(&["user", "addresses"])?;
        self.send(self.authed_request(Method::GET, url, token)).await
    }

    /// Save a new shipping address. Returns the updated address list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, address))]
    pub async fn add_address(
        &self,
        token: &SecretString,
        address: &str,
    ) -> Result<Vec<Address>, ApiError> {
        let url = self.url(&["user", "addresses"])?;
        let body = AddAddressRequest { address };
        self.send(self.authed_request(Method::POST, url, token).json(&body))
            .await
    }

    /// Delete a shipping address. Returns the updated address list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(address_id = %address_id))]
    pub async fn delete_address(
        &self,
        token: &SecretString,
        address_id: &AddressId,
    ) -> Result<Vec<Address>, ApiError> {
        let url = self.url(&["user", "addresses", address_id.as_str()])?;
        self.send(self.authed_request(Method::DELETE, url, token))
            .await
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the username is taken.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let url = self.url(&["auth", "register"])?;
        let body = CredentialsRequest { username, password };
        self.send_ack(self.request(Method::POST, url).json(&body))
            .await
    }

    /// Log in and obtain a bearer token and wallet balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the credentials are wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.url(&["auth", "login"])?;
        let body = CredentialsRequest { username, password };
        self.send(self.request(Method::POST, url).json(&body)).await
    }
}
