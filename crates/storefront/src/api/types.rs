//! Request and response bodies for the QKart REST API.

use serde::{Deserialize, Serialize};

use qkart_core::{AddressId, ProductId};

/// Body of `POST /cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest<'a> {
    pub product_id: &'a ProductId,
    pub qty: u32,
}

/// Body of `POST /user/addresses`.
#[derive(Debug, Serialize)]
pub struct AddAddressRequest<'a> {
    pub address: &'a str,
}

/// Body of `POST /cart/checkout`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest<'a> {
    pub address_id: &'a AddressId,
}

/// Body of `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct CredentialsRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// `{success: true}` acknowledgement.
#[derive(Debug, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful `POST /auth/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub balance: f64,
}

/// Error body returned with 4xx/5xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
