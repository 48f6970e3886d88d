//! Shipping address type.

use serde::{Deserialize, Serialize};

use super::AddressId;

/// A saved shipping address, as returned by `GET /user/addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Address identifier, used for selection and deletion.
    #[serde(rename = "_id")]
    pub id: AddressId,
    /// Free-text address.
    pub address: String,
}
