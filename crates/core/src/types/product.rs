//! Catalog product type.

use serde::{Deserialize, Serialize};

use super::ProductId;

/// A product available to buy, as returned by `GET /products`.
///
/// Products are owned by the remote service and treated as immutable values
/// once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name of the product.
    pub name: String,
    /// Category the product belongs to.
    pub category: String,
    /// Unit price. Treated as a plain number with no currency normalization.
    pub cost: f64,
    /// Aggregate rating, an integer out of five.
    pub rating: u8,
    /// URL of the product image.
    pub image: String,
}

impl Product {
    /// Highest rating a product can have.
    pub const MAX_RATING: u8 = 5;

    /// Rating clamped to the 0-5 range for star display.
    #[must_use]
    pub fn stars(&self) -> u8 {
        self.rating.min(Self::MAX_RATING)
    }
}
