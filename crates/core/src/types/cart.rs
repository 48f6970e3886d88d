//! Cart record and line item types.

use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// A server-persisted cart entry: a product reference and its quantity.
///
/// The remote service is the source of truth for cart records; the client
/// never mutates them locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRecord {
    /// Identifier of the product in the cart.
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    /// Quantity of the product. Always positive for persisted records.
    pub qty: u32,
}

impl CartRecord {
    /// Create a new cart record.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, qty: u32) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }
}

/// A cart record joined with its full product detail.
///
/// Line items are derived for display and total computation only. Each one
/// owns its own copy of the product, so catalog values are never touched.
/// Serializes flat: product fields and `qty` at the same level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product detail copied from the catalog snapshot.
    #[serde(flatten)]
    pub product: Product,
    /// Quantity copied from the matching cart record.
    pub qty: u32,
}

impl CartLineItem {
    /// Identifier of the product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// `cost * qty` for this line.
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.product.cost * f64::from(self.qty)
    }
}
