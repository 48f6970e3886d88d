//! Cart reconciliation and pricing.
//!
//! The remote service stores the cart as a list of [`CartRecord`]s
//! (`{productId, qty}`) and the catalog separately. [`reconcile`] joins the
//! two into display-ready [`CartLineItem`]s, and [`total_value`] sums them.
//!
//! Both are pure: inputs are borrowed, outputs are freshly built, and calling
//! them twice with the same inputs yields equal results.

use std::collections::HashMap;

use crate::types::{CartLineItem, CartRecord, Product, ProductId};

/// Join cart records against a catalog snapshot.
///
/// - Output order follows `records`.
/// - A record whose product is missing from `catalog` is omitted.
/// - If the catalog holds duplicate identifiers, the first one wins.
///
/// The catalog is assumed to be fully loaded; passing a partial snapshot
/// simply yields fewer line items.
#[must_use]
pub fn reconcile(records: &[CartRecord], catalog: &[Product]) -> Vec<CartLineItem> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut by_id: HashMap<&ProductId, &Product> = HashMap::with_capacity(catalog.len());
    for product in catalog {
        by_id.entry(&product.id).or_insert(product);
    }

    records
        .iter()
        .filter_map(|record| {
            let Some(product) = by_id.get(&record.product_id) else {
                tracing::debug!(
                    product_id = %record.product_id,
                    "Cart record references a product missing from the catalog"
                );
                return None;
            };
            Some(CartLineItem {
                product: (*product).clone(),
                qty: record.qty,
            })
        })
        .collect()
}

/// Total value of all line items: the sum of `cost * qty`.
///
/// Plain floating-point summation with no rounding. An empty cart is worth 0.
#[must_use]
pub fn total_value(items: &[CartLineItem]) -> f64 {
    items
        .iter()
        .fold(0.0, |total, item| total + item.subtotal())
}

/// Total number of units across all line items.
#[must_use]
pub fn item_count(items: &[CartLineItem]) -> u32 {
    items.iter().map(|item| item.qty).sum()
}

/// Whether a product already has a line in the cart.
#[must_use]
pub fn is_item_in_cart(items: &[CartLineItem], product_id: &ProductId) -> bool {
    items.iter().any(|item| item.product_id() == product_id)
}

/// A one-step quantity change requested from the quantity stepper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityChange {
    /// Increase the persisted quantity by one.
    Add,
    /// Decrease the persisted quantity by one.
    Remove,
}

impl QuantityChange {
    /// The new absolute quantity to send to the service.
    ///
    /// Removing the last unit yields 0; the service drops the record.
    #[must_use]
    pub const fn apply(self, current: u32) -> u32 {
        match self {
            Self::Add => current.saturating_add(1),
            Self::Remove => current.saturating_sub(1),
        }
    }

    /// Wire name of the change (`"add"` / `"remove"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl std::fmt::Display for QuantityChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
