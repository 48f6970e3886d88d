//! Cart display model.
//!
//! [`CartView`] turns reconciled line items into what a front end shows:
//! one row per line, the order total, and which actions are available.
//! `Display` renders it as a plain-text table.

use std::fmt;

use qkart_core::{CartLineItem, ProductId, item_count, total_value};

/// Message shown in place of an empty cart.
pub const EMPTY_CART_MESSAGE: &str = "Cart is empty. Add more items to the cart to checkout.";

/// How the cart is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartMode {
    /// Quantity stepper with a checkout action.
    #[default]
    Editable,
    /// Order summary on the checkout page.
    ReadOnly,
}

/// One row of the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub image: String,
    pub cost: f64,
    pub qty: u32,
    pub subtotal: f64,
}

impl From<&CartLineItem> for CartItemView {
    fn from(item: &CartLineItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            name: item.product.name.clone(),
            category: item.product.category.clone(),
            image: item.product.image.clone(),
            cost: item.product.cost,
            qty: item.qty,
            subtotal: item.subtotal(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub mode: CartMode,
    pub items: Vec<CartItemView>,
    pub total: f64,
    pub item_count: u32,
}

impl CartView {
    /// Build the view for a set of reconciled line items.
    #[must_use]
    pub fn new(items: &[CartLineItem], mode: CartMode) -> Self {
        Self {
            mode,
            items: items.iter().map(CartItemView::from).collect(),
            total: total_value(items),
            item_count: item_count(items),
        }
    }

    /// Create an empty cart.
    #[must_use]
    pub const fn empty(mode: CartMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
            total: 0.0,
            item_count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity steppers are only offered in editable mode.
    #[must_use]
    pub fn can_change_quantity(&self) -> bool {
        self.mode == CartMode::Editable && !self.is_empty()
    }

    /// The checkout action is only offered for a non-empty editable cart.
    #[must_use]
    pub fn can_checkout(&self) -> bool {
        self.can_change_quantity()
    }
}

/// Format a plain numeric price.
///
/// Whole amounts print without decimals; anything else keeps two places.
#[must_use]
pub fn format_price(amount: f64) -> String {
    if amount.fract().abs() < f64::EPSILON {
        format!("${amount:.0}")
    } else {
        format!("${amount:.2}")
    }
}

impl fmt::Display for CartView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{EMPTY_CART_MESSAGE}");
        }

        for item in &self.items {
            let qty = match self.mode {
                CartMode::Editable => format!("[-] {} [+]", item.qty),
                CartMode::ReadOnly => format!("Qty: {}", item.qty),
            };
            writeln!(
                f,
                "{:<40} {:>12} {:>10}   ({})",
                item.name,
                qty,
                format_price(item.cost),
                item.product_id
            )?;
        }

        writeln!(f, "{:<40} {:>23}", "Order total", format_price(self.total))?;

        match self.mode {
            CartMode::Editable => writeln!(f, "\n-> Checkout"),
            CartMode::ReadOnly => {
                writeln!(f, "\nOrder Details")?;
                writeln!(f, "{:<20} {}", "Products", self.item_count)?;
                writeln!(f, "{:<20} {}", "Subtotal", format_price(self.total))?;
                writeln!(f, "{:<20} {}", "Shipping Charges", format_price(0.0))?;
                writeln!(f, "{:<20} {}", "Total", format_price(self.total))
            }
        }
    }
}
