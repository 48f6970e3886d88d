//! Terminal output.
//!
//! Listings go to stdout so they can be piped; notifications go to stderr.

use std::fmt::Write as _;

use qkart_core::{Address, Product};
use qkart_storefront::flows::OrderReceipt;
use qkart_storefront::notify::{Notification, Notifier, Variant};
use qkart_storefront::view::format_price;

/// Prints notifications to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    #[allow(clippy::print_stderr)]
    fn notify(&self, notification: Notification) {
        let marker = match notification.variant {
            Variant::Success => "ok",
            Variant::Info => "info",
            Variant::Warning => "warn",
            Variant::Error => "error",
        };
        eprintln!("[{marker}] {}", notification.message);
    }
}

/// Write a block of text to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(text: &str) {
    print!("{text}");
}

fn stars(product: &Product) -> String {
    let filled = usize::from(product.stars());
    let empty = usize::from(Product::MAX_RATING).saturating_sub(filled);
    format!("{}{}", "*".repeat(filled), ".".repeat(empty))
}

/// Render a product listing.
#[must_use]
pub fn products(products: &[Product]) -> String {
    let mut out = String::new();
    for product in products {
        let _ = writeln!(
            out,
            "{:<26} {:<40} {:<18} {:>8}  {}",
            product.id,
            product.name,
            product.category,
            format_price(product.cost),
            stars(product)
        );
    }
    out
}

/// Render saved addresses.
#[must_use]
pub fn addresses(addresses: &[Address]) -> String {
    if addresses.is_empty() {
        return "No addresses found for this account. Add one to proceed.\n".to_string();
    }

    let mut out = String::new();
    for address in addresses {
        let _ = writeln!(out, "{:<26} {}", address.id, address.address);
    }
    out
}

/// Render the outcome of a placed order.
#[must_use]
pub fn receipt(receipt: &OrderReceipt) -> String {
    format!(
        "Order total: {}\nShipping to: {}\nWallet balance: {}\n",
        format_price(receipt.total),
        receipt.address_id,
        format_price(receipt.remaining_balance)
    )
}

#[cfg(test)]
mod tests {
    use qkart_core::{AddressId, ProductId};

    use super::*;

    fn product(rating: u8) -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Laptop".to_string(),
            category: "Electronics".to_string(),
            cost: 100.0,
            rating,
            image: String::new(),
        }
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(&product(3)), "***..");
        assert_eq!(stars(&product(9)), "*****");
    }

    #[test]
    fn test_products_listing() {
        let listing = products(&[product(4)]);
        assert!(listing.starts_with("p1"));
        assert!(listing.contains("Laptop"));
        assert!(listing.contains("$100"));
    }

    #[test]
    fn test_empty_addresses() {
        assert!(addresses(&[]).contains("No addresses found"));
    }

    #[test]
    fn test_receipt() {
        let text = receipt(&OrderReceipt {
            total: 200.0,
            remaining_balance: 4800.0,
            address_id: AddressId::new("a1"),
        });
        assert!(text.contains("Order total: $200"));
        assert!(text.contains("Wallet balance: $4800"));
    }
}
