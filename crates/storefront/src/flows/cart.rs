//! Cart synchronization shared by the catalog and checkout flows.

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::debug;

use qkart_core::{CartLineItem, CartRecord, Product, ProductId, QuantityChange, reconcile};

use super::messages;
use crate::api::{ApiClient, ApiError};
use crate::error::{FlowError, ServerMessage, add_breadcrumb, report};
use crate::notify::Notifier;

/// Marks a load as in progress until dropped, so an abandoned load still
/// clears the flag.
pub(super) struct LoadingGuard<'a>(&'a watch::Sender<bool>);

impl<'a> LoadingGuard<'a> {
    #[must_use]
    pub(super) fn start(loading: &'a watch::Sender<bool>) -> Self {
        loading.send_replace(true);
        Self(loading)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

/// Fetch the catalog, reporting failures.
///
/// A 500 shows the server's own message; anything else the generic one.
pub(super) async fn fetch_products(
    client: &ApiClient,
    notifier: &dyn Notifier,
) -> Result<Vec<Product>, ApiError> {
    client.list_products().await.inspect_err(|e| {
        report(
            notifier,
            e,
            messages::FETCH_PRODUCTS,
            ServerMessage::OnStatus(500),
        );
    })
}

/// Fetch the raw cart. Failures are reported and the cart is treated as
/// absent.
pub(super) async fn fetch_cart(
    client: &ApiClient,
    notifier: &dyn Notifier,
    token: Option<&SecretString>,
) -> Option<Vec<CartRecord>> {
    let token = token?;
    match client.get_cart(token).await {
        Ok(records) => Some(records),
        Err(e) => {
            report(notifier, &e, messages::FETCH_CART, ServerMessage::Never);
            None
        }
    }
}

/// Fetch catalog and cart concurrently and reconcile once both resolve.
///
/// Returns the catalog and the reconciled items; items are empty when the
/// cart is absent (logged out or failed to load).
pub(super) async fn load_catalog_and_cart(
    client: &ApiClient,
    notifier: &dyn Notifier,
    token: Option<&SecretString>,
) -> Result<(Vec<Product>, Vec<CartLineItem>), ApiError> {
    let (products, records) = tokio::join!(
        fetch_products(client, notifier),
        fetch_cart(client, notifier, token)
    );
    let products = products?;

    let items = records
        .map(|records| reconcile(&records, &products))
        .unwrap_or_default();
    debug!(
        products = products.len(),
        lines = items.len(),
        "Catalog and cart loaded"
    );

    Ok((products, items))
}

/// Send a new absolute quantity and reconcile the cart the service returns.
pub(super) async fn set_quantity(
    client: &ApiClient,
    notifier: &dyn Notifier,
    token: &SecretString,
    catalog: &[Product],
    product_id: &ProductId,
    qty: u32,
) -> Result<Vec<CartLineItem>, FlowError> {
    let qty_text = qty.to_string();
    add_breadcrumb(
        "cart",
        "Cart quantity update",
        Some(&[("product_id", product_id.as_str()), ("qty", &qty_text)]),
    );

    match client.update_cart(token, product_id, qty).await {
        Ok(records) => Ok(reconcile(&records, catalog)),
        Err(e) => {
            report(notifier, &e, messages::UPDATE_CART, ServerMessage::Always);
            Err(e.into())
        }
    }
}

/// Apply a one-step change to a line item.
///
/// The displayed cart is only replaced by the caller once this returns the
/// reconciled result.
pub(super) async fn change_quantity(
    client: &ApiClient,
    notifier: &dyn Notifier,
    token: &SecretString,
    catalog: &[Product],
    item: &CartLineItem,
    change: QuantityChange,
) -> Result<Vec<CartLineItem>, FlowError> {
    debug!(product_id = %item.product_id(), %change, "Quantity change requested");
    set_quantity(
        client,
        notifier,
        token,
        catalog,
        item.product_id(),
        change.apply(item.qty),
    )
    .await
}
