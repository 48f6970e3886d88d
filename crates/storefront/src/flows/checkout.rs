//! Checkout page: order summary, shipping addresses, placing the order.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{info, instrument};

use qkart_core::{
    Address, AddressId, CartLineItem, Product, QuantityChange, total_value, validate_checkout,
};

use super::cart::{LoadingGuard, change_quantity, load_catalog_and_cart};
use super::messages;
use crate::api::ApiClient;
use crate::error::{FlowError, Result, ServerMessage, add_breadcrumb, report};
use crate::notify::{Notification, Notifier};
use crate::session::Session;
use crate::view::{CartMode, CartView};

/// What a successful order leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub total: f64,
    pub remaining_balance: f64,
    pub address_id: AddressId,
}

/// State behind the checkout page.
pub struct CheckoutFlow {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    catalog: Vec<Product>,
    items: Vec<CartLineItem>,
    addresses: Vec<Address>,
    selected: Option<AddressId>,
    loading: watch::Sender<bool>,
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("catalog", &self.catalog.len())
            .field("items", &self.items)
            .field("addresses", &self.addresses)
            .field("selected", &self.selected)
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

impl CheckoutFlow {
    #[must_use]
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            catalog: Vec::new(),
            items: Vec::new(),
            addresses: Vec::new(),
            selected: None,
            loading: watch::Sender::new(false),
        }
    }

    /// Fetch catalog, cart and saved addresses.
    ///
    /// Addresses load alongside the catalog and cart; a failed address fetch
    /// is reported and leaves the list empty.
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the catalog can't be fetched.
    #[instrument(skip_all)]
    pub async fn load(&mut self, session: &Session) -> Result<()> {
        let token = self.require_token(session)?;

        let (loaded, addresses) = {
            let _loading = LoadingGuard::start(&self.loading);
            tokio::join!(
                load_catalog_and_cart(&self.client, &*self.notifier, Some(token)),
                self.client.list_addresses(token)
            )
        };

        match addresses {
            Ok(addresses) => self.set_addresses(addresses),
            Err(e) => {
                report(
                    &*self.notifier,
                    &e,
                    messages::FETCH_ADDRESSES,
                    ServerMessage::Never,
                );
                self.set_addresses(Vec::new());
            }
        }

        let (catalog, items) = loaded?;
        self.catalog = catalog;
        self.items = items;
        Ok(())
    }

    /// Choose the shipping address for the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the address isn't one of the saved addresses.
    pub fn select_address(&mut self, address_id: &AddressId) -> Result<()> {
        if !self.addresses.iter().any(|a| &a.id == address_id) {
            return Err(FlowError::UnknownAddress(address_id.clone()));
        }
        self.selected = Some(address_id.clone());
        Ok(())
    }

    /// Save a new shipping address.
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the service refuses the address.
    #[instrument(skip(self, session, address))]
    pub async fn add_address(&mut self, session: &Session, address: &str) -> Result<()> {
        let token = self.require_token(session)?;

        match self.client.add_address(token, address.trim()).await {
            Ok(addresses) => {
                self.set_addresses(addresses);
                self.notifier
                    .notify(Notification::success(messages::ADDRESS_ADDED));
                Ok(())
            }
            Err(e) => {
                report(
                    &*self.notifier,
                    &e,
                    messages::ADD_ADDRESS,
                    ServerMessage::OnClientError,
                );
                Err(e.into())
            }
        }
    }

    /// Delete a saved address. Deleting the selected address clears the
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the delete fails.
    #[instrument(skip(self, session), fields(address_id = %address_id))]
    pub async fn delete_address(&mut self, session: &Session, address_id: &AddressId) -> Result<()> {
        let token = self.require_token(session)?;

        match self.client.delete_address(token, address_id).await {
            Ok(addresses) => {
                if self.selected.as_ref() == Some(address_id) {
                    self.selected = None;
                }
                self.set_addresses(addresses);
                self.notifier
                    .notify(Notification::success(messages::ADDRESS_DELETED));
                Ok(())
            }
            Err(e) => {
                report(
                    &*self.notifier,
                    &e,
                    messages::DELETE_ADDRESS,
                    ServerMessage::Always,
                );
                Err(e.into())
            }
        }
    }

    /// Step a cart line's quantity from the order summary.
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the update fails.
    #[instrument(skip(self, session, item), fields(product_id = %item.product_id()))]
    pub async fn request_quantity_change(
        &mut self,
        session: &Session,
        item: &CartLineItem,
        change: QuantityChange,
    ) -> Result<()> {
        let token = session.token().ok_or(FlowError::NotLoggedIn)?;
        self.items = change_quantity(
            &self.client,
            &*self.notifier,
            token,
            &self.catalog,
            item,
            change,
        )
        .await?;
        Ok(())
    }

    /// Place the order for the current cart.
    ///
    /// Validates locally first. On success the session's balance is lowered
    /// by the order total; persisting the session is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if a check fails or the service refuses the order.
    #[instrument(skip_all)]
    pub async fn place_order(&mut self, session: &mut Session) -> Result<OrderReceipt> {
        let token = self.require_token(session)?.clone();
        let total = self.total();

        if let Err(e) = validate_checkout(
            total,
            session.balance(),
            &self.addresses,
            self.selected.as_ref(),
        ) {
            self.notifier.notify(Notification::warning(e.to_string()));
            return Err(e.into());
        }
        let Some(address_id) = self.selected.clone() else {
            return Err(qkart_core::CheckoutError::NoAddressSelected.into());
        };

        let total_text = total.to_string();
        add_breadcrumb(
            "checkout",
            "Place order",
            Some(&[("address_id", address_id.as_str()), ("total", &total_text)]),
        );

        self.submit(&token, &address_id).await?;

        session.debit(total);
        self.items.clear();
        self.notifier
            .notify(Notification::success(messages::ORDER_PLACED));
        info!(total, address_id = %address_id, "Order placed");

        Ok(OrderReceipt {
            total,
            remaining_balance: session.balance(),
            address_id,
        })
    }

    async fn submit(&self, token: &SecretString, address_id: &AddressId) -> Result<()> {
        self.client
            .checkout(token, address_id)
            .await
            .map_err(|e| {
                report(&*self.notifier, &e, messages::CHECKOUT, ServerMessage::Always);
                e.into()
            })
    }

    fn require_token<'s>(&self, session: &'s Session) -> Result<&'s SecretString> {
        session.token().ok_or_else(|| {
            self.notifier
                .notify(Notification::warning(messages::LOGIN_FOR_CHECKOUT));
            FlowError::NotLoggedIn
        })
    }

    fn set_addresses(&mut self, addresses: Vec<Address>) {
        if let Some(selected) = &self.selected
            && !addresses.iter().any(|a| &a.id == selected)
        {
            self.selected = None;
        }
        self.addresses = addresses;
    }

    /// Order total for the current cart.
    #[must_use]
    pub fn total(&self) -> f64 {
        total_value(&self.items)
    }

    #[must_use]
    pub fn cart_view(&self) -> CartView {
        CartView::new(&self.items, CartMode::ReadOnly)
    }

    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    #[must_use]
    pub const fn selected(&self) -> Option<&AddressId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Whether the page data is still loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    #[must_use]
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use qkart_core::ProductId;

    use super::*;
    use crate::config::BackendConfig;
    use crate::notify::{RecordingNotifier, Variant};

    fn flow() -> (CheckoutFlow, Arc<RecordingNotifier>) {
        let config = BackendConfig::new(Url::parse("http://127.0.0.1:9/").unwrap());
        let client = ApiClient::new(&config).unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        (CheckoutFlow::new(client, notifier.clone()), notifier)
    }

    fn laptop(qty: u32) -> CartLineItem {
        CartLineItem {
            product: Product {
                id: ProductId::new("p1"),
                name: "Laptop".to_string(),
                category: "Electronics".to_string(),
                cost: 100.0,
                rating: 4,
                image: String::new(),
            },
            qty,
        }
    }

    fn address(id: &str) -> Address {
        Address {
            id: AddressId::new(id),
            address: format!("{id} Main Street, Bengaluru"),
        }
    }

    fn session(balance: f64) -> Session {
        Session::logged_in(SecretString::from("token"), "crio-user", balance)
    }

    #[tokio::test]
    async fn test_load_requires_login() {
        let (mut flow, notifier) = flow();

        let result = flow.load(&Session::default()).await;

        assert!(matches!(result, Err(FlowError::NotLoggedIn)));
        let last = notifier.last().unwrap();
        assert_eq!(last.variant, Variant::Warning);
        assert_eq!(last.message, messages::LOGIN_FOR_CHECKOUT);
    }

    #[tokio::test]
    async fn test_place_order_insufficient_balance_wins() {
        let (mut flow, notifier) = flow();
        flow.items = vec![laptop(2)];
        let mut session = session(150.0);

        let result = flow.place_order(&mut session).await;

        assert!(matches!(
            result,
            Err(FlowError::Checkout(
                qkart_core::CheckoutError::InsufficientBalance
            ))
        ));
        assert_eq!(
            notifier.last().unwrap().message,
            "You do not have enough balance in your wallet for this purchase"
        );
        assert!((session.balance() - 150.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_place_order_needs_address() {
        let (mut flow, notifier) = flow();
        flow.items = vec![laptop(1)];
        let mut session = session(5000.0);

        let result = flow.place_order(&mut session).await;
        assert!(matches!(
            result,
            Err(FlowError::Checkout(qkart_core::CheckoutError::NoAddresses))
        ));

        flow.addresses = vec![address("a1")];
        let result = flow.place_order(&mut session).await;
        assert!(matches!(
            result,
            Err(FlowError::Checkout(
                qkart_core::CheckoutError::NoAddressSelected
            ))
        ));
        assert_eq!(notifier.notifications().len(), 2);
    }

    #[test]
    fn test_select_address() {
        let (mut flow, _) = flow();
        flow.addresses = vec![address("a1"), address("a2")];

        flow.select_address(&AddressId::new("a2")).unwrap();
        assert_eq!(flow.selected(), Some(&AddressId::new("a2")));

        let result = flow.select_address(&AddressId::new("zz"));
        assert!(matches!(result, Err(FlowError::UnknownAddress(_))));
        assert_eq!(flow.selected(), Some(&AddressId::new("a2")));
    }

    #[test]
    fn test_selection_dropped_when_address_disappears() {
        let (mut flow, _) = flow();
        flow.addresses = vec![address("a1"), address("a2")];
        flow.select_address(&AddressId::new("a1")).unwrap();

        flow.set_addresses(vec![address("a2")]);
        assert_eq!(flow.selected(), None);
    }

    #[test]
    fn test_cart_view_is_read_only() {
        let (mut flow, _) = flow();
        flow.items = vec![laptop(2)];

        let view = flow.cart_view();
        assert_eq!(view.mode, CartMode::ReadOnly);
        assert!((flow.total() - 200.0).abs() < f64::EPSILON);
    }
}
