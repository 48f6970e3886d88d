//! Product listing page: catalog, search, and the cart sidebar.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument};

use qkart_core::{CartLineItem, Product, ProductId, QuantityChange, is_item_in_cart};

use super::cart::{LoadingGuard, change_quantity, load_catalog_and_cart, set_quantity};
use super::messages;
use super::search::SearchResult;
use crate::api::ApiClient;
use crate::error::{FlowError, Result, ServerMessage, add_breadcrumb, report};
use crate::notify::{Notification, Notifier};
use crate::session::Session;
use crate::view::{CartMode, CartView};

/// State behind the product listing page.
pub struct CatalogFlow {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    /// Full product list, the reconciliation source.
    catalog: Vec<Product>,
    /// What is currently listed: the catalog or the latest search result.
    products: Vec<Product>,
    items: Vec<CartLineItem>,
    loading: watch::Sender<bool>,
}

impl std::fmt::Debug for CatalogFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogFlow")
            .field("catalog", &self.catalog.len())
            .field("products", &self.products.len())
            .field("items", &self.items)
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

impl CatalogFlow {
    #[must_use]
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            catalog: Vec::new(),
            products: Vec::new(),
            items: Vec::new(),
            loading: watch::Sender::new(false),
        }
    }

    /// Fetch the catalog and, when logged in, the cart.
    ///
    /// Both requests run concurrently; the cart is reconciled once both have
    /// resolved. A failed cart fetch leaves the cart empty without failing
    /// the load.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog can't be fetched.
    #[instrument(skip_all, fields(logged_in = session.is_logged_in()))]
    pub async fn load(&mut self, session: &Session) -> Result<()> {
        let loaded = {
            let _loading = LoadingGuard::start(&self.loading);
            load_catalog_and_cart(&self.client, &*self.notifier, session.token()).await
        };

        let (catalog, items) = loaded?;
        self.products.clone_from(&catalog);
        self.catalog = catalog;
        self.items = items;
        Ok(())
    }

    /// Search the catalog by name or category.
    ///
    /// Empty (or blank) text restores the full catalog without a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails.
    #[instrument(skip(self))]
    pub async fn search(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            self.clear_search();
            return Ok(());
        }

        let result = self.client.search_products(text).await;
        self.apply_search_result(SearchResult {
            text: text.to_string(),
            result,
        })
    }

    /// Show results produced by a debounced search.
    ///
    /// # Errors
    ///
    /// Returns the search request's error, already reported to the user.
    pub fn apply_search_result(&mut self, search: SearchResult) -> Result<()> {
        if search.text.trim().is_empty() {
            self.clear_search();
            return Ok(());
        }

        match search.result {
            Ok(products) => {
                debug!(text = %search.text, results = products.len(), "Search results");
                if products.is_empty() {
                    self.notifier
                        .notify(Notification::warning(messages::NO_PRODUCTS));
                }
                self.products = products;
                Ok(())
            }
            Err(e) => {
                report(
                    &*self.notifier,
                    &e,
                    messages::SEARCH_PRODUCTS,
                    ServerMessage::Never,
                );
                Err(e.into())
            }
        }
    }

    /// List the full catalog again.
    pub fn clear_search(&mut self) {
        self.products.clone_from(&self.catalog);
    }

    /// Put a product in the cart with quantity 1.
    ///
    /// Needs a logged-in session and refuses products already in the cart;
    /// both cases warn the user and make no request.
    ///
    /// # Errors
    ///
    /// Returns an error if a guard refuses the product or the update fails.
    #[instrument(skip(self, session), fields(product_id = %product_id))]
    pub async fn add_to_cart(&mut self, session: &Session, product_id: &ProductId) -> Result<()> {
        let Some(token) = session.token() else {
            self.notifier
                .notify(Notification::warning(messages::LOGIN_TO_ADD));
            return Err(FlowError::NotLoggedIn);
        };

        if is_item_in_cart(&self.items, product_id) {
            self.notifier
                .notify(Notification::warning(messages::ITEM_IN_CART));
            return Err(FlowError::AlreadyInCart(product_id.clone()));
        }

        if !self.catalog.iter().any(|product| &product.id == product_id) {
            return Err(FlowError::UnknownProduct(product_id.clone()));
        }

        add_breadcrumb("cart", "Add to cart", Some(&[("product_id", product_id.as_str())]));
        self.items = set_quantity(
            &self.client,
            &*self.notifier,
            token,
            &self.catalog,
            product_id,
            1,
        )
        .await?;
        info!(product_id = %product_id, "Added to cart");
        Ok(())
    }

    /// Step a cart line's quantity up or down.
    ///
    /// The displayed cart only changes once the service answers.
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

    /// Look up a cart line by product.
    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product_id() == product_id)
    }

    /// Drop the cached catalog so the next load hits the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog can't be fetched.
    pub async fn refresh(&mut self, session: &Session) -> Result<()> {
        self.client.invalidate_catalog().await;
        self.load(session).await
    }

    #[must_use]
    pub fn cart_view(&self) -> CartView {
        CartView::new(&self.items, CartMode::Editable)
    }

    /// Products currently listed.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Whether a catalog load is in progress.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Follow the loading state from another task while a load runs.
    #[must_use]
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }
}
