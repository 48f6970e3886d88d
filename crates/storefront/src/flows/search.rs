//! Debounced search-as-you-type.
//!
//! [`SearchTrigger`] sits between a text input and the API: each keystroke
//! calls [`SearchTrigger::input`], and only the text left standing after the
//! quiet period is sent. Results arrive on a channel and are applied to a
//! [`CatalogFlow`](super::CatalogFlow) with
//! [`apply_search_result`](super::CatalogFlow::apply_search_result).

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use qkart_core::Product;

use crate::api::{ApiClient, ApiError};
use crate::debounce::Debouncer;

/// Outcome of one debounced search.
#[derive(Debug)]
pub struct SearchResult {
    /// Text the search ran for.
    pub text: String,
    pub result: Result<Vec<Product>, ApiError>,
}

/// Turns search input into debounced API requests.
#[derive(Debug)]
pub struct SearchTrigger {
    client: ApiClient,
    debouncer: Debouncer,
    results: mpsc::UnboundedSender<SearchResult>,
}

impl SearchTrigger {
    /// Create a trigger and the receiver its results are delivered on.
    #[must_use]
    pub fn new(client: ApiClient, delay: Duration) -> (Self, mpsc::UnboundedReceiver<SearchResult>) {
        let (results, rx) = mpsc::unbounded_channel();
        let trigger = Self {
            client,
            debouncer: Debouncer::new(delay),
            results,
        };
        (trigger, rx)
    }

    /// Record new search text, replacing any search still waiting to fire.
    ///
    /// Blank text is delivered as a result without a request, so the listing
    /// can go back to the full catalog.
    pub fn input(&self, text: impl Into<String>) {
        let text = text.into();
        let client = self.client.clone();
        let results = self.results.clone();

        self.debouncer.trigger(move || async move {
            let trimmed = text.trim();
            let result = if trimmed.is_empty() {
                Ok(Vec::new())
            } else {
                debug!(text = trimmed, "Debounced search firing");
                client.search_products(trimmed).await
            };
            // Receiver gone means nobody is listening anymore
            let _ = results.send(SearchResult { text, result });
        });
    }

    /// Drop the search waiting to fire, if any.
    pub fn cancel_pending(&self) -> bool {
        self.debouncer.cancel_pending()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.debouncer.has_pending()
    }
}
