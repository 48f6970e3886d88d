//! Page flows: fetch, reconcile, mutate.
//!
//! Each flow owns the state one storefront page needs and talks to the
//! remote service through an [`ApiClient`](crate::api::ApiClient). Every
//! operation takes `&mut self`, so a flow can't be re-entered while one of
//! its requests is in flight. The session is passed in explicitly; flows
//! never keep their own copy.
//!
//! - [`CatalogFlow`] - product listing, search, add-to-cart, cart sidebar
//! - [`CheckoutFlow`] - addresses, order summary, placing the order
//! - [`AuthFlow`] - register, login, logout

mod auth;
mod cart;
mod catalog;
mod checkout;
mod search;

pub use auth::AuthFlow;
pub use catalog::CatalogFlow;
pub use checkout::{CheckoutFlow, OrderReceipt};
pub use search::{SearchResult, SearchTrigger};

/// Text shown to the user by the flows.
pub mod messages {
    pub const FETCH_PRODUCTS: &str = "Could not fetch products. Check that the backend is running, reachable and returns valid JSON.";
    pub const SEARCH_PRODUCTS: &str = "Could not search products. Check that the backend is running, reachable and returns valid JSON.";
    pub const FETCH_CART: &str = "Could not fetch cart details. Check that the backend is running, reachable and returns valid JSON.";
    pub const UPDATE_CART: &str = "Could not update cart. Check that the backend is running, reachable and returns valid JSON.";
    pub const FETCH_ADDRESSES: &str = "Could not fetch addresses. Check that the backend is running, reachable and returns valid JSON.";
    pub const ADD_ADDRESS: &str = "Could not add this address. Check that the backend is running, reachable and returns valid JSON.";
    pub const DELETE_ADDRESS: &str = "Could not delete this address. Check that the backend is running, reachable and returns valid JSON.";
    pub const CHECKOUT: &str = "Something went wrong. Check that the backend is running, reachable and returns valid JSON.";
    pub const AUTH: &str = "Something went wrong. Check that the backend is running, reachable and returns valid JSON.";

    pub const NO_PRODUCTS: &str = "No products found";
    pub const LOGIN_TO_ADD: &str = "Login to add an item to the Cart";
    pub const ITEM_IN_CART: &str =
        "Item already in cart. Use the cart sidebar to update quantity or remove item.";
    pub const LOGIN_FOR_CHECKOUT: &str = "You must be logged in to access checkout page";

    pub const ADDRESS_ADDED: &str = "Address added";
    pub const ADDRESS_DELETED: &str = "Address deleted";
    pub const ORDER_PLACED: &str = "Order placed successfully";
    pub const REGISTERED: &str = "Registered Successfully";
    pub const LOGGED_IN: &str = "Logged in successfully";
    pub const LOGGED_OUT: &str = "Logged Out";
}
