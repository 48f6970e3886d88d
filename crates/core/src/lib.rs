//! QKart Core - Shared types and cart logic.
//!
//! This crate provides the types and pure functions used across all QKart
//! components:
//! - `storefront` - API client, session, and page flows
//! - `cli` - Terminal front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session storage. Every function here can be called with
//! borrowed data and returns freshly built values.
//!
//! # Modules
//!
//! - [`types`] - Products, cart records, line items, addresses
//! - [`cart`] - Cart reconciliation, totals, and quantity changes
//! - [`validation`] - Registration, login, and checkout form checks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;
pub mod validation;

pub use cart::{QuantityChange, is_item_in_cart, item_count, reconcile, total_value};
pub use types::*;
pub use validation::{
    CheckoutError, LoginError, LoginForm, RegistrationError, RegistrationForm, validate_checkout,
    validate_login, validate_registration,
};
