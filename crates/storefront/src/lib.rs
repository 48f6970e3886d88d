//! QKart storefront client library.
//!
//! Talks to the QKart REST API and keeps the client-side state a storefront
//! front end needs: the session, the catalog, the reconciled cart, and the
//! checkout page. Front ends (the `qkart` CLI, tests) drive the
//! [`flows`] and render [`view`] models; nothing here prints.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod flows;
pub mod notify;
pub mod session;
pub mod view;
