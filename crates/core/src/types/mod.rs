//! Core types for QKart.
//!
//! Wire-compatible representations of the remote service's resources.

pub mod address;
pub mod cart;
pub mod id;
pub mod product;

pub use address::Address;
pub use cart::{CartLineItem, CartRecord};
pub use id::*;
pub use product::Product;
