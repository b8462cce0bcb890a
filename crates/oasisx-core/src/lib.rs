//! OasisX Core Library
//!
//! Order hashing and signing, exchange and crowdfunding contract bindings,
//! deployment helpers and test utilities for the OasisX contracts.

pub mod api;
pub mod config;
pub mod error;
pub mod signing;
pub mod testing;

pub use error::{Error, Result};
