//! Core types and trait definitions for the CRM contact service.
//!
//! No HTTP or database dependencies live here.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod contact;
pub mod error;
pub mod query;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
