//! JSON REST API for CRM contacts.
//!
//! Exposes an axum [`Router`] backed by any [`crm_core::store::ContactStore`].
//! Auth, TLS, rate limiting and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", crm_api::api_router(store.clone()))
//! ```

pub mod body;
pub mod contacts;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch},
};
use crm_core::store::ContactStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ContactStore + 'static,
{
  Router::new()
    .route(
      "/contacts",
      get(contacts::list::<S>).post(contacts::create::<S>),
    )
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S>)
        .put(contacts::update::<S>)
        .delete(contacts::remove::<S>),
    )
    .route("/contacts/{id}/notes", patch(contacts::add_note::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
