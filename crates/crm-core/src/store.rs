//! The `ContactStore` trait and store error classification.
//!
//! The trait is implemented by storage backends (e.g. `crm-store-sqlite`).
//! Higher layers (`crm-api`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error,
  contact::{Contact, ContactFields, NewNote},
  query::{ContactPage, ContactQuery},
  schema::ValidationErrors,
};

// ─── Error classification ────────────────────────────────────────────────────

/// What kind of failure a store error represents, as far as callers care.
#[derive(Debug, Clone, Copy)]
pub enum ErrorClass<'a> {
  /// The write collided with the unique email index.
  DuplicateEmail,
  /// The record failed schema validation at the persistence boundary.
  Invalid(&'a ValidationErrors),
  /// Anything else: I/O, corruption, a closed connection.
  Other,
}

/// Implemented by every backend error type so handlers can map failures to
/// responses without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn class(&self) -> ErrorClass<'_>;
}

impl StoreError for Error {
  fn class(&self) -> ErrorClass<'_> {
    match self {
      Error::Validation(errors) => ErrorClass::Invalid(errors),
      Error::DuplicateEmail(_) => ErrorClass::DuplicateEmail,
      Error::UnknownValue { .. } => ErrorClass::Other,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a contact document store.
///
/// Contacts are never physically removed. Deletion is a status change made
/// only through [`ContactStore::mark_deleted`]. Notes are append-only.
///
/// Implementations must run [`crate::schema::validate`] on every insert and
/// replace, and must enforce email uniqueness across all records.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: StoreError;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate and persist a new contact. The store assigns the id and both
  /// timestamps.
  fn insert(
    &self,
    fields: ContactFields,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Validate and overwrite the editable fields of a non-deleted contact,
  /// refreshing `updated_at`. Notes and `created_at` are left untouched.
  ///
  /// Returns `None` if no non-deleted contact has `contact.id`.
  fn replace<'a>(
    &'a self,
    contact: &'a Contact,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + 'a;

  /// Set `status = deleted` unconditionally. Returns `None` only if no
  /// contact has `id`.
  fn mark_deleted(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Append a note (store-assigned id, `date = now`) to a non-deleted
  /// contact. Returns `None` if no non-deleted contact has `id`.
  fn append_note(
    &self,
    id: Uuid,
    note: NewNote,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a contact by id, whatever its status.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Retrieve a contact by its (already normalized) email, whatever its
  /// status.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + 'a;

  /// One page of non-deleted contacts matching `query`, plus the total
  /// number of matches.
  fn list<'a>(
    &'a self,
    query: &'a ContactQuery,
  ) -> impl Future<Output = Result<ContactPage, Self::Error>> + Send + 'a;
}
