//! Error types for `crm-core`.

use thiserror::Error;

use crate::schema::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("a contact with email {0:?} already exists")]
  DuplicateEmail(String),

  /// A string that names no variant of a closed enumeration.
  #[error("unknown {field} value: {value:?}")]
  UnknownValue {
    field: &'static str,
    value: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
