//! Contact types: the single persisted entity of the CRM.
//!
//! A contact is a mutable document: its scalar fields may be rewritten by an
//! update, its notes only ever grow, and it is never physically removed.
//! Removal is expressed by moving `status` to [`ContactStatus::Deleted`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Where a contact sits in the sales lifecycle.
///
/// `Deleted` is the soft-delete marker. It is only ever written by the
/// dedicated delete operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
  #[default]
  Lead,
  Customer,
  Churned,
  Deleted,
}

impl ContactStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Lead => "lead",
      Self::Customer => "customer",
      Self::Churned => "churned",
      Self::Deleted => "deleted",
    }
  }

  pub fn is_deleted(self) -> bool { matches!(self, Self::Deleted) }
}

impl FromStr for ContactStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    match s {
      "lead" => Ok(Self::Lead),
      "customer" => Ok(Self::Customer),
      "churned" => Ok(Self::Churned),
      "deleted" => Ok(Self::Deleted),
      other => Err(Error::UnknownValue {
        field: "status",
        value: other.to_owned(),
      }),
    }
  }
}

impl fmt::Display for ContactStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// How a contact first reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactSource {
  Website,
  Referral,
  Ad,
  Other,
}

impl ContactSource {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Website => "website",
      Self::Referral => "referral",
      Self::Ad => "ad",
      Self::Other => "other",
    }
  }
}

impl FromStr for ContactSource {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    match s {
      "website" => Ok(Self::Website),
      "referral" => Ok(Self::Referral),
      "ad" => Ok(Self::Ad),
      "other" => Ok(Self::Other),
      other => Err(Error::UnknownValue {
        field: "source",
        value: other.to_owned(),
      }),
    }
  }
}

// ─── Notes ───────────────────────────────────────────────────────────────────

/// A free-text note attached to a contact. Notes are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
  pub id:     Uuid,
  pub text:   String,
  pub author: String,
  pub date:   DateTime<Utc>,
}

/// Input to [`crate::store::ContactStore::append_note`].
/// `id` and `date` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewNote {
  pub text:   String,
  pub author: String,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// The caller-editable part of a contact, shared by inserts, updates and the
/// persisted record. Schema rules in [`crate::schema`] operate on this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
  pub first_name: String,
  pub last_name:  String,
  /// Stored trimmed and lower-cased. Unique across all records, deleted ones
  /// included.
  pub email:      String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub company:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub job_title:  Option<String>,
  #[serde(default)]
  pub status:     ContactStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source:     Option<ContactSource>,
  #[serde(default)]
  pub tags:       Vec<String>,
}

impl ContactFields {
  /// Required fields only; everything else empty and the default status.
  pub fn new(
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    email: impl Into<String>,
  ) -> Self {
    Self {
      first_name: first_name.into(),
      last_name: last_name.into(),
      email: email.into(),
      ..Self::default()
    }
  }
}

/// A persisted contact record.
///
/// `id`, `created_at` and `updated_at` are always set by the store; callers
/// hand it a [`ContactFields`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:         Uuid,
  #[serde(flatten)]
  pub fields:     ContactFields,
  #[serde(default)]
  pub notes:      Vec<Note>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Contact {
  /// Materialise a brand-new record around `fields`.
  pub fn create(fields: ContactFields, id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      id,
      fields,
      notes: Vec::new(),
      created_at: now,
      updated_at: now,
    }
  }

  /// `"<first> <last>"`. Derived on read, never stored.
  pub fn full_name(&self) -> String {
    format!("{} {}", self.fields.first_name, self.fields.last_name)
  }

  pub fn is_deleted(&self) -> bool { self.fields.status.is_deleted() }
}

// ─── ContactPatch ────────────────────────────────────────────────────────────

/// A partial update. `None` means "leave the field as it is".
///
/// Notes are not patchable; see [`crate::store::ContactStore::append_note`].
///
/// The optional fields nest a second `Option`: `Some(None)` clears the field.
#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub email:      Option<String>,
  pub phone:      Option<Option<String>>,
  pub company:    Option<Option<String>>,
  pub job_title:  Option<Option<String>>,
  pub status:     Option<ContactStatus>,
  pub source:     Option<Option<ContactSource>>,
  pub tags:       Option<Vec<String>>,
}

impl ContactPatch {
  /// Overwrite every field of `contact` that this patch provides.
  pub fn apply_to(self, contact: &mut ContactFields) {
    if let Some(v) = self.first_name {
      contact.first_name = v;
    }
    if let Some(v) = self.last_name {
      contact.last_name = v;
    }
    if let Some(v) = self.email {
      contact.email = v;
    }
    if let Some(v) = self.phone {
      contact.phone = v;
    }
    if let Some(v) = self.company {
      contact.company = v;
    }
    if let Some(v) = self.job_title {
      contact.job_title = v;
    }
    if let Some(v) = self.status {
      contact.status = v;
    }
    if let Some(v) = self.source {
      contact.source = v;
    }
    if let Some(v) = self.tags {
      contact.tags = v;
    }
  }
}
