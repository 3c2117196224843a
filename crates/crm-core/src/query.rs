//! Listing query types: filter, sort specification and pagination.

use serde::Serialize;

use crate::contact::{Contact, ContactStatus};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

// ─── Pagination ──────────────────────────────────────────────────────────────

/// A 1-based page request with the limit clamped into `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  page:  u32,
  limit: u32,
}

impl PageRequest {
  /// Clamp raw (possibly out-of-range) values: `page` floors at 1, `limit`
  /// lands in `1..=MAX_LIMIT`.
  pub fn clamped(page: i64, limit: i64) -> Self {
    let page = page.clamp(1, i64::from(u32::MAX)) as u32;
    let limit = limit.clamp(1, i64::from(MAX_LIMIT)) as u32;
    Self { page, limit }
  }

  pub fn page(&self) -> u32 { self.page }

  pub fn limit(&self) -> u32 { self.limit }

  /// Number of matching records to skip: `(page - 1) * limit`.
  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.limit)
  }

  /// Pagination metadata for a result set of `total` matches.
  pub fn meta(&self, total: u64) -> Pagination {
    Pagination {
      total,
      page: self.page,
      limit: self.limit,
      total_pages: total.div_ceil(u64::from(self.limit)),
    }
  }
}

impl Default for PageRequest {
  fn default() -> Self {
    Self {
      page:  DEFAULT_PAGE,
      limit: DEFAULT_LIMIT,
    }
  }
}

/// The `pagination` object of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub total:       u64,
  pub page:        u32,
  pub limit:       u32,
  pub total_pages: u64,
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

/// A field contacts can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
  CreatedAt,
  UpdatedAt,
  FirstName,
  LastName,
  Email,
  Company,
  JobTitle,
  Status,
}

impl SortField {
  /// Resolve the camelCase JSON name of a field.
  pub fn from_name(name: &str) -> Option<Self> {
    Some(match name {
      "createdAt" => Self::CreatedAt,
      "updatedAt" => Self::UpdatedAt,
      "firstName" => Self::FirstName,
      "lastName" => Self::LastName,
      "email" => Self::Email,
      "company" => Self::Company,
      "jobTitle" => Self::JobTitle,
      "status" => Self::Status,
      _ => return None,
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
  Ascending,
  Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
  pub field:     SortField,
  pub direction: SortDirection,
}

/// An ordered list of sort keys, most significant first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec(Vec<SortKey>);

impl SortSpec {
  /// Parse `"-createdAt"`, `"lastName firstName"` or `"status,-updatedAt"`.
  ///
  /// A leading `-` sorts descending, an optional `+` ascending. Unknown and
  /// repeated fields are skipped. If nothing usable remains the default
  /// (newest first) is returned.
  pub fn parse(spec: &str) -> Self {
    let mut keys: Vec<SortKey> = Vec::new();
    for token in spec.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty())
    {
      let (direction, name) = match token.strip_prefix('-') {
        Some(rest) => (SortDirection::Descending, rest),
        None => (
          SortDirection::Ascending,
          token.strip_prefix('+').unwrap_or(token),
        ),
      };
      if let Some(field) = SortField::from_name(name)
        && !keys.iter().any(|k| k.field == field)
      {
        keys.push(SortKey { field, direction });
      }
    }
    if keys.is_empty() { Self::default() } else { Self(keys) }
  }

  pub fn keys(&self) -> &[SortKey] { &self.0 }

  /// Direction of the most significant key; ties beyond the listed keys are
  /// broken by insertion order in this direction.
  pub fn primary_direction(&self) -> SortDirection {
    self.0.first().map_or(SortDirection::Descending, |k| k.direction)
  }
}

impl Default for SortSpec {
  fn default() -> Self {
    Self(vec![SortKey {
      field:     SortField::CreatedAt,
      direction: SortDirection::Descending,
    }])
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::ContactStore::list`].
///
/// Deleted contacts are never matched, whatever `status` says.
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
  /// Restrict to one (non-deleted) status.
  pub status: Option<ContactStatus>,
  /// Match contacts carrying at least one of these tags. Empty = no filter.
  pub tags:   Vec<String>,
  pub sort:   SortSpec,
  pub page:   PageRequest,
}

/// One page of listing results.
#[derive(Debug, Clone, Default)]
pub struct ContactPage {
  pub contacts: Vec<Contact>,
  /// Number of matches before paging.
  pub total:    u64,
}
