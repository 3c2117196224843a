//! Field constraints and normalization for contact records.
//!
//! Two explicit steps, run in this order before every write:
//!
//! 1. [`normalize`]: trims strings, lower-cases the email, drops empty
//!    optional values and de-duplicates tags. Never fails.
//! 2. [`validate`]: checks lengths, patterns and required fields, collecting
//!    every violation into a [`ValidationErrors`] map keyed by JSON field
//!    name.
//!
//! Store backends call [`validate`] again on insert and replace, so the rules
//! hold no matter which code path performed the write.

use std::{collections::BTreeMap, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::contact::{ContactFields, ContactSource, ContactStatus, NewNote};

/// Length limits count UTF-16 code units, so an astral-plane character such
/// as an emoji counts twice.
pub const NAME_MAX_LEN: usize = 50;
pub const ORG_FIELD_MAX_LEN: usize = 100;

pub const STATUS_MESSAGE: &str = "Status must be one of: lead, customer, churned";
pub const SOURCE_MESSAGE: &str =
  "Source must be one of: website, referral, ad, other";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$",
  )
  .expect("email pattern compiles")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[0-9\s()+-]+$").expect("phone pattern compiles")
});

// ─── ValidationErrors ────────────────────────────────────────────────────────

/// Field-level validation failures, keyed by camelCase field name.
///
/// Serialises as a flat JSON object: `{"email": "Please provide a valid
/// email address"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
  pub fn new() -> Self { Self::default() }

  /// Record a violation. The first message for a field wins.
  pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
    self.0.entry(field).or_insert_with(|| message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.0.get(field).map(String::as_str)
  }

  /// Fold `other` into `self`, keeping existing messages on collision.
  pub fn merge(&mut self, other: ValidationErrors) {
    for (field, message) in other.0 {
      self.add(field, message);
    }
  }

  /// `Ok(())` if nothing was recorded, otherwise `Err(self)`.
  pub fn into_result(self) -> Result<(), ValidationErrors> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, message) in &self.0 {
      if !first {
        f.write_str("; ")?;
      }
      write!(f, "{field}: {message}")?;
      first = false;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

// ─── Normalization ───────────────────────────────────────────────────────────

/// Bring `fields` into canonical form. Idempotent.
pub fn normalize(fields: &mut ContactFields) {
  trim_in_place(&mut fields.first_name);
  trim_in_place(&mut fields.last_name);
  fields.email = normalize_email(&fields.email);
  normalize_optional(&mut fields.phone);
  normalize_optional(&mut fields.company);
  normalize_optional(&mut fields.job_title);
  fields.tags = dedup_tags(std::mem::take(&mut fields.tags));
}

/// The canonical form of an email address: trimmed and lower-cased.
///
/// Duplicate checks must compare against this form.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// Trim every tag, drop empty ones and remove duplicates, keeping the first
/// occurrence of each.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(tags.len());
  for tag in tags {
    let tag = tag.trim();
    if !tag.is_empty() && !out.iter().any(|t| t == tag) {
      out.push(tag.to_owned());
    }
  }
  out
}

fn trim_in_place(s: &mut String) {
  let trimmed = s.trim();
  if trimmed.len() != s.len() {
    *s = trimmed.to_owned();
  }
}

fn normalize_optional(value: &mut Option<String>) {
  *value = value
    .take()
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty());
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Check every field constraint, returning all violations at once.
pub fn validate(fields: &ContactFields) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::new();

  check_name(&mut errors, "firstName", "First name", &fields.first_name);
  check_name(&mut errors, "lastName", "Last name", &fields.last_name);

  if fields.email.is_empty() {
    errors.add("email", "Email is required");
  } else if !EMAIL_RE.is_match(&fields.email) {
    errors.add("email", "Please provide a valid email address");
  }

  if let Some(phone) = &fields.phone
    && !phone.is_empty()
    && !PHONE_RE.is_match(phone)
  {
    errors.add("phone", "Please provide a valid phone number");
  }

  check_max(
    &mut errors,
    "company",
    "Company name",
    fields.company.as_deref(),
  );
  check_max(
    &mut errors,
    "jobTitle",
    "Job title",
    fields.job_title.as_deref(),
  );

  if fields.status.is_deleted() {
    errors.add("status", STATUS_MESSAGE);
  }

  errors.into_result()
}

fn utf16_len(s: &str) -> usize { s.encode_utf16().count() }

fn check_name(
  errors: &mut ValidationErrors,
  field: &'static str,
  label: &str,
  value: &str,
) {
  let len = utf16_len(value);
  if len == 0 {
    errors.add(field, format!("{label} is required"));
  } else if len > NAME_MAX_LEN {
    errors.add(
      field,
      format!("{label} cannot exceed {NAME_MAX_LEN} characters"),
    );
  }
}

fn check_max(
  errors: &mut ValidationErrors,
  field: &'static str,
  label: &str,
  value: Option<&str>,
) {
  if let Some(v) = value
    && utf16_len(v) > ORG_FIELD_MAX_LEN
  {
    errors.add(
      field,
      format!("{label} cannot exceed {ORG_FIELD_MAX_LEN} characters"),
    );
  }
}

/// A note needs both a text and an author.
pub fn validate_note(note: &NewNote) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::new();
  if note.text.is_empty() {
    errors.add("text", "Note text is required");
  }
  if note.author.is_empty() {
    errors.add("author", "Note author is required");
  }
  errors.into_result()
}

// ─── Enumerated fields ───────────────────────────────────────────────────────

/// Parse a caller-supplied status. `deleted` is not settable and is rejected
/// like any other unknown value.
pub fn parse_status(
  raw: &str,
  errors: &mut ValidationErrors,
) -> Option<ContactStatus> {
  match ContactStatus::from_str(raw.trim()) {
    Ok(status) if !status.is_deleted() => Some(status),
    _ => {
      errors.add("status", STATUS_MESSAGE);
      None
    }
  }
}

/// Parse a caller-supplied source.
pub fn parse_source(
  raw: &str,
  errors: &mut ValidationErrors,
) -> Option<ContactSource> {
  match ContactSource::from_str(raw.trim()) {
    Ok(source) => Some(source),
    Err(_) => {
      errors.add("source", SOURCE_MESSAGE);
      None
    }
  }
}
