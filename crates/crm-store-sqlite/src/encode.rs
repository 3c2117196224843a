//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! Tags are stored as a compact JSON array. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use crm_core::{
  contact::{Contact, ContactFields, ContactSource, ContactStatus, Note},
  query::{SortDirection, SortField},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store persists.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ─────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<ContactStatus> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "status",
    value:  s.to_owned(),
  })
}

pub fn decode_source(s: &str) -> Result<ContactSource> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "source",
    value:  s.to_owned(),
  })
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

pub fn sort_column(field: SortField) -> &'static str {
  match field {
    SortField::CreatedAt => "created_at",
    SortField::UpdatedAt => "updated_at",
    SortField::FirstName => "first_name",
    SortField::LastName => "last_name",
    SortField::Email => "email",
    SortField::Company => "company",
    SortField::JobTitle => "job_title",
    SortField::Status => "status",
  }
}

pub fn sort_keyword(direction: SortDirection) -> &'static str {
  match direction {
    SortDirection::Ascending => "ASC",
    SortDirection::Descending => "DESC",
  }
}

// ─── Column values ───────────────────────────────────────────────────────────

/// The editable columns of a `contacts` row, encoded for binding.
pub struct FieldColumns {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub phone:      Option<String>,
  pub company:    Option<String>,
  pub job_title:  Option<String>,
  pub status:     &'static str,
  pub source:     Option<&'static str>,
  pub tags:       String,
}

impl FieldColumns {
  pub fn encode(f: &ContactFields) -> Result<Self> {
    Ok(Self {
      first_name: f.first_name.clone(),
      last_name:  f.last_name.clone(),
      email:      f.email.clone(),
      phone:      f.phone.clone(),
      company:    f.company.clone(),
      job_title:  f.job_title.clone(),
      status:     f.status.as_str(),
      source:     f.source.map(ContactSource::as_str),
      tags:       encode_tags(&f.tags)?,
    })
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawContact::from_row`].
pub const CONTACT_COLUMNS: &str = "contact_id, first_name, last_name, email, \
                                   phone, company, job_title, status, source, \
                                   tags, created_at, updated_at";

/// Raw strings read directly from a `contacts` row plus its `notes` rows.
pub struct RawContact {
  pub contact_id: String,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub phone:      Option<String>,
  pub company:    Option<String>,
  pub job_title:  Option<String>,
  pub status:     String,
  pub source:     Option<String>,
  pub tags:       String,
  pub created_at: String,
  pub updated_at: String,
  pub notes:      Vec<RawNote>,
}

impl RawContact {
  /// Read the [`CONTACT_COLUMNS`] of `row`. Notes are attached separately.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contact_id: row.get(0)?,
      first_name: row.get(1)?,
      last_name:  row.get(2)?,
      email:      row.get(3)?,
      phone:      row.get(4)?,
      company:    row.get(5)?,
      job_title:  row.get(6)?,
      status:     row.get(7)?,
      source:     row.get(8)?,
      tags:       row.get(9)?,
      created_at: row.get(10)?,
      updated_at: row.get(11)?,
      notes:      Vec::new(),
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    let fields = ContactFields {
      first_name: self.first_name,
      last_name:  self.last_name,
      email:      self.email,
      phone:      self.phone,
      company:    self.company,
      job_title:  self.job_title,
      status:     decode_status(&self.status)?,
      source:     self.source.as_deref().map(decode_source).transpose()?,
      tags:       decode_tags(&self.tags)?,
    };

    Ok(Contact {
      id: decode_uuid(&self.contact_id)?,
      fields,
      notes: self
        .notes
        .into_iter()
        .map(RawNote::into_note)
        .collect::<Result<_>>()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `notes` row.
pub struct RawNote {
  pub note_id: String,
  pub text:    String,
  pub author:  String,
  pub date:    String,
}

impl RawNote {
  pub fn into_note(self) -> Result<Note> {
    Ok(Note {
      id:     decode_uuid(&self.note_id)?,
      text:   self.text,
      author: self.author,
      date:   decode_dt(&self.date)?,
    })
  }
}
