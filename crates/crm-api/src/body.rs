//! Request body types for the contact endpoints.
//!
//! String fields accept any JSON scalar: `5` arrives as `"5"`, `true` as
//! `"true"`. Objects and arrays in a string position are rejected as
//! malformed bodies.
//!
//! Fields of [`ContactBody`] keep three states: absent (`None`), explicit
//! `null` (`Some(None)`) and a value (`Some(Some(_))`). An update merges only
//! what the body provides, so `null` clears an optional field and empties a
//! required one.

use crm_core::{
  contact::{ContactPatch, ContactStatus},
  schema::{self, STATUS_MESSAGE, ValidationErrors},
};
use serde::{Deserialize, Deserializer};

// ─── Scalars ──────────────────────────────────────────────────────────────────

/// A JSON scalar read where a string is expected.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
  Text(String),
  Number(serde_json::Number),
  Bool(bool),
}

impl From<Scalar> for String {
  fn from(value: Scalar) -> Self {
    match value {
      Scalar::Text(s) => s,
      Scalar::Number(n) => n.to_string(),
      Scalar::Bool(b) => b.to_string(),
    }
  }
}

/// `tags` may be sent as a single scalar or an array of scalars.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsInput {
  One(Scalar),
  Many(Vec<Scalar>),
}

impl From<TagsInput> for Vec<String> {
  fn from(tags: TagsInput) -> Self {
    match tags {
      TagsInput::One(tag) => vec![tag.into()],
      TagsInput::Many(tags) => tags.into_iter().map(String::from).collect(),
    }
  }
}

fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
  Ok(Option::<Scalar>::deserialize(d)?.map(String::from))
}

/// Only called when the key is present, so `null` becomes `Some(None)`.
fn provided_text<'de, D: Deserializer<'de>>(
  d: D,
) -> Result<Option<Option<String>>, D::Error> {
  text(d).map(Some)
}

fn provided_tags<'de, D: Deserializer<'de>>(
  d: D,
) -> Result<Option<Option<Vec<String>>>, D::Error> {
  Ok(Some(Option::<TagsInput>::deserialize(d)?.map(Vec::from)))
}

// ─── Contact body ─────────────────────────────────────────────────────────────

/// Request body for create and update. Anything else in the body (`id`,
/// `notes`, timestamps) is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactBody {
  #[serde(default, deserialize_with = "provided_text")]
  pub first_name: Option<Option<String>>,
  #[serde(default, deserialize_with = "provided_text")]
  pub last_name:  Option<Option<String>>,
  #[serde(default, deserialize_with = "provided_text")]
  pub email:      Option<Option<String>>,
  #[serde(default, deserialize_with = "provided_text")]
  pub phone:      Option<Option<String>>,
  #[serde(default, deserialize_with = "provided_text")]
  pub company:    Option<Option<String>>,
  #[serde(default, deserialize_with = "provided_text")]
  pub job_title:  Option<Option<String>>,
  #[serde(default, deserialize_with = "provided_text")]
  pub status:     Option<Option<String>>,
  #[serde(default, deserialize_with = "provided_text")]
  pub source:     Option<Option<String>>,
  #[serde(default, deserialize_with = "provided_tags")]
  pub tags:       Option<Option<Vec<String>>>,
}

impl ContactBody {
  /// `true` if the body asks for `status: "deleted"`.
  pub fn requests_deletion(&self) -> bool {
    matches!(
      &self.status,
      Some(Some(s)) if s.trim() == ContactStatus::Deleted.as_str()
    )
  }

  /// Parse the enumerated fields and build a patch holding exactly what the
  /// body provides. Unknown enum values are recorded in `errors` and left out
  /// of the patch.
  pub fn into_patch(self, errors: &mut ValidationErrors) -> ContactPatch {
    ContactPatch {
      first_name: self.first_name.map(Option::unwrap_or_default),
      last_name:  self.last_name.map(Option::unwrap_or_default),
      email:      self.email.map(Option::unwrap_or_default),
      phone:      self.phone,
      company:    self.company,
      job_title:  self.job_title,
      status:     self.status.and_then(|raw| match raw {
        Some(s) => schema::parse_status(&s, errors),
        None => {
          errors.add("status", STATUS_MESSAGE);
          None
        }
      }),
      source:     self.source.and_then(|raw| match raw {
        Some(s) => schema::parse_source(&s, errors).map(Some),
        None => Some(None),
      }),
      tags:       self.tags.map(Option::unwrap_or_default),
    }
  }
}

// ─── Note body ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NoteBody {
  #[serde(default, deserialize_with = "text")]
  pub text:   Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub author: Option<String>,
}
