//! Handlers for `/contacts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contacts` | `?page`, `?limit`, `?status`, `?tags`, `?sort`; never lists deleted contacts |
//! | `GET`    | `/contacts/:id` | 404 if absent or deleted |
//! | `POST`   | `/contacts` | Body: [`ContactBody`]; returns 201 + stored contact |
//! | `PUT`    | `/contacts/:id` | Body: [`ContactBody`]; merges provided fields |
//! | `DELETE` | `/contacts/:id` | Soft delete: sets `status` to `deleted` |
//! | `PATCH`  | `/contacts/:id/notes` | Body: `{"text":"...","author":"..."}` |
//!
//! Successful responses wrap the record as `{"data": ...}`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use crm_core::{
  contact::{Contact, ContactFields, ContactStatus, NewNote},
  query::{
    ContactQuery, DEFAULT_LIMIT, DEFAULT_PAGE, PageRequest, Pagination, SortSpec,
  },
  schema::{self, ValidationErrors},
  store::ContactStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  body::{ContactBody, NoteBody},
  error::{ApiError, DUPLICATE_EMAIL, INVALID_CONTACT_ID},
};

// ─── Response shapes ──────────────────────────────────────────────────────────

/// A contact as rendered to clients: the stored record plus `fullName`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
  #[serde(flatten)]
  pub contact:   Contact,
  pub full_name: String,
}

impl From<Contact> for ContactView {
  fn from(contact: Contact) -> Self {
    let full_name = contact.full_name();
    Self { contact, full_name }
  }
}

#[derive(Debug, Serialize)]
pub struct DataBody<T> {
  pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ListBody {
  pub data:       Vec<ContactView>,
  pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct DeletedBody {
  pub message: &'static str,
  pub data:    ContactView,
}

fn data(contact: Contact) -> Json<DataBody<ContactView>> {
  Json(DataBody {
    data: contact.into(),
  })
}

/// Parse a path id, rejecting anything that is not a UUID.
fn parse_id(id: Result<Path<String>, PathRejection>) -> Result<Uuid, ApiError> {
  let Path(raw) = id?;
  Uuid::parse_str(&raw)
    .map_err(|_| ApiError::BadRequest(INVALID_CONTACT_ID.to_owned()))
}

/// The leading integer of `raw`, read the way a lenient query parser reads
/// `5abc` as 5 and `2.0` as 2. `None` if `raw` does not start with a digit.
fn leading_int(raw: &str) -> Option<i64> {
  let s = raw.trim_start();
  let (sign, digits) = match s.strip_prefix('-') {
    Some(rest) => (-1, rest),
    None => (1, s.strip_prefix('+').unwrap_or(s)),
  };
  let end = digits
    .find(|c: char| !c.is_ascii_digit())
    .unwrap_or(digits.len());
  if end == 0 {
    return None;
  }
  Some(sign * digits[..end].parse::<i64>().unwrap_or(i64::MAX))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// Listing parameters after lenient parsing of the query string.
#[derive(Debug)]
pub struct ListParams {
  pub query: ContactQuery,
  /// The request named a status no contact can have.
  pub matches_nothing: bool,
}

impl ListParams {
  /// Build from raw `key=value` pairs. Repeated keys are allowed; for scalar
  /// keys the last occurrence wins, `tags` values accumulate.
  pub fn from_pairs(pairs: &[(String, String)]) -> Self {
    let mut page = i64::from(DEFAULT_PAGE);
    let mut limit = i64::from(DEFAULT_LIMIT);
    let mut query = ContactQuery::default();
    let mut matches_nothing = false;

    for (key, value) in pairs {
      match key.as_str() {
        "page" => page = leading_int(value).unwrap_or(i64::from(DEFAULT_PAGE)),
        "limit" => {
          limit = leading_int(value).unwrap_or(i64::from(DEFAULT_LIMIT));
        }
        "status" => {
          let value = value.trim();
          query.status = None;
          matches_nothing = false;
          if value.is_empty() {
            continue;
          }
          match value.parse::<ContactStatus>() {
            Ok(status) if status.is_deleted() => {
              tracing::debug!("ignoring status=deleted filter");
            }
            Ok(status) => query.status = Some(status),
            Err(_) => matches_nothing = true,
          }
        }
        "tags" => query.tags.extend(
          value
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned),
        ),
        "sort" => query.sort = SortSpec::parse(value),
        _ => {}
      }
    }

    query.page = PageRequest::clamped(page, limit);
    Self {
      query,
      matches_nothing,
    }
  }
}

/// `GET /contacts[?page=&limit=&status=&tags=&sort=]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ListBody>, ApiError>
where
  S: ContactStore,
{
  let ListParams {
    query,
    matches_nothing,
  } = ListParams::from_pairs(&pairs);

  if matches_nothing {
    tracing::debug!("unknown status filter, returning an empty page");
    return Ok(Json(ListBody {
      data:       Vec::new(),
      pagination: query.page.meta(0),
    }));
  }

  let page = store.list(&query).await.map_err(ApiError::from_store)?;

  Ok(Json(ListBody {
    data:       page.contacts.into_iter().map(ContactView::from).collect(),
    pagination: query.page.meta(page.total),
  }))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /contacts/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<String>, PathRejection>,
) -> Result<Json<DataBody<ContactView>>, ApiError>
where
  S: ContactStore,
{
  let id = parse_id(id)?;
  let contact = store
    .get(id)
    .await
    .map_err(ApiError::from_store)?
    .filter(|c| !c.is_deleted())
    .ok_or_else(ApiError::contact_not_found)?;
  Ok(data(contact))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// Normalize `fields`, then validate them, folding in any enum parse errors
/// collected beforehand.
fn checked(
  fields: &mut ContactFields,
  mut errors: ValidationErrors,
) -> Result<(), ApiError> {
  schema::normalize(fields);
  if let Err(field_errors) = schema::validate(fields) {
    errors.merge(field_errors);
  }
  errors.into_result().map_err(ApiError::Validation)
}

/// A field the body provides with a non-empty value.
fn provided(field: &Option<Option<String>>) -> Option<&str> {
  field.as_ref()?.as_deref().filter(|s| !s.is_empty())
}

/// `POST /contacts`: body [`ContactBody`]
pub async fn create<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<ContactBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ContactStore,
{
  let Json(body) = body?;

  let (Some(_), Some(_), Some(email)) = (
    provided(&body.first_name),
    provided(&body.last_name),
    provided(&body.email),
  ) else {
    return Err(ApiError::BadRequest(
      "firstName, lastName, and email are required".to_owned(),
    ));
  };

  let email = schema::normalize_email(email);
  if store
    .find_by_email(&email)
    .await
    .map_err(ApiError::from_store)?
    .is_some()
  {
    tracing::debug!(%email, "create rejected: email taken");
    return Err(ApiError::Conflict(DUPLICATE_EMAIL.to_owned()));
  }

  let mut errors = ValidationErrors::new();
  let mut fields = ContactFields::default();
  body.into_patch(&mut errors).apply_to(&mut fields);
  checked(&mut fields, errors)?;

  let contact = store.insert(fields).await.map_err(ApiError::from_store)?;
  tracing::info!(id = %contact.id, "contact created");

  Ok((StatusCode::CREATED, data(contact)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /contacts/:id`: body [`ContactBody`]
pub async fn update<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<String>, PathRejection>,
  body: Result<Json<ContactBody>, JsonRejection>,
) -> Result<Json<DataBody<ContactView>>, ApiError>
where
  S: ContactStore,
{
  let id = parse_id(id)?;
  let Json(body) = body?;

  let mut contact = store
    .get(id)
    .await
    .map_err(ApiError::from_store)?
    .filter(|c| !c.is_deleted())
    .ok_or_else(ApiError::contact_not_found)?;

  if body.requests_deletion() {
    return Err(ApiError::BadRequest(
      "Use DELETE endpoint to remove a contact".to_owned(),
    ));
  }

  let previous_email = contact.fields.email.clone();
  let mut errors = ValidationErrors::new();
  body.into_patch(&mut errors).apply_to(&mut contact.fields);
  checked(&mut contact.fields, errors)?;

  if contact.fields.email != previous_email
    && store
      .find_by_email(&contact.fields.email)
      .await
      .map_err(ApiError::from_store)?
      .is_some_and(|other| other.id != id)
  {
    return Err(ApiError::Conflict(DUPLICATE_EMAIL.to_owned()));
  }

  let updated = store
    .replace(&contact)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(ApiError::contact_not_found)?;
  tracing::debug!(%id, "contact updated");

  Ok(data(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /contacts/:id`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<String>, PathRejection>,
) -> Result<Json<DeletedBody>, ApiError>
where
  S: ContactStore,
{
  let id = parse_id(id)?;
  let contact = store
    .mark_deleted(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(ApiError::contact_not_found)?;
  tracing::info!(%id, "contact deleted");

  Ok(Json(DeletedBody {
    message: "Contact deleted successfully",
    data:    contact.into(),
  }))
}

// ─── Notes ────────────────────────────────────────────────────────────────────

/// `PATCH /contacts/:id/notes`: body `{"text":"...","author":"..."}`
pub async fn add_note<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<String>, PathRejection>,
  body: Result<Json<NoteBody>, JsonRejection>,
) -> Result<Json<DataBody<ContactView>>, ApiError>
where
  S: ContactStore,
{
  let Json(body) = body?;
  let (Some(text), Some(author)) = (
    body.text.filter(|s| !s.is_empty()),
    body.author.filter(|s| !s.is_empty()),
  ) else {
    return Err(ApiError::BadRequest(
      "text and author are required for a note".to_owned(),
    ));
  };

  let id = parse_id(id)?;
  let contact = store
    .append_note(id, NewNote { text, author })
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(ApiError::contact_not_found)?;
  tracing::debug!(%id, notes = contact.notes.len(), "note added");

  Ok(data(contact))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect()
  }

  #[test]
  fn list_params_default() {
    let p = ListParams::from_pairs(&[]);
    assert_eq!(p.query.page, PageRequest::default());
    assert_eq!(p.query.sort, SortSpec::default());
    assert!(p.query.status.is_none());
    assert!(!p.matches_nothing);
  }

  #[test]
  fn list_params_clamp_and_fall_back() {
    let p = ListParams::from_pairs(&pairs(&[("page", "0"), ("limit", "500")]));
    assert_eq!(p.query.page.page(), 1);
    assert_eq!(p.query.page.limit(), 100);

    let p = ListParams::from_pairs(&pairs(&[("page", "two"), ("limit", "x")]));
    assert_eq!(p.query.page, PageRequest::default());
  }

  #[test]
  fn list_params_read_leading_integers() {
    let p = ListParams::from_pairs(&pairs(&[("limit", "5abc"), ("page", "2.0")]));
    assert_eq!(p.query.page.limit(), 5);
    assert_eq!(p.query.page.page(), 2);

    assert_eq!(leading_int(" 42"), Some(42));
    assert_eq!(leading_int("-3"), Some(-3));
    assert_eq!(leading_int("+7x"), Some(7));
    assert_eq!(leading_int("99999999999999999999"), Some(i64::MAX));
    assert_eq!(leading_int("abc"), None);
    assert_eq!(leading_int("-"), None);
    assert_eq!(leading_int(""), None);
  }

  #[test]
  fn list_params_collect_tags() {
    let p = ListParams::from_pairs(&pairs(&[
      ("tags", "vip, b2b"),
      ("tags", "new"),
      ("tags", ""),
    ]));
    assert_eq!(p.query.tags, ["vip", "b2b", "new"]);
  }

  #[test]
  fn list_params_status_handling() {
    let p = ListParams::from_pairs(&pairs(&[("status", "deleted")]));
    assert!(p.query.status.is_none());
    assert!(!p.matches_nothing);

    let p = ListParams::from_pairs(&pairs(&[("status", "churned")]));
    assert_eq!(p.query.status, Some(ContactStatus::Churned));

    let p = ListParams::from_pairs(&pairs(&[("status", "archived")]));
    assert!(p.matches_nothing);
  }

  #[test]
  fn view_adds_full_name() {
    let contact = Contact::create(
      ContactFields::new("Ann", "Lee", "ann@x.com"),
      Uuid::new_v4(),
      chrono::Utc::now(),
    );
    let json = serde_json::to_value(ContactView::from(contact)).unwrap();
    assert_eq!(json["fullName"], "Ann Lee");
    assert_eq!(json["firstName"], "Ann");
    assert!(json["id"].is_string());
  }
}
