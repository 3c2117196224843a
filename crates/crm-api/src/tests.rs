//! Router-level tests: full request/response cycles against an in-memory
//! SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode},
};
use crm_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  api_router(Arc::new(store))
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      req = req.header("content-type", "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

async fn create(app: &Router, body: Value) -> Value {
  let (status, json) = send(app, Method::POST, "/contacts", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{json}");
  json["data"].clone()
}

fn ann() -> Value {
  json!({ "firstName": "Ann", "lastName": "Lee", "email": "Ann.Lee@X.com" })
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_normalizes_and_get_returns_full_name() {
  let app = app().await;
  let created = create(&app, ann()).await;

  assert_eq!(created["email"], "ann.lee@x.com");
  assert_eq!(created["status"], "lead");
  assert_eq!(created["notes"], json!([]));
  assert!(created["createdAt"].is_string());

  let id = created["id"].as_str().unwrap();
  let (status, json) =
    send(&app, Method::GET, &format!("/contacts/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(json["data"]["fullName"], "Ann Lee");
  assert_eq!(json["data"]["email"], "ann.lee@x.com");
}

#[tokio::test]
async fn create_requires_core_fields() {
  let app = app().await;
  let (status, json) = send(
    &app,
    Method::POST,
    "/contacts",
    Some(json!({ "firstName": "Ann", "email": "ann@x.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(json["message"], "firstName, lastName, and email are required");
}

#[tokio::test]
async fn create_duplicate_email_in_any_casing_conflicts() {
  let app = app().await;
  create(&app, ann()).await;

  let (status, json) = send(
    &app,
    Method::POST,
    "/contacts",
    Some(json!({ "firstName": "A", "lastName": "L", "email": "  ANN.LEE@x.com " })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(json["message"], "A contact with this email already exists");
}

#[tokio::test]
async fn create_conflicts_with_deleted_contact_email() {
  let app = app().await;
  let id = create(&app, ann()).await["id"].as_str().unwrap().to_owned();
  send(&app, Method::DELETE, &format!("/contacts/{id}"), None).await;

  let (status, _) = send(&app, Method::POST, "/contacts", Some(ann())).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_reports_field_errors() {
  let app = app().await;
  let (status, json) = send(
    &app,
    Method::POST,
    "/contacts",
    Some(json!({
      "firstName": "Ann",
      "lastName": "Lee",
      "email": "not-an-email",
      "phone": "call me",
      "source": "tv",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(json["message"], "Validation error");
  assert_eq!(json["errors"]["email"], "Please provide a valid email address");
  assert_eq!(json["errors"]["phone"], "Please provide a valid phone number");
  assert_eq!(
    json["errors"]["source"],
    "Source must be one of: website, referral, ad, other"
  );
}

#[tokio::test]
async fn create_deduplicates_tags() {
  let app = app().await;
  let mut body = ann();
  body["tags"] = json!(["vip", "b2b", "vip"]);
  let created = create(&app, body).await;
  assert_eq!(created["tags"], json!(["vip", "b2b"]));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
  let app = app().await;
  let req = Request::builder()
    .method(Method::POST)
    .uri("/contacts")
    .header("content-type", "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_casts_scalar_fields_to_strings() {
  let app = app().await;
  let created = create(
    &app,
    json!({ "firstName": 5, "lastName": "Lee", "email": "five@x.com" }),
  )
  .await;
  assert_eq!(created["firstName"], "5");

  let id = created["id"].as_str().unwrap();
  let (status, json) = send(
    &app,
    Method::PATCH,
    &format!("/contacts/{id}/notes"),
    Some(json!({ "text": 123, "author": "kim" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{json}");
  assert_eq!(json["data"]["notes"][0]["text"], "123");
}

// ─── Get ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_with_malformed_id_is_bad_request() {
  let app = app().await;
  let (status, json) =
    send(&app, Method::GET, "/contacts/not-a-uuid", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(json["message"], "Invalid contact ID");
}

#[tokio::test]
async fn undecodable_id_is_bad_request_json() {
  let app = app().await;
  let (status, json) = send(&app, Method::GET, "/contacts/%FF", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(json["message"], "Invalid contact ID");
}

#[tokio::test]
async fn malformed_id_is_bad_request_on_every_route() {
  let app = app().await;
  for (method, uri, body) in [
    (Method::PUT, "/contacts/not-a-uuid", Some(json!({ "company": "Acme" }))),
    (Method::DELETE, "/contacts/not-a-uuid", None),
    (
      Method::PATCH,
      "/contacts/not-a-uuid/notes",
      Some(json!({ "text": "hi", "author": "kim" })),
    ),
  ] {
    let (status, json) = send(&app, method.clone(), uri, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
    assert_eq!(json["message"], "Invalid contact ID", "{method} {uri}");
  }
}

#[tokio::test]
async fn note_body_is_checked_before_id() {
  let app = app().await;
  let (status, json) = send(
    &app,
    Method::PATCH,
    "/contacts/not-a-uuid/notes",
    Some(json!({ "text": "hi", "author": "" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(json["message"], "text and author are required for a note");
}

#[tokio::test]
async fn get_missing_is_not_found() {
  let app = app().await;
  let uri = format!("/contacts/{}", uuid::Uuid::new_v4());
  let (status, json) = send(&app, Method::GET, &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(json["message"], "Contact not found");
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_merges_provided_fields() {
  let app = app().await;
  let created = create(&app, ann()).await;
  let uri = format!("/contacts/{}", created["id"].as_str().unwrap());

  let (status, json) = send(
    &app,
    Method::PUT,
    &uri,
    Some(json!({
      "company": "Acme",
      "status": "customer",
      "tags": ["vip", "vip"],
      "notes": [{ "text": "smuggled", "author": "x" }],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{json}");
  let data = &json["data"];
  assert_eq!(data["company"], "Acme");
  assert_eq!(data["status"], "customer");
  assert_eq!(data["tags"], json!(["vip"]));
  assert_eq!(data["firstName"], "Ann");
  assert_eq!(data["notes"], json!([]));
  assert_eq!(data["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn update_null_required_fields_fail_validation() {
  let app = app().await;
  let created = create(&app, ann()).await;
  let uri = format!("/contacts/{}", created["id"].as_str().unwrap());

  let (status, json) = send(
    &app,
    Method::PUT,
    &uri,
    Some(json!({ "firstName": null, "email": null })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(json["message"], "Validation error");
  assert_eq!(json["errors"]["firstName"], "First name is required");
  assert_eq!(json["errors"]["email"], "Email is required");

  let (_, json) = send(&app, Method::GET, &uri, None).await;
  assert_eq!(json["data"]["firstName"], "Ann");
}

#[tokio::test]
async fn update_null_clears_optional_fields() {
  let app = app().await;
  let mut body = ann();
  body["phone"] = json!("+1 555 0100");
  body["company"] = json!("Acme");
  let created = create(&app, body).await;
  let uri = format!("/contacts/{}", created["id"].as_str().unwrap());

  let (status, json) =
    send(&app, Method::PUT, &uri, Some(json!({ "phone": null }))).await;
  assert_eq!(status, StatusCode::OK, "{json}");
  assert!(json["data"]["phone"].is_null());
  assert_eq!(json["data"]["company"], "Acme");

  let (_, json) = send(&app, Method::GET, &uri, None).await;
  assert!(json["data"]["phone"].is_null());
}

#[tokio::test]
async fn update_rejects_malformed_body_before_lookup() {
  let app = app().await;
  let req = Request::builder()
    .method(Method::PUT)
    .uri(format!("/contacts/{}", uuid::Uuid::new_v4()))
    .header("content-type", "application/json")
    .body(Body::from("{bad"))
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_to_deleted_status_is_rejected() {
  let app = app().await;
  let created = create(&app, ann()).await;
  let uri = format!("/contacts/{}", created["id"].as_str().unwrap());

  let (status, json) =
    send(&app, Method::PUT, &uri, Some(json!({ "status": "deleted" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(json["message"], "Use DELETE endpoint to remove a contact");

  let (_, json) = send(&app, Method::GET, &uri, None).await;
  assert_eq!(json["data"]["status"], "lead");
}

#[tokio::test]
async fn update_validates_merged_record() {
  let app = app().await;
  let created = create(&app, ann()).await;
  let uri = format!("/contacts/{}", created["id"].as_str().unwrap());

  let (status, json) = send(
    &app,
    Method::PUT,
    &uri,
    Some(json!({ "lastName": "x".repeat(51) })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(
    json["errors"]["lastName"],
    "Last name cannot exceed 50 characters"
  );
}

#[tokio::test]
async fn update_into_taken_email_conflicts() {
  let app = app().await;
  create(&app, ann()).await;
  let bo = create(
    &app,
    json!({ "firstName": "Bo", "lastName": "Diaz", "email": "bo@x.com" }),
  )
  .await;
  let uri = format!("/contacts/{}", bo["id"].as_str().unwrap());

  let (status, _) = send(
    &app,
    Method::PUT,
    &uri,
    Some(json!({ "email": "ann.lee@x.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_deleted_contact_is_not_found() {
  let app = app().await;
  let created = create(&app, ann()).await;
  let uri = format!("/contacts/{}", created["id"].as_str().unwrap());
  send(&app, Method::DELETE, &uri, None).await;

  let (status, _) =
    send(&app, Method::PUT, &uri, Some(json!({ "company": "Acme" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_twice_succeeds_and_hides_contact() {
  let app = app().await;
  let created = create(&app, ann()).await;
  let uri = format!("/contacts/{}", created["id"].as_str().unwrap());

  for _ in 0..2 {
    let (status, json) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Contact deleted successfully");
    assert_eq!(json["data"]["status"], "deleted");
  }

  let (status, _) = send(&app, Method::GET, &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_missing_is_not_found() {
  let app = app().await;
  let uri = format!("/contacts/{}", uuid::Uuid::new_v4());
  let (status, _) = send(&app, Method::DELETE, &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Notes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_note_appends() {
  let app = app().await;
  let created = create(&app, ann()).await;
  let uri = format!("/contacts/{}/notes", created["id"].as_str().unwrap());

  send(
    &app,
    Method::PATCH,
    &uri,
    Some(json!({ "text": "Intro call", "author": "sam" })),
  )
  .await;
  let (status, json) = send(
    &app,
    Method::PATCH,
    &uri,
    Some(json!({ "text": "Sent pricing", "author": "kim" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let notes = json["data"]["notes"].as_array().unwrap();
  assert_eq!(notes.len(), 2);
  assert_eq!(notes[0]["text"], "Intro call");
  assert_eq!(notes[1]["author"], "kim");
  assert!(notes[1]["date"].is_string());
  assert!(notes[1]["id"].is_string());
}

#[tokio::test]
async fn add_note_requires_author() {
  let app = app().await;
  let created = create(&app, ann()).await;
  let uri = format!("/contacts/{}/notes", created["id"].as_str().unwrap());

  let (status, json) = send(
    &app,
    Method::PATCH,
    &uri,
    Some(json!({ "text": "Intro call", "author": "" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(json["message"], "text and author are required for a note");
}

#[tokio::test]
async fn add_note_to_deleted_contact_is_not_found() {
  let app = app().await;
  let created = create(&app, ann()).await;
  let id = created["id"].as_str().unwrap();
  send(&app, Method::DELETE, &format!("/contacts/{id}"), None).await;

  let (status, _) = send(
    &app,
    Method::PATCH,
    &format!("/contacts/{id}/notes"),
    Some(json!({ "text": "late", "author": "sam" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── List ────────────────────────────────────────────────────────────────────

async fn seed(app: &Router) -> Vec<String> {
  let rows = [
    ("Ann", "Lee", "lead", json!(["vip"])),
    ("Bo", "Diaz", "customer", json!(["b2b"])),
    ("Cy", "Park", "customer", json!(["vip", "b2b"])),
  ];
  let mut ids = Vec::new();
  for (first, last, status, tags) in rows {
    let created = create(
      app,
      json!({
        "firstName": first,
        "lastName": last,
        "email": format!("{}@x.com", first.to_lowercase()),
        "status": status,
        "tags": tags,
      }),
    )
    .await;
    ids.push(created["id"].as_str().unwrap().to_owned());
  }
  ids
}

fn first_names(json: &Value) -> Vec<&str> {
  json["data"]
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["firstName"].as_str().unwrap())
    .collect()
}

#[tokio::test]
async fn list_defaults() {
  let app = app().await;
  seed(&app).await;

  let (status, json) = send(&app, Method::GET, "/contacts", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first_names(&json), ["Cy", "Bo", "Ann"]);
  assert_eq!(
    json["pagination"],
    json!({ "total": 3, "page": 1, "limit": 20, "totalPages": 1 })
  );
}

#[tokio::test]
async fn list_clamps_paging() {
  let app = app().await;
  seed(&app).await;

  let (_, json) =
    send(&app, Method::GET, "/contacts?limit=500&page=0", None).await;
  assert_eq!(json["pagination"]["limit"], 100);
  assert_eq!(json["pagination"]["page"], 1);

  let (_, json) = send(
    &app,
    Method::GET,
    "/contacts?limit=2&page=2&sort=firstName",
    None,
  )
  .await;
  assert_eq!(first_names(&json), ["Cy"]);
  assert_eq!(json["pagination"]["totalPages"], 2);

  let (_, json) = send(
    &app,
    Method::GET,
    "/contacts?limit=2abc&page=2.0&sort=firstName",
    None,
  )
  .await;
  assert_eq!(json["pagination"]["limit"], 2);
  assert_eq!(json["pagination"]["page"], 2);
  assert_eq!(first_names(&json), ["Cy"]);
}

#[tokio::test]
async fn list_never_shows_deleted() {
  let app = app().await;
  let ids = seed(&app).await;
  send(&app, Method::DELETE, &format!("/contacts/{}", ids[0]), None).await;

  for uri in ["/contacts", "/contacts?status=deleted"] {
    let (_, json) = send(&app, Method::GET, uri, None).await;
    assert_eq!(first_names(&json), ["Cy", "Bo"], "{uri}");
    assert_eq!(json["pagination"]["total"], 2);
  }
}

#[tokio::test]
async fn list_filters_status_and_tags() {
  let app = app().await;
  seed(&app).await;

  let (_, json) =
    send(&app, Method::GET, "/contacts?status=customer", None).await;
  assert_eq!(first_names(&json), ["Cy", "Bo"]);

  let (_, json) = send(&app, Method::GET, "/contacts?tags=vip", None).await;
  assert_eq!(first_names(&json), ["Cy", "Ann"]);

  let (_, json) =
    send(&app, Method::GET, "/contacts?tags=b2b&tags=vip&sort=lastName", None)
      .await;
  assert_eq!(first_names(&json), ["Bo", "Ann", "Cy"]);

  let (_, json) =
    send(&app, Method::GET, "/contacts?status=archived", None).await;
  assert_eq!(first_names(&json), Vec::<&str>::new());
  assert_eq!(json["pagination"]["total"], 0);
}
