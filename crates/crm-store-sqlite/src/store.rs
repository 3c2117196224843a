//! [`SqliteStore`]: the SQLite implementation of [`ContactStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use crm_core::{
  contact::{Contact, ContactFields, NewNote},
  query::{ContactPage, ContactQuery},
  schema::{normalize, validate, validate_note},
  store::ContactStore,
};

use crate::{
  Error, Result,
  encode::{
    CONTACT_COLUMNS, FieldColumns, RawContact, RawNote, encode_dt, encode_uuid,
    now, sort_column, sort_keyword,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A CRM contact store backed by a single SQLite file.
///
/// Clones share the same background connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch one contact by encoded id, mapping the raw row into the domain type.
  async fn load(&self, id_str: String) -> Result<Option<Contact>> {
    let raw = self
      .conn
      .call(move |conn| Ok(load_contact(conn, &id_str)?))
      .await?;
    raw.map(RawContact::into_contact).transpose()
  }
}

// ─── Connection-level helpers ────────────────────────────────────────────────

/// Read a contact row and all of its notes, oldest note first.
fn load_contact(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawContact>> {
  let raw = conn
    .query_row(
      &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE contact_id = ?1"),
      rusqlite::params![id_str],
      RawContact::from_row,
    )
    .optional()?;

  match raw {
    Some(mut raw) => {
      raw.notes = load_notes(conn, id_str)?;
      Ok(Some(raw))
    }
    None => Ok(None),
  }
}

fn load_notes(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Vec<RawNote>> {
  let mut stmt = conn.prepare_cached(
    "SELECT note_id, text, author, date FROM notes
     WHERE contact_id = ?1
     ORDER BY rowid",
  )?;
  stmt
    .query_map(rusqlite::params![id_str], |row| {
      Ok(RawNote {
        note_id: row.get(0)?,
        text:    row.get(1)?,
        author:  row.get(2)?,
        date:    row.get(3)?,
      })
    })?
    .collect()
}

/// `true` if `err` is the unique index on `contacts.email` rejecting a write.
fn is_duplicate_email(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, Some(msg)))
      if e.code == rusqlite::ErrorCode::ConstraintViolation
        && msg.contains("contacts.email")
  )
}

/// Convert a write failure, classifying email collisions.
fn write_error(err: tokio_rusqlite::Error, email: String) -> Error {
  if is_duplicate_email(&err) {
    Error::Core(crm_core::Error::DuplicateEmail(email))
  } else {
    Error::Database(err)
  }
}

/// Normalize then validate at the persistence boundary.
fn check_fields(fields: &mut ContactFields) -> Result<()> {
  normalize(fields);
  validate(fields).map_err(crm_core::Error::from)?;
  Ok(())
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert(&self, mut fields: ContactFields) -> Result<Contact> {
    check_fields(&mut fields)?;

    let contact = Contact::create(fields, Uuid::new_v4(), now());

    let id_str  = encode_uuid(contact.id);
    let at_str  = encode_dt(contact.created_at);
    let cols    = FieldColumns::encode(&contact.fields)?;
    let email   = cols.email.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (
             contact_id, first_name, last_name, email, phone, company,
             job_title, status, source, tags, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
          rusqlite::params![
            id_str,
            cols.first_name,
            cols.last_name,
            cols.email,
            cols.phone,
            cols.company,
            cols.job_title,
            cols.status,
            cols.source,
            cols.tags,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| write_error(e, email))?;

    Ok(contact)
  }

  async fn replace(&self, contact: &Contact) -> Result<Option<Contact>> {
    let mut fields = contact.fields.clone();
    check_fields(&mut fields)?;

    let id_str = encode_uuid(contact.id);
    let at_str = encode_dt(now());
    let cols   = FieldColumns::encode(&fields)?;
    let email  = cols.email.clone();

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE contacts SET
             first_name = ?2, last_name = ?3, email = ?4, phone = ?5,
             company = ?6, job_title = ?7, status = ?8, source = ?9,
             tags = ?10, updated_at = ?11
           WHERE contact_id = ?1 AND status != 'deleted'",
          rusqlite::params![
            id_str,
            cols.first_name,
            cols.last_name,
            cols.email,
            cols.phone,
            cols.company,
            cols.job_title,
            cols.status,
            cols.source,
            cols.tags,
            at_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(load_contact(conn, &id_str)?)
      })
      .await
      .map_err(|e| write_error(e, email))?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn mark_deleted(&self, id: Uuid) -> Result<Option<Contact>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE contacts SET status = 'deleted', updated_at = ?2
           WHERE contact_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(load_contact(conn, &id_str)?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn append_note(&self, id: Uuid, note: NewNote) -> Result<Option<Contact>> {
    validate_note(&note).map_err(crm_core::Error::from)?;

    let id_str      = encode_uuid(id);
    let note_id_str = encode_uuid(Uuid::new_v4());
    let at_str      = encode_dt(now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let active: bool = tx
          .query_row(
            "SELECT 1 FROM contacts WHERE contact_id = ?1 AND status != 'deleted'",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !active {
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO notes (note_id, contact_id, text, author, date)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![note_id_str, id_str, note.text, note.author, at_str],
        )?;
        tx.execute(
          "UPDATE contacts SET updated_at = ?2 WHERE contact_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;

        let raw = load_contact(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get(&self, id: Uuid) -> Result<Option<Contact>> {
    self.load(encode_uuid(id)).await
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Contact>> {
    let email = email.to_owned();

    let id_str: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT contact_id FROM contacts WHERE email = ?1",
              rusqlite::params![email],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    match id_str {
      Some(id_str) => self.load(id_str).await,
      None => Ok(None),
    }
  }

  async fn list(&self, query: &ContactQuery) -> Result<ContactPage> {
    // Build WHERE clause dynamically. Deleted contacts are always excluded.
    let mut conds: Vec<String> = vec!["status != 'deleted'".to_owned()];
    let mut args: Vec<Value> = Vec::new();

    if let Some(status) = query.status.filter(|s| !s.is_deleted()) {
      conds.push("status = ?".to_owned());
      args.push(Value::Text(status.as_str().to_owned()));
    }

    if !query.tags.is_empty() {
      let placeholders = vec!["?"; query.tags.len()].join(", ");
      conds.push(format!(
        "EXISTS (SELECT 1 FROM json_each(contacts.tags) AS t
                 WHERE t.value IN ({placeholders}))"
      ));
      args.extend(query.tags.iter().cloned().map(Value::Text));
    }

    let where_clause = format!("WHERE {}", conds.join(" AND "));

    let mut order: Vec<String> = query
      .sort
      .keys()
      .iter()
      .map(|k| format!("{} {}", sort_column(k.field), sort_keyword(k.direction)))
      .collect();
    order.push(format!("seq {}", sort_keyword(query.sort.primary_direction())));
    let order_clause = format!("ORDER BY {}", order.join(", "));

    let count_sql = format!("SELECT COUNT(*) FROM contacts {where_clause}");
    let page_sql = format!(
      "SELECT {CONTACT_COLUMNS} FROM contacts {where_clause} {order_clause}
       LIMIT ? OFFSET ?"
    );

    let count_args = args.clone();
    let mut page_args = args;
    page_args.push(Value::Integer(i64::from(query.page.limit())));
    page_args.push(Value::Integer(
      i64::try_from(query.page.offset()).unwrap_or(i64::MAX),
    ));

    tracing::debug!(sql = %page_sql, "listing contacts");

    let (raws, total): (Vec<RawContact>, i64) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(count_args.iter()),
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&page_sql)?;
        let mut raws = stmt
          .query_map(
            rusqlite::params_from_iter(page_args.iter()),
            RawContact::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        for raw in &mut raws {
          raw.notes = load_notes(conn, &raw.contact_id)?;
        }

        Ok((raws, total))
      })
      .await?;

    Ok(ContactPage {
      contacts: raws
        .into_iter()
        .map(RawContact::into_contact)
        .collect::<Result<_>>()?,
      total:    total as u64,
    })
  }
}
