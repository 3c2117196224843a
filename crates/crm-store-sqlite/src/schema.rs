//! SQL schema for the CRM SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rows are never deleted; removal is status = 'deleted'.
-- `seq` records insertion order and breaks sort ties.
CREATE TABLE IF NOT EXISTS contacts (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id  TEXT NOT NULL UNIQUE,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,   -- trimmed, lower-cased; global
    phone       TEXT,
    company     TEXT,
    job_title   TEXT,
    status      TEXT NOT NULL DEFAULT 'lead',  -- lead | customer | churned | deleted
    source      TEXT,                          -- website | referral | ad | other
    tags        TEXT NOT NULL DEFAULT '[]',    -- JSON array, de-duplicated
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Notes are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS notes (
    note_id     TEXT PRIMARY KEY,
    contact_id  TEXT NOT NULL REFERENCES contacts(contact_id),
    text        TEXT NOT NULL,
    author      TEXT NOT NULL,
    date        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS contacts_status_idx  ON contacts(status);
CREATE INDEX IF NOT EXISTS contacts_company_idx ON contacts(company);
CREATE INDEX IF NOT EXISTS contacts_created_idx ON contacts(created_at);
CREATE INDEX IF NOT EXISTS notes_contact_idx    ON notes(contact_id);

PRAGMA user_version = 1;
";
