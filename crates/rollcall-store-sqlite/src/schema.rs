//! SQL schema for the Rollcall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id     TEXT PRIMARY KEY,
    kind           TEXT NOT NULL CHECK (kind IN ('student', 'member')),
    full_name      TEXT NOT NULL,
    nickname       TEXT,
    group_name     TEXT,            -- grade level or age group
    gender         TEXT,
    birthday       TEXT,            -- YYYY-MM-DD
    photo_url      TEXT,
    ministry       TEXT,
    contact_number TEXT,
    address        TEXT,
    first_visit    TEXT,            -- YYYY-MM-DD
    created_at     TEXT NOT NULL
);

-- Absence is the lack of a row. Only PRESENT may ever be written.
CREATE TABLE IF NOT EXISTS presence (
    subject_id   TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    date         TEXT NOT NULL,     -- YYYY-MM-DD
    service      TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'PRESENT' CHECK (status = 'PRESENT'),
    memory_verse INTEGER NOT NULL DEFAULT 0,
    remarks      TEXT,
    recorded_at  TEXT NOT NULL,
    PRIMARY KEY (subject_id, date, service)
);

CREATE TABLE IF NOT EXISTS staff (
    staff_id   TEXT PRIMARY KEY,
    username   TEXT NOT NULL UNIQUE,
    full_name  TEXT NOT NULL,
    role       TEXT NOT NULL,
    pin_hash   TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Denormalised so history outlives the account.
CREATE TABLE IF NOT EXISTS login_log (
    login_id TEXT PRIMARY KEY,
    staff_id TEXT NOT NULL,
    username TEXT NOT NULL,
    role     TEXT NOT NULL,
    login_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS subjects_kind_idx ON subjects(kind);
CREATE INDEX IF NOT EXISTS presence_date_idx ON presence(date);
CREATE INDEX IF NOT EXISTS login_at_idx      ON login_log(login_at);

PRAGMA user_version = 1;
";
