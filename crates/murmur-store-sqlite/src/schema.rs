//! SQL schema for the Murmur SQLite store.
//!
//! Executed once at connection startup; idempotent thanks to
//! `CREATE ... IF NOT EXISTS`. Future migrations will be gated on
//! `PRAGMA user_version`.

pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS principals (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    role          TEXT NOT NULL DEFAULT 'user',
    registered_at TEXT NOT NULL,          -- RFC 3339, microsecond precision
    updated_at    TEXT,
    deleted_at    TEXT
);

CREATE TABLE IF NOT EXISTS posts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id      INTEGER NOT NULL REFERENCES principals(id),
    title         TEXT NOT NULL,
    body          TEXT NOT NULL,
    registered_at TEXT NOT NULL,
    updated_at    TEXT,
    deleted_at    TEXT
);

CREATE TABLE IF NOT EXISTS likes (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    principal_id  INTEGER NOT NULL REFERENCES principals(id),
    post_id       INTEGER NOT NULL REFERENCES posts(id),
    registered_at TEXT NOT NULL,
    deleted_at    TEXT
);

CREATE TABLE IF NOT EXISTS comments (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id       INTEGER NOT NULL REFERENCES posts(id),
    author_id     INTEGER NOT NULL REFERENCES principals(id),
    text          TEXT NOT NULL,
    registered_at TEXT NOT NULL,
    updated_at    TEXT,
    deleted_at    TEXT
);

-- Display text is derived from `kind` on read; it is never stored.
CREATE TABLE IF NOT EXISTS alarms (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    recipient_id  INTEGER NOT NULL REFERENCES principals(id),
    kind          TEXT NOT NULL,          -- 'NEW_COMMENT_ON_POST' | 'NEW_LIKE_ON_POST'
    args_json     TEXT NOT NULL,
    registered_at TEXT NOT NULL,
    updated_at    TEXT,
    deleted_at    TEXT
);

-- Uniqueness among live rows only; soft-deleted rows are retained.
CREATE UNIQUE INDEX IF NOT EXISTS principals_live_name_idx
    ON principals(name) WHERE deleted_at IS NULL;
CREATE UNIQUE INDEX IF NOT EXISTS likes_live_pair_idx
    ON likes(principal_id, post_id) WHERE deleted_at IS NULL;

CREATE INDEX IF NOT EXISTS posts_owner_idx        ON posts(owner_id);
CREATE INDEX IF NOT EXISTS posts_registered_idx   ON posts(registered_at, id);
CREATE INDEX IF NOT EXISTS likes_post_idx         ON likes(post_id);
CREATE INDEX IF NOT EXISTS comments_post_idx      ON comments(post_id);
CREATE INDEX IF NOT EXISTS alarms_recipient_idx   ON alarms(recipient_id);

PRAGMA user_version = 1;
";
