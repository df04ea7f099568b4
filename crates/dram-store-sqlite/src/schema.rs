//! SQL schema for the dram SQLite store.
//!
//! Executed once at connection startup. The version is recorded in
//! `PRAGMA user_version`; future migrations will be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS whiskeys (
    whiskey_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    name_key    TEXT NOT NULL UNIQUE,  -- trimmed, lowercased name
    distillery  TEXT
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    whiskey_id  INTEGER NOT NULL REFERENCES whiskeys(whiskey_id),
    source_site TEXT NOT NULL,
    source_url  TEXT,
    review_date TEXT,                  -- YYYY-MM-DD
    nose        TEXT,
    palate      TEXT,
    finish      TEXT
);

CREATE TABLE IF NOT EXISTS descriptor_vocabulary (
    descriptor_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    descriptor_name     TEXT NOT NULL UNIQUE,
    applicable_sections TEXT NOT NULL,   -- JSON array, never empty
    is_active           INTEGER NOT NULL DEFAULT 1
);

-- Cleared and repopulated as a whole by every rebuild.
CREATE TABLE IF NOT EXISTS review_descriptors (
    review_id         INTEGER NOT NULL REFERENCES reviews(review_id),
    descriptor_id     INTEGER NOT NULL REFERENCES descriptor_vocabulary(descriptor_id),
    tasting_section   TEXT NOT NULL,     -- 'nose' | 'palate' | 'finish'
    confidence        REAL NOT NULL,
    extraction_method TEXT NOT NULL,     -- 'pipe_delimited' | 'prose_conservative'
    UNIQUE (review_id, descriptor_id, tasting_section)
);

-- Derived entirely from review_descriptors.
CREATE TABLE IF NOT EXISTS aggregated_whiskey_descriptors (
    whiskey_id      INTEGER NOT NULL REFERENCES whiskeys(whiskey_id),
    descriptor_id   INTEGER NOT NULL REFERENCES descriptor_vocabulary(descriptor_id),
    tasting_section TEXT NOT NULL,
    review_count    INTEGER NOT NULL CHECK (review_count > 0),
    review_ids      TEXT NOT NULL,       -- JSON array, ascending
    UNIQUE (whiskey_id, descriptor_id, tasting_section)
);

CREATE TABLE IF NOT EXISTS rebuild_runs (
    run_id      TEXT PRIMARY KEY,
    started_at  TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    stats       TEXT NOT NULL            -- JSON RebuildStats
);

CREATE TABLE IF NOT EXISTS review_flags (
    run_id           TEXT NOT NULL REFERENCES rebuild_runs(run_id),
    review_id        INTEGER NOT NULL,
    whiskey_id       INTEGER NOT NULL,
    confidence       REAL NOT NULL,
    descriptor_count INTEGER NOT NULL,
    PRIMARY KEY (run_id, review_id)
);

CREATE INDEX IF NOT EXISTS reviews_whiskey_idx    ON reviews(whiskey_id);
CREATE INDEX IF NOT EXISTS assignments_review_idx ON review_descriptors(review_id);
CREATE INDEX IF NOT EXISTS aggregates_section_idx
    ON aggregated_whiskey_descriptors(tasting_section, whiskey_id);

PRAGMA user_version = 1;
";
