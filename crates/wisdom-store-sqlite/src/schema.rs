//! SQL schema for the WisdomOS SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 UTC strings (nanosecond precision,
/// `Z` suffix) so range filters can compare them as text.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Reference data ─────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS areas (
    area_id        TEXT PRIMARY KEY,
    code           TEXT NOT NULL,
    name           TEXT NOT NULL,
    default_weight REAL,             -- NULL: no weight anywhere
    owner_id       TEXT,             -- NULL: global canonical area
    active         INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS custom_weights (
    user_id TEXT NOT NULL,
    area_id TEXT NOT NULL REFERENCES areas(area_id),
    weight  REAL NOT NULL CHECK (weight >= 0),
    PRIMARY KEY (user_id, area_id)
);

CREATE TABLE IF NOT EXISTS dimensions (
    dimension_id   TEXT PRIMARY KEY,
    area_id        TEXT NOT NULL REFERENCES areas(area_id),
    code           TEXT NOT NULL,
    name           TEXT NOT NULL,
    weight_default REAL NOT NULL CHECK (weight_default >= 0)
);

-- ── Raw signals ────────────────────────────────────────────────────────────

-- Append-only, except rows with source 'ritual_tracking', which are keyed
-- per (user, area, period) and replaced on recomputation.
CREATE TABLE IF NOT EXISTS raw_scores (
    score_id     TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    area_id      TEXT NOT NULL REFERENCES areas(area_id),
    dimension_id TEXT,
    score        REAL NOT NULL CHECK (score BETWEEN 0 AND 5),
    recorded_at  TEXT NOT NULL,
    source       TEXT NOT NULL DEFAULT 'manual',
    confidence   REAL,
    metadata     TEXT              -- JSON or NULL
);

CREATE TABLE IF NOT EXISTS entry_links (
    link_id     TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    entry_id    TEXT NOT NULL,
    area_id     TEXT NOT NULL REFERENCES areas(area_id),
    entry_kind  TEXT NOT NULL,
    strength    REAL NOT NULL CHECK (strength BETWEEN 0 AND 1),
    recorded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rituals (
    ritual_id  TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL,
    name       TEXT NOT NULL,
    cadence    TEXT NOT NULL,      -- 'daily' | 'weekly' | 'monthly' | 'custom'
    active     INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ritual_areas (
    ritual_id TEXT NOT NULL REFERENCES rituals(ritual_id),
    area_id   TEXT NOT NULL,
    PRIMARY KEY (ritual_id, area_id)
);

-- Sessions are strictly append-only.
CREATE TABLE IF NOT EXISTS ritual_sessions (
    session_id       TEXT PRIMARY KEY,
    ritual_id        TEXT NOT NULL REFERENCES rituals(ritual_id),
    user_id          TEXT NOT NULL,
    completed_at     TEXT NOT NULL,
    duration_minutes INTEGER,
    quality          INTEGER CHECK (quality BETWEEN 1 AND 5),
    notes            TEXT
);

-- ── Rollups (caches) ───────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS area_rollups (
    user_id     TEXT NOT NULL,
    area_id     TEXT NOT NULL,
    period      TEXT NOT NULL,     -- 'YYYY-MM' | 'YYYY-Qn'
    score       REAL NOT NULL CHECK (score BETWEEN 0 AND 5),
    trend_30d   REAL NOT NULL,
    strategy    TEXT NOT NULL,
    weight      REAL,
    PRIMARY KEY (user_id, area_id, period)
);

CREATE TABLE IF NOT EXISTS period_summaries (
    user_id     TEXT NOT NULL,
    period      TEXT NOT NULL,
    gfs         REAL NOT NULL CHECK (gfs BETWEEN 0 AND 100),
    confidence  REAL NOT NULL CHECK (confidence BETWEEN 0 AND 1),
    computed_at TEXT NOT NULL,
    PRIMARY KEY (user_id, period)
);

CREATE INDEX IF NOT EXISTS raw_scores_lookup_idx  ON raw_scores(user_id, area_id, recorded_at);
CREATE INDEX IF NOT EXISTS entry_links_lookup_idx ON entry_links(user_id, area_id, recorded_at);
CREATE INDEX IF NOT EXISTS sessions_lookup_idx    ON ritual_sessions(user_id, completed_at);
CREATE INDEX IF NOT EXISTS dimensions_area_idx    ON dimensions(area_id);
CREATE INDEX IF NOT EXISTS area_rollups_period_idx ON area_rollups(user_id, period);

PRAGMA user_version = 1;
";
