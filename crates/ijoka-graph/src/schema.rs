//! SQLite schema for the property-graph store. One table per node label
//! plus a single generic `edges` table, modeled after the teacher's
//! migration-on-connect convention (`at-core`'s rusqlite-backed stores run
//! `CREATE TABLE IF NOT EXISTS` on open rather than a migration runner).

pub const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
    id          TEXT PRIMARY KEY,
    path        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id                     TEXT PRIMARY KEY,
    agent                  TEXT NOT NULL,
    status                 TEXT NOT NULL,
    started_at             TEXT NOT NULL,
    last_activity          TEXT NOT NULL,
    ended_at               TEXT,
    event_count            INTEGER NOT NULL DEFAULT 0,
    is_subagent            INTEGER NOT NULL DEFAULT 0,
    start_commit           TEXT,
    active_feature_id      TEXT,
    classified_at          TEXT,
    classification_source  TEXT,
    last_prompt            TEXT,
    nudges_shown           TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS features (
    id                   TEXT PRIMARY KEY,
    description          TEXT NOT NULL,
    category             TEXT NOT NULL,
    kind                 TEXT NOT NULL,
    status               TEXT NOT NULL,
    priority             INTEGER NOT NULL,
    steps                TEXT NOT NULL DEFAULT '[]',
    file_patterns        TEXT NOT NULL DEFAULT '[]',
    branch_hint          TEXT,
    work_count           INTEGER NOT NULL DEFAULT 0,
    assigned_agent       TEXT,
    claiming_session_id  TEXT,
    claiming_agent       TEXT,
    claimed_at           TEXT,
    block_reason         TEXT,
    parent_id            TEXT,
    is_primary           INTEGER NOT NULL DEFAULT 0,
    is_session_work      INTEGER NOT NULL DEFAULT 0,
    completion_criteria  TEXT,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    completed_at         TEXT
);

CREATE TABLE IF NOT EXISTS steps (
    id              TEXT PRIMARY KEY,
    description     TEXT NOT NULL,
    status          TEXT NOT NULL,
    step_order      INTEGER NOT NULL,
    expected_tools  TEXT NOT NULL DEFAULT '[]',
    created_at      TEXT NOT NULL,
    started_at      TEXT,
    completed_at    TEXT
);

CREATE TABLE IF NOT EXISTS events (
    id            TEXT PRIMARY KEY,
    event_type    TEXT NOT NULL,
    tool_name     TEXT,
    payload       TEXT NOT NULL,
    timestamp     TEXT NOT NULL,
    source_agent  TEXT NOT NULL,
    session_id    TEXT NOT NULL,
    success       INTEGER NOT NULL,
    summary       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS status_events (
    id           TEXT PRIMARY KEY,
    feature_id   TEXT NOT NULL,
    from_status  TEXT NOT NULL,
    to_status    TEXT NOT NULL,
    at           TEXT NOT NULL,
    by           TEXT NOT NULL,
    session_id   TEXT,
    reason       TEXT
);

CREATE TABLE IF NOT EXISTS commits (
    hash       TEXT PRIMARY KEY,
    message    TEXT NOT NULL,
    author     TEXT,
    timestamp  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS insights (
    id                    TEXT PRIMARY KEY,
    description           TEXT NOT NULL,
    pattern_type          TEXT NOT NULL,
    tags                  TEXT NOT NULL DEFAULT '[]',
    usage_count           INTEGER NOT NULL DEFAULT 0,
    effectiveness_score   REAL,
    feedback_count        INTEGER NOT NULL DEFAULT 0,
    helpful_count         INTEGER NOT NULL DEFAULT 0,
    created_at            TEXT NOT NULL,
    feature_id            TEXT
);

CREATE TABLE IF NOT EXISTS edges (
    rowid_pk  INTEGER PRIMARY KEY AUTOINCREMENT,
    kind      TEXT NOT NULL,
    src_id    TEXT NOT NULL,
    dst_id    TEXT NOT NULL,
    props     TEXT
);

CREATE INDEX IF NOT EXISTS edges_by_src ON edges(kind, src_id);
CREATE INDEX IF NOT EXISTS edges_by_dst ON edges(kind, dst_id);
CREATE INDEX IF NOT EXISTS status_events_by_feature ON status_events(feature_id, at);
CREATE INDEX IF NOT EXISTS events_by_session ON events(session_id, timestamp);
"#;

pub fn init_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
