//! Stable, versioned catalog schema. Schema names are stable; migrations
//! require an explicit schema-version bump.

pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE schema_meta (
    version INTEGER NOT NULL
);

CREATE TABLE sources (
    name              TEXT PRIMARY KEY,
    dsn               TEXT NOT NULL,
    include_schemas   TEXT NOT NULL DEFAULT '[]',
    skip_patterns     TEXT NOT NULL DEFAULT '[]',
    created_at        TEXT NOT NULL,
    last_indexed_at   TEXT
);

CREATE TABLE db_objects (
    object_id         TEXT PRIMARY KEY,
    source_name       TEXT NOT NULL REFERENCES sources(name),
    kind              TEXT NOT NULL,
    schema_name       TEXT NOT NULL,
    object_name       TEXT NOT NULL,
    fqname            TEXT NOT NULL,
    parent_object_id  TEXT REFERENCES db_objects(object_id),
    signature         TEXT NOT NULL DEFAULT '',
    comment           TEXT,
    definition        TEXT NOT NULL DEFAULT '',
    UNIQUE(source_name, fqname, kind)
);
CREATE INDEX db_objects_source_idx ON db_objects(source_name);
CREATE INDEX db_objects_parent_idx ON db_objects(parent_object_id);

CREATE TABLE columns (
    object_id         TEXT PRIMARY KEY REFERENCES db_objects(object_id),
    parent_object_id  TEXT NOT NULL REFERENCES db_objects(object_id),
    ordinal           INTEGER NOT NULL,
    name              TEXT NOT NULL,
    data_type         TEXT NOT NULL,
    nullable          INTEGER NOT NULL,
    default_expr      TEXT,
    comment           TEXT
);
CREATE INDEX columns_parent_idx ON columns(parent_object_id);

CREATE TABLE constraints (
    object_id           TEXT PRIMARY KEY REFERENCES db_objects(object_id),
    parent_object_id    TEXT NOT NULL REFERENCES db_objects(object_id),
    name                TEXT NOT NULL,
    kind                TEXT NOT NULL,
    columns             TEXT NOT NULL DEFAULT '[]',
    references_table    TEXT,
    references_columns  TEXT NOT NULL DEFAULT '[]'
);
CREATE INDEX constraints_parent_idx ON constraints(parent_object_id);

CREATE TABLE indexes (
    object_id         TEXT PRIMARY KEY REFERENCES db_objects(object_id),
    parent_object_id  TEXT NOT NULL REFERENCES db_objects(object_id),
    name              TEXT NOT NULL,
    columns           TEXT NOT NULL DEFAULT '[]',
    is_unique         INTEGER NOT NULL
);
CREATE INDEX indexes_parent_idx ON indexes(parent_object_id);

CREATE TABLE dependencies (
    from_object_id  TEXT NOT NULL REFERENCES db_objects(object_id),
    to_object_id    TEXT NOT NULL REFERENCES db_objects(object_id),
    kind            TEXT NOT NULL,
    PRIMARY KEY (from_object_id, to_object_id, kind)
);
CREATE INDEX dependencies_to_idx ON dependencies(to_object_id);

CREATE TABLE contexts (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    target   TEXT NOT NULL UNIQUE,
    text     TEXT NOT NULL
);

CREATE TABLE object_context_effective (
    object_id  TEXT PRIMARY KEY REFERENCES db_objects(object_id),
    text       TEXT NOT NULL DEFAULT ''
);

CREATE TABLE lexical_docs (
    object_id   TEXT PRIMARY KEY REFERENCES db_objects(object_id),
    name_col    TEXT NOT NULL DEFAULT '',
    comment_col TEXT NOT NULL DEFAULT '',
    defs_col    TEXT NOT NULL DEFAULT '',
    context_col TEXT NOT NULL DEFAULT '',
    text_hash   TEXT NOT NULL DEFAULT ''
);

-- A standalone (non content-linked) FTS5 index: `lexical_docs` is the
-- source of truth and is rewritten wholesale alongside this index on every
-- per-source rebuild, so the two are never allowed to drift independently.
CREATE VIRTUAL TABLE objects_fts USING fts5(
    object_id UNINDEXED,
    name_col,
    comment_col,
    defs_col,
    context_col
);

CREATE TABLE object_vectors (
    object_id          TEXT PRIMARY KEY REFERENCES db_objects(object_id),
    vector             BLOB NOT NULL,
    model_id           TEXT NOT NULL,
    source_text_hash   TEXT NOT NULL
);

CREATE TABLE llm_cache (
    cache_key   TEXT PRIMARY KEY,
    response    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
"#;
