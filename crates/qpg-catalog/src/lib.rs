//! Catalog Store: the local SQLite catalog that backs every other
//! component. Owns the on-disk schema, the atomic per-source rebuild
//! transaction, the Context Resolver, and the Label
//! Assembler (§4.6).

mod context_resolver;
mod error;
mod label_assembler;
mod open;
mod rebuild;
mod schema;

pub use context_resolver::ContextEntry;
pub use error::{CatalogError, Result};
pub use label_assembler::LexicalDoc;
pub use open::{default_catalog_path, open_in_memory, open_or_create};
pub use rebuild::{rebuild_source, StagedSource};
pub use schema::SCHEMA_VERSION;

use rusqlite::{params, Connection, OptionalExtension};

use qpg_model::{Context, ContextLevel, Source};

/// Insert or update a named source's connection details (`source add`).
/// Does not touch any previously indexed rows; those are
/// only replaced by [`rebuild_source`].
pub fn upsert_source(conn: &Connection, source: &Source) -> Result<()> {
    conn.execute(
        "INSERT INTO sources (name, dsn, include_schemas, skip_patterns, created_at, last_indexed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(name) DO UPDATE SET
            dsn = excluded.dsn,
            include_schemas = excluded.include_schemas,
            skip_patterns = excluded.skip_patterns",
        params![
            source.name,
            source.dsn,
            serde_json::to_string(&source.include_schemas)?,
            serde_json::to_string(&source.skip_patterns)?,
            source.created_at.to_rfc3339(),
            source.last_indexed_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

/// Remove a source and every row derived from it (`source remove`).
/// The per-source rebuild's own `DELETE`s cover every
/// downstream table; this only needs to additionally drop the `sources`
/// row itself.
pub fn remove_source(conn: &mut Connection, name: &str) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM lexical_docs WHERE object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![name],
    )?;
    tx.execute(
        "DELETE FROM objects_fts WHERE object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![name],
    )?;
    tx.execute(
        "DELETE FROM object_vectors WHERE object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![name],
    )?;
    tx.execute(
        "DELETE FROM object_context_effective WHERE object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![name],
    )?;
    tx.execute(
        "DELETE FROM dependencies WHERE from_object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![name],
    )?;
    tx.execute(
        "DELETE FROM indexes WHERE parent_object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![name],
    )?;
    tx.execute(
        "DELETE FROM constraints WHERE parent_object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![name],
    )?;
    tx.execute(
        "DELETE FROM columns WHERE parent_object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![name],
    )?;
    tx.execute(
        "DELETE FROM db_objects WHERE source_name = ?1",
        params![name],
    )?;
    tx.execute("DELETE FROM sources WHERE name = ?1", params![name])?;
    tx.commit()?;
    Ok(())
}

/// List every registered source (`source list`, `status`).
pub fn list_sources(conn: &Connection) -> Result<Vec<Source>> {
    let mut stmt = conn.prepare(
        "SELECT name, dsn, include_schemas, skip_patterns, created_at, last_indexed_at
         FROM sources ORDER BY name",
    )?;
    let rows = stmt.query_map([], |row| {
        let include_schemas: String = row.get(2)?;
        let skip_patterns: String = row.get(3)?;
        let created_at: String = row.get(4)?;
        let last_indexed_at: Option<String> = row.get(5)?;
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            include_schemas,
            skip_patterns,
            created_at,
            last_indexed_at,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (name, dsn, include_schemas, skip_patterns, created_at, last_indexed_at) = row?;
        out.push(Source {
            name,
            dsn,
            include_schemas: serde_json::from_str(&include_schemas)?,
            skip_patterns: serde_json::from_str(&skip_patterns)?,
            created_at: created_at
                .parse()
                .map_err(|_| CatalogError::Build {
                    source: "sources".into(),
                    reason: format!("invalid created_at timestamp: {created_at}"),
                })?,
            last_indexed_at: last_indexed_at
                .map(|t| t.parse())
                .transpose()
                .map_err(|_| CatalogError::Build {
                    source: "sources".into(),
                    reason: "invalid last_indexed_at timestamp".into(),
                })?,
        });
    }
    Ok(out)
}

/// Fetch one registered source by name.
pub fn get_source(conn: &Connection, name: &str) -> Result<Option<Source>> {
    Ok(list_sources(conn)?.into_iter().find(|s| s.name == name))
}

/// Create or replace the operator-authored context note at `target`
/// (`context add`, spec §3: "Context. Operator-authored semantic note.").
/// `target` must parse into one of the three valid `qpg://` scopes; the
/// `contexts.target` column's `UNIQUE` constraint means re-adding an
/// existing target updates its text rather than producing a second row,
/// which is how spec §3's "duplicates are disallowed per target"
/// invariant is enforced.
pub fn upsert_context(conn: &Connection, target: &str, text: &str) -> Result<()> {
    if ContextLevel::parse(target).is_none() {
        return Err(CatalogError::InvalidTarget(target.to_string()));
    }
    conn.execute(
        "INSERT INTO contexts (target, text) VALUES (?1, ?2)
         ON CONFLICT(target) DO UPDATE SET text = excluded.text",
        params![target, text],
    )?;
    Ok(())
}

/// Remove the context note at `target`, if one exists (`context remove`).
pub fn remove_context(conn: &Connection, target: &str) -> Result<()> {
    conn.execute("DELETE FROM contexts WHERE target = ?1", params![target])?;
    Ok(())
}

/// List every operator-authored context note (`context list`), optionally
/// scoped to one source.
pub fn list_contexts(conn: &Connection, source_name: Option<&str>) -> Result<Vec<Context>> {
    let mut stmt = conn.prepare("SELECT id, target, text FROM contexts ORDER BY target")?;
    let rows = stmt.query_map([], |row| {
        Ok(Context {
            id: row.get(0)?,
            target: row.get(1)?,
            text: row.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        let context = row?;
        let in_scope = match source_name {
            None => true,
            Some(name) => ContextLevel::parse(&context.target)
                .map(|level| {
                    let target_source = match &level {
                        ContextLevel::Source { source_name } => source_name,
                        ContextLevel::Schema { source_name, .. } => source_name,
                        ContextLevel::Object { source_name, .. } => source_name,
                    };
                    target_source == name
                })
                .unwrap_or(false),
        };
        if in_scope {
            out.push(context);
        }
    }
    Ok(out)
}

/// Total indexed object count for one source, used by `qpg status`.
pub fn object_count(conn: &Connection, source_name: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM db_objects WHERE source_name = ?1",
        params![source_name],
        |row| row.get(0),
    )
    .optional()
    .map(|v| v.unwrap_or(0))
    .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open::open_in_memory;
    use crate::rebuild::{rebuild_source, StagedSource};
    use qpg_model::{DbObject, ObjectId, ObjectKind};

    #[test]
    fn upsert_context_rejects_malformed_target() {
        let conn = open_in_memory().unwrap();
        let err = upsert_context(&conn, "not-a-target", "note").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTarget(_)));
    }

    #[test]
    fn upsert_context_is_idempotent_per_target() {
        let conn = open_in_memory().unwrap();
        upsert_context(&conn, "qpg://work", "first").unwrap();
        upsert_context(&conn, "qpg://work", "second").unwrap();
        let contexts = list_contexts(&conn, None).unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].text, "second");
    }

    #[test]
    fn list_contexts_scopes_by_source() {
        let conn = open_in_memory().unwrap();
        upsert_context(&conn, "qpg://work", "work note").unwrap();
        upsert_context(&conn, "qpg://other", "other note").unwrap();
        let scoped = list_contexts(&conn, Some("work")).unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].target, "qpg://work");
    }

    #[test]
    fn remove_context_drops_the_row() {
        let conn = open_in_memory().unwrap();
        upsert_context(&conn, "qpg://work/public", "schema note").unwrap();
        remove_context(&conn, "qpg://work/public").unwrap();
        assert!(list_contexts(&conn, None).unwrap().is_empty());
    }

    #[test]
    fn rebuild_materializes_context_added_through_upsert_context() {
        let mut conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO sources (name, dsn, created_at) VALUES ('work', 'postgresql://x', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        upsert_context(&conn, "qpg://work", "every object in this source").unwrap();
        upsert_context(&conn, "qpg://work/public.orders", "order table note").unwrap();

        let table = DbObject {
            object_id: ObjectId::derive("work", ObjectKind::Table, "public.orders"),
            source_name: "work".into(),
            kind: ObjectKind::Table,
            schema_name: "public".into(),
            object_name: "orders".into(),
            fqname: "public.orders".into(),
            parent_object_id: None,
            signature: "orders(id integer)".into(),
            comment: None,
            definition: String::new(),
        };
        let objects = vec![table.clone()];
        rebuild_source(
            &mut conn,
            &StagedSource {
                source_name: "work",
                objects: &objects,
                columns: &[],
                constraints: &[],
                indexes: &[],
                dependencies: &[],
            },
        )
        .unwrap();

        let effective: String = conn
            .query_row(
                "SELECT text FROM object_context_effective WHERE object_id = ?1",
                params![table.object_id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(
            effective,
            "every object in this source\n\norder table note"
        );
    }
}
