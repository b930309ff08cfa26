//! Atomic per-source rebuild: stage everything for one source, then
//! replace its prior rows in a single transaction so readers never see a
//! source half old, half new.

use qpg_model::{Column, Constraint, DbObject, Index, ObjectId};
use rusqlite::{params, Connection};

use crate::context_resolver::{self, ContextEntry};
use crate::error::Result;
use crate::label_assembler::{self, LexicalDoc};

/// A fully staged rebuild payload, as the Introspector + Normalizer
/// produce it plus whatever Context entries already live in the catalog
/// for this source. Context resolution re-runs against every rebuild,
/// never incrementally.
pub struct StagedSource<'a> {
    pub source_name: &'a str,
    pub objects: &'a [DbObject],
    pub columns: &'a [Column],
    pub constraints: &'a [Constraint],
    pub indexes: &'a [Index],
    pub dependencies: &'a [qpg_model::Dependency],
}

/// Replace every row belonging to `staged.source_name` with the staged
/// rows, within one `BEGIN IMMEDIATE` transaction. This acquires an
/// exclusive writer slot for the rebuild's duration; readers continue to
/// see the catalog's prior consistent state until the swap commits.
///
/// `BEGIN IMMEDIATE` takes SQLite's write lock up front rather than on
/// first write, so a concurrent rebuild of a different source blocks here
/// instead of partway through staging -- the catalog's single-writer
/// invariant falls directly out of SQLite's own locking, with no
/// additional lock file to manage.
pub fn rebuild_source(conn: &mut Connection, staged: &StagedSource<'_>) -> Result<()> {
    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

    delete_source_rows(&tx, staged.source_name)?;

    for obj in staged.objects {
        insert_object(&tx, obj)?;
    }
    for col in staged.columns {
        insert_column(&tx, col)?;
    }
    for con in staged.constraints {
        insert_constraint(&tx, con)?;
    }
    for idx in staged.indexes {
        insert_index(&tx, idx)?;
    }
    for dep in staged.dependencies {
        insert_dependency(&tx, dep)?;
    }

    let contexts = load_contexts(&tx, staged.source_name)?;
    let effective = context_resolver::resolve(staged.source_name, staged.objects, &contexts);
    for obj in staged.objects {
        let text = effective.get(&obj.object_id).cloned().unwrap_or_default();
        tx.execute(
            "INSERT INTO object_context_effective (object_id, text) VALUES (?1, ?2)
             ON CONFLICT(object_id) DO UPDATE SET text = excluded.text",
            params![obj.object_id.to_string(), text],
        )?;
    }

    for obj in staged.objects {
        let defs = match obj.kind {
            qpg_model::ObjectKind::Table | qpg_model::ObjectKind::View => label_assembler::assemble_defs(
                obj,
                &child_columns(staged.columns, obj.object_id),
                &child_constraints(staged.constraints, obj.object_id),
                &child_indexes(staged.indexes, obj.object_id),
            ),
            _ => obj.definition.clone(),
        };
        let context_text = effective.get(&obj.object_id).cloned().unwrap_or_default();
        let doc = label_assembler::assemble(obj, defs, context_text);
        insert_lexical_doc(&tx, &doc)?;
    }

    tx.execute(
        "UPDATE sources SET last_indexed_at = ?1 WHERE name = ?2",
        params![chrono::Utc::now().to_rfc3339(), staged.source_name],
    )?;

    tx.commit()?;
    Ok(())
}

fn child_columns(columns: &[Column], parent: ObjectId) -> Vec<&Column> {
    columns
        .iter()
        .filter(|c| c.parent_object_id == parent)
        .collect()
}

fn child_constraints(constraints: &[Constraint], parent: ObjectId) -> Vec<&Constraint> {
    constraints
        .iter()
        .filter(|c| c.parent_object_id == parent)
        .collect()
}

fn child_indexes(indexes: &[Index], parent: ObjectId) -> Vec<&Index> {
    indexes
        .iter()
        .filter(|i| i.parent_object_id == parent)
        .collect()
}

fn delete_source_rows(tx: &Connection, source_name: &str) -> Result<()> {
    tx.execute(
        "DELETE FROM lexical_docs WHERE object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![source_name],
    )?;
    tx.execute(
        "DELETE FROM objects_fts WHERE object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![source_name],
    )?;
    tx.execute(
        "DELETE FROM object_vectors WHERE object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![source_name],
    )?;
    tx.execute(
        "DELETE FROM object_context_effective WHERE object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![source_name],
    )?;
    tx.execute(
        "DELETE FROM dependencies WHERE from_object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![source_name],
    )?;
    tx.execute(
        "DELETE FROM indexes WHERE parent_object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![source_name],
    )?;
    tx.execute(
        "DELETE FROM constraints WHERE parent_object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![source_name],
    )?;
    tx.execute(
        "DELETE FROM columns WHERE parent_object_id IN
            (SELECT object_id FROM db_objects WHERE source_name = ?1)",
        params![source_name],
    )?;
    tx.execute(
        "DELETE FROM db_objects WHERE source_name = ?1",
        params![source_name],
    )?;
    Ok(())
}

fn insert_object(tx: &Connection, obj: &DbObject) -> Result<()> {
    tx.execute(
        "INSERT INTO db_objects
            (object_id, source_name, kind, schema_name, object_name, fqname,
             parent_object_id, signature, comment, definition)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            obj.object_id.to_string(),
            obj.source_name,
            obj.kind.as_str(),
            obj.schema_name,
            obj.object_name,
            obj.fqname,
            obj.parent_object_id.map(|p| p.to_string()),
            obj.signature,
            obj.comment,
            obj.definition,
        ],
    )?;
    Ok(())
}

fn insert_column(tx: &Connection, col: &Column) -> Result<()> {
    tx.execute(
        "INSERT INTO columns
            (object_id, parent_object_id, ordinal, name, data_type, nullable,
             default_expr, comment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            col.object_id.to_string(),
            col.parent_object_id.to_string(),
            col.ordinal,
            col.name,
            col.data_type,
            col.nullable as i32,
            col.default,
            col.comment,
        ],
    )?;
    Ok(())
}

fn insert_constraint(tx: &Connection, con: &Constraint) -> Result<()> {
    tx.execute(
        "INSERT INTO constraints
            (object_id, parent_object_id, name, kind, columns,
             references_table, references_columns)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            con.object_id.to_string(),
            con.parent_object_id.to_string(),
            con.name,
            con.kind.as_str(),
            serde_json::to_string(&con.columns)?,
            con.references_table,
            serde_json::to_string(&con.references_columns)?,
        ],
    )?;
    Ok(())
}

fn insert_index(tx: &Connection, idx: &Index) -> Result<()> {
    tx.execute(
        "INSERT INTO indexes (object_id, parent_object_id, name, columns, is_unique)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            idx.object_id.to_string(),
            idx.parent_object_id.to_string(),
            idx.name,
            serde_json::to_string(&idx.columns)?,
            idx.is_unique as i32,
        ],
    )?;
    Ok(())
}

fn insert_dependency(tx: &Connection, dep: &qpg_model::Dependency) -> Result<()> {
    tx.execute(
        "INSERT OR IGNORE INTO dependencies (from_object_id, to_object_id, kind)
         VALUES (?1, ?2, ?3)",
        params![
            dep.from_object_id.to_string(),
            dep.to_object_id.to_string(),
            dep.kind.as_str(),
        ],
    )?;
    Ok(())
}

fn insert_lexical_doc(tx: &Connection, doc: &LexicalDoc) -> Result<()> {
    let hash = {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(doc.hashable_text().as_bytes());
        hex::encode(hasher.finalize())
    };
    tx.execute(
        "INSERT INTO lexical_docs
            (object_id, name_col, comment_col, defs_col, context_col, text_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            doc.object_id.to_string(),
            doc.name_col,
            doc.comment_col,
            doc.defs_col,
            doc.context_col,
            hash,
        ],
    )?;
    tx.execute(
        "INSERT INTO objects_fts (object_id, name_col, comment_col, defs_col, context_col)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doc.object_id.to_string(),
            doc.name_col,
            doc.comment_col,
            doc.defs_col,
            doc.context_col,
        ],
    )?;
    Ok(())
}

/// Load every context row scoped to `source_name`, keyed by its canonical
/// `target` string (`qpg://<source>[/<schema>[.<object>]]`) exactly as
/// `context_resolver::resolve` looks them up.
fn load_contexts(tx: &Connection, source_name: &str) -> Result<Vec<ContextEntry>> {
    let mut stmt = tx.prepare(
        "SELECT target, text FROM contexts
         WHERE target = ?1 OR target LIKE ?2",
    )?;
    let source_target = format!("qpg://{source_name}");
    let prefix = format!("qpg://{source_name}/%");
    let rows = stmt.query_map(params![source_target, prefix], |row| {
        Ok(ContextEntry {
            level_key: row.get(0)?,
            text: row.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open::open_in_memory;
    use qpg_model::ObjectKind;

    fn table(name: &str) -> DbObject {
        DbObject {
            object_id: ObjectId::derive("work", ObjectKind::Table, &format!("public.{name}")),
            source_name: "work".into(),
            kind: ObjectKind::Table,
            schema_name: "public".into(),
            object_name: name.into(),
            fqname: format!("public.{name}"),
            parent_object_id: None,
            signature: format!("{name}(id integer)"),
            comment: None,
            definition: String::new(),
        }
    }

    #[test]
    fn rebuild_populates_lexical_and_context_tables() {
        let mut conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO sources (name, dsn, created_at) VALUES ('work', 'postgresql://x', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let objects = vec![table("orders")];
        let staged = StagedSource {
            source_name: "work",
            objects: &objects,
            columns: &[],
            constraints: &[],
            indexes: &[],
            dependencies: &[],
        };
        rebuild_source(&mut conn, &staged).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM db_objects", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let fts_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM objects_fts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fts_count, 1);
    }

    #[test]
    fn rebuild_does_not_disturb_other_sources() {
        let mut conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO sources (name, dsn, created_at) VALUES ('work', 'postgresql://x', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO sources (name, dsn, created_at) VALUES ('other', 'postgresql://y', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let other_obj = DbObject {
            object_id: ObjectId::derive("other", ObjectKind::Table, "public.widgets"),
            source_name: "other".into(),
            kind: ObjectKind::Table,
            schema_name: "public".into(),
            object_name: "widgets".into(),
            fqname: "public.widgets".into(),
            parent_object_id: None,
            signature: String::new(),
            comment: None,
            definition: String::new(),
        };
        rebuild_source(
            &mut conn,
            &StagedSource {
                source_name: "other",
                objects: &[other_obj],
                columns: &[],
                constraints: &[],
                indexes: &[],
                dependencies: &[],
            },
        )
        .unwrap();

        let objects = vec![table("orders")];
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

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM db_objects", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
