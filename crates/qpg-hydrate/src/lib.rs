//! Hydrator (spec §4.10): given an object identifier and a source,
//! assembles one full object view -- the `DbObject` fields plus all
//! columns, constraints, indexes, outgoing/incoming dependencies, and
//! effective context text.

use qpg_model::{Column, Constraint, ConstraintKind, Dependency, DependencyKind, Index, ObjectId, ObjectKind};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HydrateError {
    #[error("hydrator query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("malformed stored row: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HydrateError>;

/// The full object view returned by the Hydrator (spec §4.10).
#[derive(Debug, Clone, Serialize)]
pub struct ObjectView {
    pub object_id: ObjectId,
    pub source_name: String,
    pub kind: ObjectKind,
    pub schema_name: String,
    pub object_name: String,
    pub fqname: String,
    pub signature: String,
    pub comment: Option<String>,
    pub definition: String,
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
    pub indexes: Vec<Index>,
    pub outgoing_dependencies: Vec<Dependency>,
    pub incoming_dependencies: Vec<Dependency>,
    pub effective_context: String,
}

/// Look up by either a `schema.object` fqname or a `#<object_id_fragment>`
/// (spec §4.10). Missing -> [`HydrateError::NotFound`].
pub fn hydrate(conn: &Connection, source_name: &str, identifier: &str) -> Result<ObjectView> {
    let object_id = resolve_identifier(conn, source_name, identifier)?;
    hydrate_by_id(conn, object_id)
}

fn resolve_identifier(conn: &Connection, source_name: &str, identifier: &str) -> Result<ObjectId> {
    if let Some(fragment) = identifier.strip_prefix('#') {
        return ObjectId::from_fragment(fragment)
            .map_err(|_| HydrateError::NotFound(identifier.to_string()));
    }
    conn.query_row(
        "SELECT object_id FROM db_objects WHERE source_name = ?1 AND fqname = ?2",
        params![source_name, identifier],
        |row| row.get::<_, String>(0),
    )
    .optional()?
    .map(|hex| ObjectId::from_hex(hex).map_err(|_| HydrateError::NotFound(identifier.to_string())))
    .transpose()?
    .ok_or_else(|| HydrateError::NotFound(identifier.to_string()))
}

fn hydrate_by_id(conn: &Connection, object_id: ObjectId) -> Result<ObjectView> {
    let id_hex = object_id.to_string();

    let base = conn
        .query_row(
            "SELECT source_name, kind, schema_name, object_name, fqname, signature, comment, definition
             FROM db_objects WHERE object_id = ?1",
            params![id_hex],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| HydrateError::NotFound(id_hex.clone()))?;

    let (source_name, kind_str, schema_name, object_name, fqname, signature, comment, definition) =
        base;
    let kind: ObjectKind = kind_str
        .parse()
        .map_err(|_| HydrateError::NotFound(id_hex.clone()))?;

    let columns = load_columns(conn, object_id)?;
    let constraints = load_constraints(conn, object_id)?;
    let indexes = load_indexes(conn, object_id)?;
    let outgoing_dependencies = load_dependencies(conn, object_id, true)?;
    let incoming_dependencies = load_dependencies(conn, object_id, false)?;
    let effective_context = conn
        .query_row(
            "SELECT text FROM object_context_effective WHERE object_id = ?1",
            params![id_hex],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .unwrap_or_default();

    Ok(ObjectView {
        object_id,
        source_name,
        kind,
        schema_name,
        object_name,
        fqname,
        signature,
        comment,
        definition,
        columns,
        constraints,
        indexes,
        outgoing_dependencies,
        incoming_dependencies,
        effective_context,
    })
}

fn load_columns(conn: &Connection, parent: ObjectId) -> Result<Vec<Column>> {
    let mut stmt = conn.prepare(
        "SELECT object_id, ordinal, name, data_type, nullable, default_expr, comment
         FROM columns WHERE parent_object_id = ?1 ORDER BY ordinal",
    )?;
    let rows = stmt.query_map(params![parent.to_string()], |row| {
        Ok(Column {
            object_id: parse_object_id(row.get::<_, String>(0)?),
            parent_object_id: parent,
            ordinal: row.get(1)?,
            name: row.get(2)?,
            data_type: row.get(3)?,
            nullable: row.get::<_, i64>(4)? != 0,
            default: row.get(5)?,
            comment: row.get(6)?,
        })
    })?;
    collect(rows)
}

fn load_constraints(conn: &Connection, parent: ObjectId) -> Result<Vec<Constraint>> {
    let mut stmt = conn.prepare(
        "SELECT object_id, name, kind, columns, references_table, references_columns
         FROM constraints WHERE parent_object_id = ?1",
    )?;
    let rows = stmt.query_map(params![parent.to_string()], |row| {
        let kind_str: String = row.get(2)?;
        let columns_json: String = row.get(3)?;
        let ref_columns_json: String = row.get(5)?;
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            kind_str,
            columns_json,
            row.get::<_, Option<String>>(4)?,
            ref_columns_json,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, name, kind_str, columns_json, references_table, ref_columns_json) = row?;
        out.push(Constraint {
            object_id: parse_object_id(id),
            parent_object_id: parent,
            name,
            kind: kind_str.parse().unwrap_or(ConstraintKind::Check),
            columns: serde_json::from_str(&columns_json)?,
            references_table,
            references_columns: serde_json::from_str(&ref_columns_json)?,
        });
    }
    Ok(out)
}

fn load_indexes(conn: &Connection, parent: ObjectId) -> Result<Vec<Index>> {
    let mut stmt = conn.prepare(
        "SELECT object_id, name, columns, is_unique FROM indexes WHERE parent_object_id = ?1",
    )?;
    let rows = stmt.query_map(params![parent.to_string()], |row| {
        let columns_json: String = row.get(2)?;
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            columns_json,
            row.get::<_, i64>(3)? != 0,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, name, columns_json, is_unique) = row?;
        out.push(Index {
            object_id: parse_object_id(id),
            parent_object_id: parent,
            name,
            columns: serde_json::from_str(&columns_json)?,
            is_unique,
        });
    }
    Ok(out)
}

fn load_dependencies(conn: &Connection, id: ObjectId, outgoing: bool) -> Result<Vec<Dependency>> {
    let sql = if outgoing {
        "SELECT from_object_id, to_object_id, kind FROM dependencies WHERE from_object_id = ?1"
    } else {
        "SELECT from_object_id, to_object_id, kind FROM dependencies WHERE to_object_id = ?1"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (from, to, kind_str) = row?;
        let kind: DependencyKind = kind_str.parse().unwrap_or(DependencyKind::Fk);
        out.push(Dependency {
            from_object_id: parse_object_id(from),
            to_object_id: parse_object_id(to),
            kind,
        });
    }
    Ok(out)
}

fn parse_object_id(hex: String) -> ObjectId {
    ObjectId::from_hex(hex).expect("object ids stored in the catalog are always well-formed")
}

fn collect<I, T, E>(rows: I) -> std::result::Result<Vec<T>, E>
where
    I: Iterator<Item = std::result::Result<T, E>>,
{
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qpg_catalog::{open_in_memory, rebuild_source, upsert_source, StagedSource};
    use qpg_model::{ObjectKind, Source};

    fn seed(conn: &mut Connection) -> ObjectId {
        upsert_source(conn, &Source::new("work", "postgresql://x")).unwrap();
        let table = DbObjectFixture::table();
        let col = DbObjectFixture::column(table.object_id);
        let staged = StagedSource {
            source_name: "work",
            objects: &[table.clone()],
            columns: &[col],
            constraints: &[],
            indexes: &[],
            dependencies: &[],
        };
        rebuild_source(conn, &staged).unwrap();
        table.object_id
    }

    struct DbObjectFixture;
    impl DbObjectFixture {
        fn table() -> qpg_model::DbObject {
            qpg_model::DbObject {
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
            }
        }
        fn column(parent: ObjectId) -> Column {
            Column {
                object_id: ObjectId::derive("work", ObjectKind::Column, "public.orders.id"),
                parent_object_id: parent,
                ordinal: 1,
                name: "id".into(),
                data_type: "integer".into(),
                nullable: false,
                default: None,
                comment: None,
            }
        }
    }

    #[test]
    fn hydrates_by_fqname() {
        let mut conn = open_in_memory().unwrap();
        seed(&mut conn);
        let view = hydrate(&conn, "work", "public.orders").unwrap();
        assert_eq!(view.fqname, "public.orders");
        assert_eq!(view.columns.len(), 1);
    }

    #[test]
    fn hydrates_by_object_id_fragment() {
        let mut conn = open_in_memory().unwrap();
        let id = seed(&mut conn);
        let fragment = format!("#{id}");
        let view = hydrate(&conn, "work", &fragment).unwrap();
        assert_eq!(view.object_id, id);
    }

    #[test]
    fn missing_object_is_not_found() {
        let mut conn = open_in_memory().unwrap();
        seed(&mut conn);
        assert!(matches!(
            hydrate(&conn, "work", "public.nonexistent"),
            Err(HydrateError::NotFound(_))
        ));
    }
}
