//! Introspector & Normalizer: enumerates schemas, tables, columns,
//! constraints, indexes, views, functions, extensions and their
//! dependencies from a guarded connection, filters by the source's scope,
//! and normalizes every result into the canonical object model.

mod normalize;
mod queries;

use qpg_model::{
    Column, Constraint, ConstraintKind, Dependency, DependencyKind, DbObject, Index, ObjectId,
    ObjectKind, Source,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("introspection query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("canonical-identity collision for {kind} {fqname}")]
    Collision { kind: String, fqname: String },
}

/// Everything the Introspector extracted and the Normalizer canonicalized
/// for one source, ready to be staged into the catalog.
#[derive(Debug, Default)]
pub struct IntrospectedCatalog {
    pub objects: Vec<DbObject>,
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
    pub indexes: Vec<Index>,
    pub dependencies: Vec<Dependency>,
}

struct Builder<'a> {
    source: &'a Source,
    out: IntrospectedCatalog,
    seen: std::collections::HashSet<(String, String)>,
}

impl<'a> Builder<'a> {
    fn new(source: &'a Source) -> Self {
        Builder {
            source,
            out: IntrospectedCatalog::default(),
            seen: Default::default(),
        }
    }

    fn push_object(&mut self, obj: DbObject) -> Result<ObjectId, IntrospectError> {
        let key = (obj.kind.as_str().to_string(), obj.fqname.clone());
        if !self.seen.insert(key) {
            return Err(IntrospectError::Collision {
                kind: obj.kind.to_string(),
                fqname: obj.fqname.clone(),
            });
        }
        let id = obj.object_id;
        self.out.objects.push(obj);
        Ok(id)
    }
}

/// Run the full introspection + normalization pipeline for `source` over
/// an already-guarded connection pool.
pub async fn introspect(
    pool: &sqlx::PgPool,
    source: &Source,
) -> Result<IntrospectedCatalog, IntrospectError> {
    let mut b = Builder::new(source);

    let all_schemas = queries::schemas(pool).await?;
    let schemas: Vec<String> = all_schemas
        .into_iter()
        .filter(|s| source.in_scope(s, s, s))
        .collect();

    for schema_name in &schemas {
        let schema_id = b.push_object(DbObject {
            object_id: ObjectId::derive(&source.name, ObjectKind::Schema, schema_name),
            source_name: source.name.clone(),
            kind: ObjectKind::Schema,
            schema_name: schema_name.clone(),
            object_name: schema_name.clone(),
            fqname: schema_name.clone(),
            parent_object_id: None,
            signature: String::new(),
            comment: None,
            definition: String::new(),
        })?;
        let _ = schema_id;

        index_relations(pool, &mut b, schema_name).await?;
        index_functions(pool, &mut b, schema_name).await?;
        index_view_dependencies(pool, &mut b, schema_name).await?;
    }

    index_extensions(pool, &mut b).await?;

    tracing::info!(
        source = %source.name,
        objects = b.out.objects.len(),
        "introspection complete"
    );
    Ok(b.out)
}

async fn index_relations(
    pool: &sqlx::PgPool,
    b: &mut Builder<'_>,
    schema_name: &str,
) -> Result<(), IntrospectError> {
    for (schema, name, is_view, comment, definition) in queries::relations(pool, schema_name).await? {
        let fqname = normalize::fqname(&schema, &name);
        let bare = name.clone();
        if !b.source.in_scope(&schema, &fqname, &bare) {
            continue;
        }
        let kind = if is_view {
            ObjectKind::View
        } else {
            ObjectKind::Table
        };

        let raw_columns = queries::columns(pool, &schema, &name).await?;
        let signature = normalize::table_signature(
            &raw_columns
                .iter()
                .map(|(n, _, ty, ..)| (n.clone(), ty.clone()))
                .collect::<Vec<_>>(),
        );

        let parent_id = b.push_object(DbObject {
            object_id: ObjectId::derive(&b.source.name, kind, &fqname),
            source_name: b.source.name.clone(),
            kind,
            schema_name: schema.clone(),
            object_name: name.clone(),
            fqname: fqname.clone(),
            parent_object_id: None,
            signature,
            comment,
            definition,
        })?;

        for (col_name, ordinal, data_type, nullable, default, col_comment) in raw_columns {
            let col_fqname = format!("{fqname}.{col_name}");
            let col_id = ObjectId::derive(&b.source.name, ObjectKind::Column, &col_fqname);
            b.out.columns.push(Column {
                object_id: col_id,
                parent_object_id: parent_id,
                ordinal,
                name: col_name,
                data_type,
                nullable,
                default,
                comment: col_comment,
            });
        }

        for (cname, ckind, columns, ref_table, ref_columns) in
            queries::constraints(pool, &schema, &name).await?
        {
            let kind: ConstraintKind = ckind.parse().unwrap_or(ConstraintKind::Check);
            let con_fqname = format!("{fqname}.{cname}");
            let con_id = ObjectId::derive(&b.source.name, ObjectKind::Constraint, &con_fqname);
            b.out.constraints.push(Constraint {
                object_id: con_id,
                parent_object_id: parent_id,
                name: cname,
                kind,
                columns,
                references_table: ref_table.clone(),
                references_columns: ref_columns,
            });

            if kind == ConstraintKind::Fk {
                if let Some(ref_table) = ref_table {
                    let to_id = ObjectId::derive(&b.source.name, ObjectKind::Table, &ref_table);
                    b.out.dependencies.push(Dependency {
                        from_object_id: parent_id,
                        to_object_id: to_id,
                        kind: DependencyKind::Fk,
                    });
                }
            }
        }

        for (iname, columns, is_unique) in queries::indexes(pool, &schema, &name).await? {
            let idx_fqname = format!("{fqname}.{iname}");
            let idx_id = ObjectId::derive(&b.source.name, ObjectKind::Index, &idx_fqname);
            b.out.indexes.push(Index {
                object_id: idx_id,
                parent_object_id: parent_id,
                name: iname,
                columns,
                is_unique,
            });
            b.out.dependencies.push(Dependency {
                from_object_id: idx_id,
                to_object_id: parent_id,
                kind: DependencyKind::IndexOn,
            });
        }
    }
    Ok(())
}

async fn index_functions(
    pool: &sqlx::PgPool,
    b: &mut Builder<'_>,
    schema_name: &str,
) -> Result<(), IntrospectError> {
    for (schema, name, arg_types, comment, definition) in
        queries::functions(pool, schema_name).await?
    {
        let fqname = normalize::fqname(&schema, &name);
        if !b.source.in_scope(&schema, &fqname, &name) {
            continue;
        }
        let signature = normalize::function_signature(&arg_types);
        b.push_object(DbObject {
            object_id: ObjectId::derive(&b.source.name, ObjectKind::Function, &fqname),
            source_name: b.source.name.clone(),
            kind: ObjectKind::Function,
            schema_name: schema,
            object_name: name,
            fqname,
            parent_object_id: None,
            signature,
            comment,
            definition,
        })?;
    }
    Ok(())
}

async fn index_view_dependencies(
    pool: &sqlx::PgPool,
    b: &mut Builder<'_>,
    schema_name: &str,
) -> Result<(), IntrospectError> {
    for (vschema, vname, rschema, rname) in queries::view_dependencies(pool, schema_name).await? {
        let view_fqname = normalize::fqname(&vschema, &vname);
        let ref_fqname = normalize::fqname(&rschema, &rname);
        if !b.seen.contains(&("view".to_string(), view_fqname.clone())) {
            continue;
        }
        let from_id = ObjectId::derive(&b.source.name, ObjectKind::View, &view_fqname);
        // The referenced relation may be a table or a view; dependencies
        // are resolved against whichever kind is actually indexed.
        let to_id = if b.seen.contains(&("table".to_string(), ref_fqname.clone())) {
            ObjectId::derive(&b.source.name, ObjectKind::Table, &ref_fqname)
        } else {
            ObjectId::derive(&b.source.name, ObjectKind::View, &ref_fqname)
        };
        b.out.dependencies.push(Dependency {
            from_object_id: from_id,
            to_object_id: to_id,
            kind: DependencyKind::ViewRef,
        });
    }
    Ok(())
}

async fn index_extensions(
    pool: &sqlx::PgPool,
    b: &mut Builder<'_>,
) -> Result<(), IntrospectError> {
    for (name, comment) in queries::extensions(pool).await? {
        if !b.source.in_scope("", &name, &name) {
            continue;
        }
        b.push_object(DbObject {
            object_id: ObjectId::derive(&b.source.name, ObjectKind::Extension, &name),
            source_name: b.source.name.clone(),
            kind: ObjectKind::Extension,
            schema_name: String::new(),
            object_name: name.clone(),
            fqname: name,
            parent_object_id: None,
            signature: String::new(),
            comment,
            definition: String::new(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_duplicate_identity() {
        let source = Source::new("work", "postgresql://localhost/db");
        let mut b = Builder::new(&source);
        let obj = DbObject {
            object_id: ObjectId::derive("work", ObjectKind::Table, "public.orders"),
            source_name: "work".into(),
            kind: ObjectKind::Table,
            schema_name: "public".into(),
            object_name: "orders".into(),
            fqname: "public.orders".into(),
            parent_object_id: None,
            signature: String::new(),
            comment: None,
            definition: String::new(),
        };
        assert!(b.push_object(obj.clone()).is_ok());
        assert!(matches!(
            b.push_object(obj),
            Err(IntrospectError::Collision { .. })
        ));
    }
}
