//! The fixed set of read-only system-catalog queries the Introspector
//! issues. Each query is narrowly scoped and never touches row data,
//! only `pg_catalog`/`information_schema`.

use sqlx::PgPool;

pub async fn schemas(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT nspname
        FROM pg_namespace
        WHERE nspname NOT IN ('pg_catalog', 'information_schema')
          AND nspname NOT LIKE 'pg_toast%'
          AND nspname NOT LIKE 'pg_temp%'
        ORDER BY nspname
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(n,)| n).collect())
}

/// `(schema, name, is_view, comment, definition)`.
pub async fn relations(
    pool: &PgPool,
    schema: &str,
) -> Result<Vec<(String, String, bool, Option<String>, String)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT
            n.nspname,
            c.relname,
            c.relkind = 'v',
            obj_description(c.oid, 'pg_class'),
            COALESCE(pg_get_viewdef(c.oid, true), '')
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = $1
          AND c.relkind IN ('r', 'v', 'p', 'f', 'm')
        ORDER BY c.relname
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
}

/// `(name, ordinal, data_type, nullable, default, comment)`.
pub async fn columns(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<(String, i32, String, bool, Option<String>, Option<String>)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT
            a.attname,
            a.attnum::int4,
            format_type(a.atttypid, a.atttypmod),
            NOT a.attnotnull,
            pg_get_expr(d.adbin, d.adrelid),
            col_description(a.attrelid, a.attnum)
        FROM pg_attribute a
        JOIN pg_class c ON c.oid = a.attrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
        WHERE n.nspname = $1
          AND c.relname = $2
          AND a.attnum > 0
          AND NOT a.attisdropped
        ORDER BY a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
}

/// `(name, kind, columns, ref_table, ref_columns)`.
#[allow(clippy::type_complexity)]
pub async fn constraints(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<
    Vec<(
        String,
        String,
        Vec<String>,
        Option<String>,
        Vec<String>,
    )>,
    sqlx::Error,
> {
    sqlx::query_as(
        r#"
        SELECT
            con.conname,
            CASE con.contype
                WHEN 'p' THEN 'pk'
                WHEN 'f' THEN 'fk'
                WHEN 'u' THEN 'unique'
                WHEN 'c' THEN 'check'
                ELSE 'check'
            END,
            ARRAY(
                SELECT a.attname FROM pg_attribute a
                WHERE a.attrelid = con.conrelid AND a.attnum = ANY(con.conkey)
                ORDER BY array_position(con.conkey, a.attnum)
            ),
            NULLIF(format('%I.%I', fn.nspname, fc.relname), ''),
            ARRAY(
                SELECT a.attname FROM pg_attribute a
                WHERE a.attrelid = con.confrelid AND a.attnum = ANY(con.confkey)
                ORDER BY array_position(con.confkey, a.attnum)
            )
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_class fc ON fc.oid = con.confrelid
        LEFT JOIN pg_namespace fn ON fn.oid = fc.relnamespace
        WHERE n.nspname = $1
          AND c.relname = $2
          AND con.contype IN ('p', 'f', 'u', 'c')
        ORDER BY con.conname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
}

/// `(name, columns, is_unique)`.
pub async fn indexes(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<(String, Vec<String>, bool)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT
            ic.relname,
            ARRAY(
                SELECT a.attname FROM pg_attribute a
                WHERE a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
                ORDER BY array_position(i.indkey, a.attnum)
            ),
            i.indisunique
        FROM pg_index i
        JOIN pg_class ic ON ic.oid = i.indexrelid
        JOIN pg_class tc ON tc.oid = i.indrelid
        JOIN pg_namespace n ON n.oid = tc.relnamespace
        WHERE n.nspname = $1
          AND tc.relname = $2
        ORDER BY ic.relname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
}

/// `(schema, name, arg_types, comment, definition)`.
pub async fn functions(
    pool: &PgPool,
    schema: &str,
) -> Result<Vec<(String, String, Vec<String>, Option<String>, String)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT
            n.nspname,
            p.proname,
            ARRAY(
                SELECT format_type(t, NULL)
                FROM unnest(p.proargtypes) AS t
            ),
            obj_description(p.oid, 'pg_proc'),
            COALESCE(pg_get_functiondef(p.oid), '')
        FROM pg_proc p
        JOIN pg_namespace n ON n.oid = p.pronamespace
        WHERE n.nspname = $1
        ORDER BY p.proname
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
}

/// `(name, comment)`.
pub async fn extensions(pool: &PgPool) -> Result<Vec<(String, Option<String>)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT e.extname, obj_description(e.oid, 'pg_extension')
        FROM pg_extension e
        ORDER BY e.extname
        "#,
    )
    .fetch_all(pool)
    .await
}

/// View-to-relation dependencies via `pg_depend`: `(view_schema, view_name,
/// ref_schema, ref_name)`.
pub async fn view_dependencies(
    pool: &PgPool,
    schema: &str,
) -> Result<Vec<(String, String, String, String)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT DISTINCT
            vn.nspname, v.relname, rn.nspname, r.relname
        FROM pg_depend d
        JOIN pg_rewrite rw ON rw.oid = d.objid AND d.classid = 'pg_rewrite'::regclass
        JOIN pg_class v ON v.oid = rw.ev_class
        JOIN pg_namespace vn ON vn.oid = v.relnamespace
        JOIN pg_class r ON r.oid = d.refobjid AND d.refclassid = 'pg_class'::regclass
        JOIN pg_namespace rn ON rn.oid = r.relnamespace
        WHERE vn.nspname = $1
          AND v.relkind = 'v'
          AND r.oid <> v.oid
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
}
