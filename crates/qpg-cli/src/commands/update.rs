//! `qpg update --source <name>` (spec §4.1-4.8): the full pipeline --
//! guard, privilege gate, introspect, normalize, stage, rebuild, embed.

use qpg_model::{Error, Result};

#[derive(Debug, clap::Args)]
pub struct UpdateArgs {
    pub source: String,
    #[clap(long)]
    pub allow_extra_privileges: bool,
    #[clap(long)]
    pub password_stdin: bool,
    /// Skip (re-)embedding; useful when the model isn't installed yet and
    /// only lexical search is wanted for now.
    #[clap(long)]
    pub skip_embed: bool,
}

pub async fn run(catalog_path: &std::path::Path, args: UpdateArgs) -> Result<()> {
    let mut conn = qpg_catalog::open_or_create(catalog_path).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    let source = qpg_catalog::get_source(&conn, &args.source)
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?
        .ok_or_else(|| Error::NotFound(format!("source {}", args.source)))?;

    let password = if args.password_stdin {
        Some(crate::read_password_stdin()?)
    } else {
        None
    };

    let pool = qpg_guard::connect(&source.dsn, password.as_deref())
        .await
        .map_err(|e| Error::GuardViolation(e.to_string()))?;

    let outcome = qpg_privilege::evaluate(&pool, args.allow_extra_privileges)
        .await
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    if let qpg_privilege::PrivilegeOutcome::Fail { prohibited } = &outcome {
        return Err(Error::PrivilegeFailure(
            prohibited.iter().map(|p| p.privilege.clone()).collect(),
        ));
    }

    let introspected = qpg_introspect::introspect(&pool, &source)
        .await
        .map_err(|e| Error::IndexBuildError {
            source: args.source.clone(),
            reason: e.to_string(),
        })?;

    let staged = qpg_catalog::StagedSource {
        source_name: &args.source,
        objects: &introspected.objects,
        columns: &introspected.columns,
        constraints: &introspected.constraints,
        indexes: &introspected.indexes,
        dependencies: &introspected.dependencies,
    };
    qpg_catalog::rebuild_source(&mut conn, &staged).map_err(|e| Error::IndexBuildError {
        source: args.source.clone(),
        reason: e.to_string(),
    })?;

    println!(
        "indexed {} objects for source {}",
        introspected.objects.len(),
        args.source
    );

    if !args.skip_embed {
        embed_source(&conn, &args.source)?;
    }

    Ok(())
}

/// Re-embed every object whose lexical text changed since the last embed
/// (spec §4.6, §4.8: "rebuilt when the source text hash changes").
fn embed_source(conn: &rusqlite::Connection, source_name: &str) -> Result<()> {
    let model_dir = qpg_vector::model_dir();
    if !model_dir.join("model.onnx").exists() {
        tracing::warn!("embedding model not installed, run `qpg model init`; leaving vectors as-is");
        return Ok(());
    }
    let model = qpg_vector::EmbeddingModel::load(&model_dir).map_err(|e| Error::IndexBuildError {
        source: source_name.to_string(),
        reason: format!("loading embedding model: {e}"),
    })?;

    let mut stmt = conn
        .prepare(
            "SELECT ld.object_id, ld.name_col, ld.comment_col, ld.defs_col, ld.context_col, ld.text_hash
             FROM lexical_docs ld
             JOIN db_objects o ON o.object_id = ld.object_id
             WHERE o.source_name = ?1",
        )
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;

    let rows = stmt
        .query_map(rusqlite::params![source_name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;

    let mut embedded = 0;
    for (id_hex, name_col, comment_col, defs_col, context_col, text_hash) in rows {
        let object_id = qpg_model::ObjectId::from_hex(&id_hex)
            .map_err(|e| Error::Other(anyhow::anyhow!("malformed object_id {id_hex}: {e}")))?;
        let doc = qpg_catalog::LexicalDoc {
            object_id,
            name_col,
            comment_col,
            defs_col,
            context_col,
        };
        let already = qpg_vector::stored_text_hash(conn, doc.object_id)
            .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
        if already.as_deref() == Some(text_hash.as_str()) {
            continue;
        }
        let vector = model.embed(&doc.dense_text()).map_err(|e| Error::IndexBuildError {
            source: source_name.to_string(),
            reason: format!("embedding {}: {e}", doc.object_id),
        })?;
        qpg_vector::store(conn, doc.object_id, &vector, qpg_vector::MODEL_ID, &text_hash)
            .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
        embedded += 1;
    }
    println!("embedded {embedded} object(s)");
    Ok(())
}
