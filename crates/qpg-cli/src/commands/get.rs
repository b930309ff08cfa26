//! `qpg get <source> <identifier>` (spec §4.10): full object view.

use qpg_model::{Error, Result};

#[derive(Debug, clap::Args)]
pub struct GetArgs {
    pub source: String,
    /// An fqname (`schema.object`) or a `#object_id` fragment.
    pub identifier: String,
    #[clap(long)]
    pub json: bool,
}

pub fn run(catalog_path: &std::path::Path, args: GetArgs) -> Result<()> {
    let conn = qpg_catalog::open_or_create(catalog_path).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    let view = qpg_hydrate::hydrate(&conn, &args.source, &args.identifier).map_err(|e| match e {
        qpg_hydrate::HydrateError::NotFound(id) => Error::NotFound(id),
        other => Error::Other(anyhow::anyhow!(other)),
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view).map_err(|e| Error::Other(anyhow::anyhow!(e)))?);
        return Ok(());
    }

    println!("{} ({})", view.fqname, view.kind);
    if let Some(comment) = &view.comment {
        println!("  comment: {comment}");
    }
    if !view.effective_context.is_empty() {
        println!("  context: {}", view.effective_context);
    }
    for col in &view.columns {
        println!("  column {} {}", col.name, col.data_type);
    }
    for con in &view.constraints {
        println!("  constraint {} ({:?})", con.name, con.kind);
    }
    for idx in &view.indexes {
        println!("  index {}", idx.name);
    }
    for dep in &view.outgoing_dependencies {
        println!("  depends on {} ({:?})", dep.to_object_id, dep.kind);
    }
    for dep in &view.incoming_dependencies {
        println!("  depended on by {} ({:?})", dep.from_object_id, dep.kind);
    }
    Ok(())
}
