//! `qpg status` (spec §6): per-source object counts and staleness.

use qpg_model::{Error, Result};

pub fn run(catalog_path: &std::path::Path) -> Result<()> {
    let conn = qpg_catalog::open_or_create(catalog_path).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    let sources = qpg_catalog::list_sources(&conn).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;

    let mut table = comfy_table::Table::new();
    table.set_header(vec!["source", "objects", "last indexed"]);
    for source in &sources {
        let count = qpg_catalog::object_count(&conn, &source.name).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
        table.add_row(vec![
            source.name.clone(),
            count.to_string(),
            source
                .last_indexed_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
        ]);
    }
    println!("catalog: {}", catalog_path.display());
    println!("schema version: {}", qpg_catalog::SCHEMA_VERSION);
    println!("{table}");
    Ok(())
}
