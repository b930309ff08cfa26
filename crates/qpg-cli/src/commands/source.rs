//! `qpg source add|remove|list` (spec §4.1, §6): registers, drops, and
//! lists named sources in the local catalog. Never touches the source
//! database itself -- that only happens on `qpg update`/`qpg auth`.

use qpg_model::{Error, Result, Source};

#[derive(Debug, clap::Args)]
pub struct SourceArgs {
    #[clap(subcommand)]
    pub command: SourceCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SourceCommand {
    /// Register a new source, or update an existing one's DSN/scope.
    Add {
        name: String,
        /// Connection string. A password embedded here is stripped before
        /// storage; supply `--password-stdin` to provide one out-of-band
        /// at connect time instead.
        dsn: String,
        #[clap(long = "include-schema")]
        include_schemas: Vec<String>,
        #[clap(long = "skip")]
        skip_patterns: Vec<String>,
    },
    /// Drop a source and every row derived from it.
    Remove { name: String },
    /// List registered sources, DSNs redacted.
    List,
}

pub fn run(catalog_path: &std::path::Path, args: SourceArgs) -> Result<()> {
    let mut conn = qpg_catalog::open_or_create(catalog_path)
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;

    match args.command {
        SourceCommand::Add {
            name,
            dsn,
            include_schemas,
            skip_patterns,
        } => {
            let normalized = qpg_guard::normalize_dsn(&dsn)
                .map_err(|e| Error::GuardViolation(e.to_string()))?;
            let mut source = Source::new(&name, normalized);
            source.include_schemas = include_schemas.into_iter().collect();
            source.skip_patterns = skip_patterns.into_iter().collect();
            qpg_catalog::upsert_source(&conn, &source).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
            println!("registered source {name}");
        }
        SourceCommand::Remove { name } => {
            qpg_catalog::remove_source(&mut conn, &name).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
            println!("removed source {name}");
        }
        SourceCommand::List => {
            let sources = qpg_catalog::list_sources(&conn).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
            print_table(&sources);
        }
    }
    Ok(())
}

fn print_table(sources: &[Source]) {
    let mut table = comfy_table::Table::new();
    table.set_header(vec!["name", "dsn", "last indexed"]);
    for s in sources {
        table.add_row(vec![
            s.name.clone(),
            qpg_guard::redact_dsn(&s.dsn),
            s.last_indexed_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
        ]);
    }
    println!("{table}");
}
