//! `qpg context add|remove|list` (spec §3 "Context. Operator-authored
//! semantic note."): the only write path onto the `contexts` table. Every
//! other consumer -- `object_context_effective`, `context_col`, the dense
//! embedding text -- only ever reads what this command writes.

use qpg_model::{Error, Result};

#[derive(Debug, clap::Args)]
pub struct ContextArgs {
    #[clap(subcommand)]
    pub command: ContextCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum ContextCommand {
    /// Add or replace the note at a target (`qpg://<source>`,
    /// `qpg://<source>/<schema>`, or `qpg://<source>/<schema.object>`).
    /// Re-adding an existing target updates its text rather than erroring,
    /// since `target` is unique.
    Add { target: String, text: String },
    /// Remove the note at a target, if one exists.
    Remove { target: String },
    /// List notes, optionally scoped to one source.
    List {
        #[clap(long)]
        source: Option<String>,
    },
}

pub fn run(catalog_path: &std::path::Path, args: ContextArgs) -> Result<()> {
    let conn = qpg_catalog::open_or_create(catalog_path)
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;

    match args.command {
        ContextCommand::Add { target, text } => {
            qpg_catalog::upsert_context(&conn, &target, &text)
                .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
            println!("set context at {target}");
        }
        ContextCommand::Remove { target } => {
            qpg_catalog::remove_context(&conn, &target)
                .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
            println!("removed context at {target}");
        }
        ContextCommand::List { source } => {
            let contexts = qpg_catalog::list_contexts(&conn, source.as_deref())
                .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
            print_table(&contexts);
        }
    }
    Ok(())
}

fn print_table(contexts: &[qpg_model::Context]) {
    let mut table = comfy_table::Table::new();
    table.set_header(vec!["target", "text"]);
    for c in contexts {
        table.add_row(vec![c.target.clone(), c.text.clone()]);
    }
    println!("{table}");
}
