//! `qpg`: CLI entry point (spec §6 External collaborators). Thin argument
//! parsing and dispatch over the library crates; no core logic lives here.
//! Grounded on `flowctl`'s `Flowctl`/`Subcommand`/`run_internal` dispatch
//! shape (teacher), generalized to this system's flat (non-external)
//! subcommand set.

mod commands;
mod logging;

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use logging::{init_logging, LogArgs};
use qpg_model::{Error, Result};
use qpg_query::RerankConfig;

/// A local-first PostgreSQL schema indexing and hybrid-retrieval engine.
#[derive(Debug, Parser)]
#[clap(name = "qpg", version)]
struct Qpg {
    #[clap(flatten)]
    log_args: LogArgs,

    #[clap(flatten)]
    config_args: qpg_config::ConfigArgs,

    /// Overrides the default catalog path.
    #[clap(long, global = true)]
    catalog: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
#[clap(rename_all = "kebab-case")]
enum Command {
    /// Manage registered sources.
    Source(commands::source::SourceArgs),
    /// Manage operator-authored context notes.
    Context(commands::context::ContextArgs),
    /// Run the full introspect -> normalize -> index pipeline for a source.
    Update(commands::update::UpdateArgs),
    /// Connect through the guard and evaluate the role's privileges.
    Auth(AuthArgs),
    /// Lexical-only retrieval.
    Search(commands::search::SearchArgs),
    /// Vector-only retrieval.
    Vsearch(commands::search::SearchArgs),
    /// Full hybrid retrieval (expand, fuse, optional rerank).
    Query(commands::search::SearchArgs),
    /// Fetch a full object view by fqname or object id.
    Get(commands::get::GetArgs),
    /// Report per-source object counts and staleness.
    Status,
    /// Serve the retrieval tool surface over stdio or HTTP.
    Serve(commands::serve::ServeArgs),
    /// Manage local embedding model assets.
    Model(ModelArgs),
}

#[derive(Debug, clap::Args)]
struct AuthArgs {
    #[clap(subcommand)]
    command: AuthCommand,
}

#[derive(Debug, clap::Subcommand)]
enum AuthCommand {
    Check(commands::auth::AuthCheckArgs),
}

#[derive(Debug, clap::Args)]
struct ModelArgs {
    #[clap(subcommand)]
    command: ModelCommand,
}

#[derive(Debug, clap::Subcommand)]
enum ModelCommand {
    Init(commands::model::ModelInitArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Qpg::parse();
    init_logging(&cli.log_args);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: building async runtime: {e}");
            return std::process::ExitCode::from(4);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => std::process::ExitCode::from(0),
        Err(err) => {
            tracing::error!(error = ?err, "command failed");
            eprintln!("error: {err}");
            std::process::ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run(cli: Qpg) -> Result<()> {
    let catalog_path = cli.catalog.unwrap_or_else(qpg_catalog::default_catalog_path);
    let config_path = qpg_config::default_config_path();
    let config = qpg_config::resolve(cli.config_args, &config_path)
        .map_err(|e| Error::ConfigError(e.to_string()))?;
    let rerank = config.rerank_hook.as_ref().map(|hook| RerankConfig {
        command: hook.display().to_string(),
        args: Vec::new(),
        timeout: config.rerank_timeout_or_default().max(Duration::from_millis(1)),
    });

    match cli.command {
        Command::Source(args) => commands::source::run(&catalog_path, args),
        Command::Context(args) => commands::context::run(&catalog_path, args),
        Command::Update(args) => commands::update::run(&catalog_path, args).await,
        Command::Auth(AuthArgs {
            command: AuthCommand::Check(args),
        }) => commands::auth::run(&catalog_path, args).await,
        Command::Search(args) => commands::search::run_lexical(&catalog_path, args),
        Command::Vsearch(args) => commands::search::run_vector(&catalog_path, args),
        Command::Query(args) => commands::search::run_hybrid(&catalog_path, args, rerank).await,
        Command::Get(args) => commands::get::run(&catalog_path, args),
        Command::Status => commands::status::run(&catalog_path),
        Command::Serve(args) => commands::serve::run(&catalog_path, rerank, args).await,
        Command::Model(ModelArgs {
            command: ModelCommand::Init(args),
        }) => commands::model::run(args).await,
    }
}

/// Read a password from stdin for `--password-stdin` (spec §4.1: "Passwords
/// may be supplied out-of-band (stdin read) rather than embedded in the
/// stored DSN").
pub(crate) fn read_password_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| Error::Other(anyhow::anyhow!("reading password from stdin: {e}")))?;
    Ok(buf.trim_end_matches(['\n', '\r']).to_string())
}
