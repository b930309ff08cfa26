//! `qpg auth check` (spec §4.2, §6): connects through the guard and
//! reports whether the connected role holds any prohibited privilege.

use qpg_model::{Error, Result};

#[derive(Debug, clap::Args)]
pub struct AuthCheckArgs {
    pub source: String,
    /// Accept a role with extra (write/DDL) privileges instead of failing.
    #[clap(long)]
    pub allow_extra_privileges: bool,
    #[clap(long)]
    pub password_stdin: bool,
}

pub async fn run(catalog_path: &std::path::Path, args: AuthCheckArgs) -> Result<()> {
    let conn = qpg_catalog::open_or_create(catalog_path).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
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

    match &outcome {
        qpg_privilege::PrivilegeOutcome::Pass => {
            println!("pass: {} holds no prohibited privileges", args.source);
            Ok(())
        }
        qpg_privilege::PrivilegeOutcome::Override { prohibited } => {
            println!(
                "override: {} prohibited privilege(s) present but overridden",
                prohibited.len()
            );
            for p in prohibited {
                println!("  {} on {} ({})", p.privilege, p.object, p.role);
            }
            Ok(())
        }
        qpg_privilege::PrivilegeOutcome::Fail { prohibited } => {
            for p in prohibited {
                println!("  {} on {} ({})", p.privilege, p.object, p.role);
            }
            Err(Error::PrivilegeFailure(
                prohibited.iter().map(|p| p.privilege.clone()).collect(),
            ))
        }
    }
}
