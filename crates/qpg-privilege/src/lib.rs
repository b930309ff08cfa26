//! Privilege Evaluator: walks role membership transitively to derive the
//! connected role's effective privilege set, then checks it against a
//! baseline of allowed read operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Privileges that are never acceptable for the connected role to hold,
/// anywhere in the target database.
pub const PROHIBITED_PRIVILEGES: &[&str] = &[
    "INSERT",
    "UPDATE",
    "DELETE",
    "TRUNCATE",
    "REFERENCES",
    "TRIGGER",
    "CREATE",
    "ALTER",
    "DROP",
    "DATABASE CREATE",
    "DATABASE TEMP",
    "FUNCTION EXECUTE",
];

#[derive(Debug, Error)]
pub enum PrivilegeError {
    #[error("querying role membership or grants: {0}")]
    Query(#[source] sqlx::Error),
}

/// A single prohibited-privilege finding, surfaced in `Fail`/`Override`
/// reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProhibitedGrant {
    pub role: String,
    pub privilege: String,
    pub object: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrivilegeOutcome {
    Pass,
    Fail { prohibited: Vec<ProhibitedGrant> },
    Override { prohibited: Vec<ProhibitedGrant> },
}

impl PrivilegeOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, PrivilegeOutcome::Pass | PrivilegeOutcome::Override { .. })
    }

    pub fn prohibited(&self) -> &[ProhibitedGrant] {
        match self {
            PrivilegeOutcome::Pass => &[],
            PrivilegeOutcome::Fail { prohibited } | PrivilegeOutcome::Override { prohibited } => {
                prohibited
            }
        }
    }
}

/// Compute the transitive closure of roles the connected role is a member
/// of, via `pg_auth_members`.
pub async fn effective_roles(pool: &sqlx::PgPool) -> Result<Vec<String>, PrivilegeError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        WITH RECURSIVE membership AS (
            SELECT oid AS role_oid, rolname
            FROM pg_roles
            WHERE rolname = current_user

            UNION

            SELECT r.oid, r.rolname
            FROM pg_auth_members m
            JOIN pg_roles r ON r.oid = m.roleid
            JOIN membership ON membership.role_oid = m.member
        )
        SELECT DISTINCT rolname FROM membership
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(PrivilegeError::Query)?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Enumerate any prohibited privilege grants held, directly or via role
/// membership, by any role in `roles`. The baseline allows only
/// `SELECT`/`USAGE`/catalog reads.
pub async fn find_prohibited_grants(
    pool: &sqlx::PgPool,
    roles: &[String],
) -> Result<Vec<ProhibitedGrant>, PrivilegeError> {
    let mut found = Vec::new();

    let table_grants: Vec<(String, String, String, String)> = sqlx::query_as(
        r#"
        SELECT grantee, privilege_type, table_schema, table_name
        FROM information_schema.role_table_grants
        WHERE grantee = ANY($1)
          AND privilege_type NOT IN ('SELECT')
        "#,
    )
    .bind(roles)
    .fetch_all(pool)
    .await
    .map_err(PrivilegeError::Query)?;

    for (grantee, privilege, schema, table) in table_grants {
        found.push(ProhibitedGrant {
            role: grantee,
            privilege,
            object: format!("{schema}.{table}"),
        });
    }

    let schema_grants: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT grantee, privilege_type, object_schema
        FROM information_schema.usage_privileges
        WHERE grantee = ANY($1)
          AND privilege_type NOT IN ('USAGE')
        "#,
    )
    .bind(roles)
    .fetch_all(pool)
    .await
    .unwrap_or_default();

    for (grantee, privilege, schema) in schema_grants {
        found.push(ProhibitedGrant {
            role: grantee,
            privilege,
            object: schema,
        });
    }

    let routine_grants: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT grantee, privilege_type, routine_name
        FROM information_schema.role_routine_grants
        WHERE grantee = ANY($1)
          AND privilege_type = 'EXECUTE'
        "#,
    )
    .bind(roles)
    .fetch_all(pool)
    .await
    .unwrap_or_default();

    for (grantee, privilege, routine) in routine_grants {
        found.push(ProhibitedGrant {
            role: grantee,
            privilege: format!("FUNCTION {privilege}"),
            object: routine,
        });
    }

    Ok(found)
}

/// Evaluate the connected role's effective privilege set against the
/// baseline. `allow_override` maps to the operator's
/// `--allow-extra-privileges` flag.
pub async fn evaluate(
    pool: &sqlx::PgPool,
    allow_override: bool,
) -> Result<PrivilegeOutcome, PrivilegeError> {
    let roles = effective_roles(pool).await?;
    let prohibited = find_prohibited_grants(pool, &roles).await?;

    if prohibited.is_empty() {
        Ok(PrivilegeOutcome::Pass)
    } else if allow_override {
        tracing::warn!(
            count = prohibited.len(),
            "privilege evaluator overridden: prohibited privileges present"
        );
        Ok(PrivilegeOutcome::Override { prohibited })
    } else {
        Ok(PrivilegeOutcome::Fail { prohibited })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_pass_classifies_override_as_passing() {
        assert!(PrivilegeOutcome::Pass.is_pass());
        assert!(PrivilegeOutcome::Override {
            prohibited: vec![]
        }
        .is_pass());
        assert!(!PrivilegeOutcome::Fail {
            prohibited: vec![]
        }
        .is_pass());
    }

    #[test]
    fn prohibited_list_excludes_select_and_usage() {
        assert!(!PROHIBITED_PRIVILEGES.contains(&"SELECT"));
        assert!(!PROHIBITED_PRIVILEGES.contains(&"USAGE"));
        assert!(PROHIBITED_PRIVILEGES.contains(&"INSERT"));
    }
}
