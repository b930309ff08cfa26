use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named handle bound to a connection string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    /// The stored DSN: read-only options merged in, password never
    /// included.
    pub dsn: String,
    pub include_schemas: BTreeSet<String>,
    pub skip_patterns: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub last_indexed_at: Option<DateTime<Utc>>,
}

impl Source {
    pub fn new(name: impl Into<String>, dsn: impl Into<String>) -> Self {
        Source {
            name: name.into(),
            dsn: dsn.into(),
            include_schemas: BTreeSet::new(),
            skip_patterns: BTreeSet::new(),
            created_at: Utc::now(),
            last_indexed_at: None,
        }
    }

    /// Whether `fqname` (or its bare object name) is in scope for this
    /// source, given `include_schemas` (empty = all non-system) and
    /// `skip_patterns`.
    pub fn in_scope(&self, schema_name: &str, fqname: &str, bare_name: &str) -> bool {
        if !self.include_schemas.is_empty() && !self.include_schemas.contains(schema_name) {
            return false;
        }
        for pattern in &self.skip_patterns {
            let Ok(glob) = globset::Glob::new(pattern) else {
                continue;
            };
            let matcher = glob.compile_matcher();
            if matcher.is_match(fqname) || matcher.is_match(bare_name) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_include_schemas_means_all() {
        let src = Source::new("work", "postgresql://localhost/db");
        assert!(src.in_scope("public", "public.orders", "orders"));
    }

    #[test]
    fn include_schemas_restricts() {
        let mut src = Source::new("work", "postgresql://localhost/db");
        src.include_schemas.insert("sales".to_string());
        assert!(!src.in_scope("public", "public.orders", "orders"));
        assert!(src.in_scope("sales", "sales.orders", "orders"));
    }

    #[test]
    fn skip_patterns_match_fqname_or_bare() {
        let mut src = Source::new("work", "postgresql://localhost/db");
        src.skip_patterns.insert("pg_*".to_string());
        assert!(!src.in_scope("public", "public.pg_stat_foo", "pg_stat_foo"));
        assert!(src.in_scope("public", "public.orders", "orders"));
    }
}
