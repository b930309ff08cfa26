use serde::{Deserialize, Serialize};

use crate::ObjectId;

/// Parsed shape of a `Context.target` URI: `qpg://<source>[/<schema>[.<object>]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextLevel {
    Source { source_name: String },
    Schema { source_name: String, schema_name: String },
    Object { source_name: String, fqname: String },
}

impl ContextLevel {
    /// Parse a `qpg://` target URI into its level. Returns `None` if the
    /// URI does not parse into one of the three valid shapes.
    pub fn parse(target: &str) -> Option<Self> {
        let rest = target.strip_prefix("qpg://")?;
        if rest.is_empty() {
            return None;
        }
        let mut parts = rest.splitn(2, '/');
        let source_name = parts.next()?.to_string();
        if source_name.is_empty() {
            return None;
        }
        match parts.next() {
            None => Some(ContextLevel::Source { source_name }),
            Some(tail) if tail.is_empty() => None,
            Some(tail) if tail.contains('.') => Some(ContextLevel::Object {
                source_name,
                fqname: tail.to_string(),
            }),
            Some(tail) => Some(ContextLevel::Schema {
                source_name,
                schema_name: tail.to_string(),
            }),
        }
    }

    pub fn to_target(&self) -> String {
        match self {
            ContextLevel::Source { source_name } => format!("qpg://{source_name}"),
            ContextLevel::Schema {
                source_name,
                schema_name,
            } => format!("qpg://{source_name}/{schema_name}"),
            ContextLevel::Object {
                source_name,
                fqname,
            } => format!("qpg://{source_name}/{fqname}"),
        }
    }
}

/// Operator-authored semantic note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub id: i64,
    pub target: String,
    pub text: String,
}

/// Per-object materialized inherited context, computed once per index
/// build rather than resolved live at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveContext {
    pub object_id: ObjectId,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_levels() {
        assert_eq!(
            ContextLevel::parse("qpg://work"),
            Some(ContextLevel::Source {
                source_name: "work".into()
            })
        );
        assert_eq!(
            ContextLevel::parse("qpg://work/public"),
            Some(ContextLevel::Schema {
                source_name: "work".into(),
                schema_name: "public".into(),
            })
        );
        assert_eq!(
            ContextLevel::parse("qpg://work/public.orders"),
            Some(ContextLevel::Object {
                source_name: "work".into(),
                fqname: "public.orders".into(),
            })
        );
    }

    #[test]
    fn rejects_malformed_targets() {
        assert_eq!(ContextLevel::parse("qpg://"), None);
        assert_eq!(ContextLevel::parse("qpg://work/"), None);
        assert_eq!(ContextLevel::parse("http://work"), None);
    }
}
