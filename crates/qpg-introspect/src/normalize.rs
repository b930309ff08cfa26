//! Canonicalization rules shared by every introspected kind: lowercased
//! type names, no extra whitespace, columns in declared order.

/// Build the canonical `fqname` for a schema-scoped object, or the bare
/// name for schema/extension objects.
pub fn fqname(schema_name: &str, object_name: &str) -> String {
    format!("{schema_name}.{object_name}")
}

fn canonical_type(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `signature` for a table or view: the column list in declared order,
/// `name type[, ...]`.
pub fn table_signature(columns: &[(String, String)]) -> String {
    columns
        .iter()
        .map(|(name, ty)| format!("{} {}", name.trim(), canonical_type(ty)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `signature` for a function: its argument list in declared order.
pub fn function_signature(arg_types: &[String]) -> String {
    arg_types
        .iter()
        .map(|ty| canonical_type(ty))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `signature` for an index or constraint: its key/column list.
pub fn key_signature(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| c.trim().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqname_joins_schema_and_object() {
        assert_eq!(fqname("public", "orders"), "public.orders");
    }

    #[test]
    fn table_signature_lowercases_and_trims() {
        let cols = vec![
            ("id".to_string(), " INTEGER ".to_string()),
            ("name".to_string(), "Text".to_string()),
        ];
        assert_eq!(table_signature(&cols), "id integer, name text");
    }

    #[test]
    fn key_signature_preserves_declared_order() {
        assert_eq!(
            key_signature(&["b".to_string(), "a".to_string()]),
            "b, a"
        );
    }
}
