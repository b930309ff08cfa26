//! Label Assembler: turns one canonical object, plus its children and
//! effective context, into the four lexical fields and the single
//! dense-embedding source text.

use qpg_model::{Column, Constraint, DbObject, Index, ObjectKind};

/// Maximum characters kept for the dense embedding source text. The
/// embedding model's token window is far smaller than this; the model
/// wrapper in `qpg-vector` truncates again at the tokenizer level, but
/// capping here keeps a single object's documentation from dominating.
const DENSE_TEXT_MAX_CHARS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexicalDoc {
    pub object_id: qpg_model::ObjectId,
    pub name_col: String,
    pub comment_col: String,
    pub defs_col: String,
    pub context_col: String,
}

impl LexicalDoc {
    /// The text actually hashed to detect whether re-embedding is needed.
    pub fn hashable_text(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            self.name_col, self.comment_col, self.defs_col, self.context_col
        )
    }

    /// The text handed to the embedding model: name, comment, definition
    /// and effective context concatenated and capped to the model's token
    /// window.
    pub fn dense_text(&self) -> String {
        let mut text = self.hashable_text();
        if text.len() > DENSE_TEXT_MAX_CHARS {
            text.truncate(DENSE_TEXT_MAX_CHARS);
        }
        text
    }
}

/// Synthesize a `defs_col` body for a table/view: its own signature
/// followed by one line per child column, constraint, and index.
pub fn assemble_defs(
    obj: &DbObject,
    columns: &[&Column],
    constraints: &[&Constraint],
    indexes: &[&Index],
) -> String {
    let mut lines = Vec::new();
    if !obj.signature.is_empty() {
        lines.push(obj.signature.clone());
    }
    for col in columns {
        let nullability = if col.nullable { "" } else { " not null" };
        lines.push(format!(
            "column: {} {}{}",
            col.name, col.data_type, nullability
        ));
    }
    for con in constraints {
        lines.push(format!(
            "constraint: {} ({}) {}",
            con.name,
            con.columns.join(", "),
            con.kind.as_str()
        ));
    }
    for idx in indexes {
        let unique = if idx.is_unique { "unique " } else { "" };
        lines.push(format!(
            "index: {}{} ({})",
            unique,
            idx.name,
            idx.columns.join(", ")
        ));
    }
    lines.join("\n")
}

/// Build the full [`LexicalDoc`] for one object. `defs` is the
/// pre-synthesized body from [`assemble_defs`] for tables/views/
/// functions, or `obj.definition` for everything else.
pub fn assemble(obj: &DbObject, defs: String, context_text: String) -> LexicalDoc {
    let name_col = format!("{} {}", obj.object_name, obj.fqname);
    LexicalDoc {
        object_id: obj.object_id,
        name_col,
        comment_col: obj.comment.clone().unwrap_or_default(),
        defs_col: defs,
        context_col: context_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qpg_model::{ConstraintKind, ObjectId};

    fn table() -> DbObject {
        DbObject {
            object_id: ObjectId::derive("work", ObjectKind::Table, "public.orders"),
            source_name: "work".into(),
            kind: ObjectKind::Table,
            schema_name: "public".into(),
            object_name: "orders".into(),
            fqname: "public.orders".into(),
            parent_object_id: None,
            signature: "orders(id integer, customer_id integer)".into(),
            comment: Some("customer purchase orders".into()),
            definition: String::new(),
        }
    }

    #[test]
    fn assembles_defs_with_child_lines() {
        let t = table();
        let col = Column {
            object_id: ObjectId::derive("work", ObjectKind::Column, "public.orders.id"),
            parent_object_id: t.object_id,
            ordinal: 1,
            name: "id".into(),
            data_type: "integer".into(),
            nullable: false,
            default: None,
            comment: None,
        };
        let con = Constraint {
            object_id: ObjectId::derive("work", ObjectKind::Constraint, "public.orders.orders_pkey"),
            parent_object_id: t.object_id,
            name: "orders_pkey".into(),
            kind: ConstraintKind::Pk,
            columns: vec!["id".into()],
            references_table: None,
            references_columns: vec![],
        };
        let defs = assemble_defs(&t, &[&col], &[&con], &[]);
        assert!(defs.contains("column: id integer not null"));
        assert!(defs.contains("constraint: orders_pkey (id)"));
    }

    #[test]
    fn dense_text_caps_length() {
        let t = table();
        let doc = assemble(&t, "x".repeat(5000), String::new());
        assert!(doc.dense_text().len() <= DENSE_TEXT_MAX_CHARS);
    }

    #[test]
    fn hashable_text_changes_with_context() {
        let t = table();
        let a = assemble(&t, "defs".into(), "ctx a".into());
        let b = assemble(&t, "defs".into(), "ctx b".into());
        assert_ne!(a.hashable_text(), b.hashable_text());
    }
}
