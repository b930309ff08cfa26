//! Context Resolver: a pull-at-materialization operation. Computed once
//! per build; never a live override chain at query time.

use std::collections::HashMap;

use qpg_model::{ContextLevel, DbObject, ObjectId};

/// One context row as loaded from the `contexts` table, already reduced to
/// `(level_key, text)` where `level_key` is the row's canonical
/// `target` string (`ContextLevel::to_target()` shape:
/// `qpg://<source>[/<schema>[.<object>]]`) -- the same form contexts are
/// stored and parsed in everywhere else in the codebase.
pub struct ContextEntry {
    pub level_key: String,
    pub text: String,
}

/// Compute the effective context text for every object in `objects`, as
/// the deduplicated, ordered concatenation of: source context, schema
/// context, owning-table context (if a child), object-level context.
pub fn resolve(
    source_name: &str,
    objects: &[DbObject],
    contexts: &[ContextEntry],
) -> HashMap<ObjectId, String> {
    let mut by_level: HashMap<&str, &str> = HashMap::new();
    for c in contexts {
        by_level.insert(c.level_key.as_str(), c.text.as_str());
    }

    let by_id: HashMap<ObjectId, &DbObject> =
        objects.iter().map(|o| (o.object_id, o)).collect();

    let mut out = HashMap::new();
    for obj in objects {
        let mut chain: Vec<&str> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        let source_key = ContextLevel::Source {
            source_name: source_name.to_string(),
        }
        .to_target();
        if let Some(text) = by_level.get(source_key.as_str()) {
            push_unique(&mut chain, &mut seen, text);
        }

        let schema_key = ContextLevel::Schema {
            source_name: source_name.to_string(),
            schema_name: obj.schema_name.clone(),
        }
        .to_target();
        if let Some(text) = by_level.get(schema_key.as_str()) {
            push_unique(&mut chain, &mut seen, text);
        }

        if let Some(parent_id) = obj.parent_object_id {
            if let Some(parent) = by_id.get(&parent_id) {
                let parent_key = ContextLevel::Object {
                    source_name: source_name.to_string(),
                    fqname: parent.fqname.clone(),
                }
                .to_target();
                if let Some(text) = by_level.get(parent_key.as_str()) {
                    push_unique(&mut chain, &mut seen, text);
                }
            }
        }

        let object_key = ContextLevel::Object {
            source_name: source_name.to_string(),
            fqname: obj.fqname.clone(),
        }
        .to_target();
        if let Some(text) = by_level.get(object_key.as_str()) {
            push_unique(&mut chain, &mut seen, text);
        }

        out.insert(obj.object_id, chain.join("\n\n"));
    }
    out
}

fn push_unique<'a>(chain: &mut Vec<&'a str>, seen: &mut std::collections::HashSet<&'a str>, text: &'a str) {
    if seen.insert(text) {
        chain.push(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qpg_model::ObjectKind;

    fn obj(id_seed: &str, kind: ObjectKind, schema: &str, fqname: &str, parent: Option<ObjectId>) -> DbObject {
        DbObject {
            object_id: ObjectId::derive("work", kind, id_seed),
            source_name: "work".into(),
            kind,
            schema_name: schema.into(),
            object_name: fqname.rsplit('.').next().unwrap().into(),
            fqname: fqname.into(),
            parent_object_id: parent,
            signature: String::new(),
            comment: None,
            definition: String::new(),
        }
    }

    #[test]
    fn concatenates_chain_in_order_deduped() {
        let table = obj("public.orders", ObjectKind::Table, "public", "public.orders", None);
        let column = obj(
            "public.orders.id",
            ObjectKind::Column,
            "public",
            "public.orders.id",
            Some(table.object_id),
        );
        let objects = vec![table.clone(), column.clone()];
        let contexts = vec![
            ContextEntry {
                level_key: "qpg://work".into(),
                text: "source note".into(),
            },
            ContextEntry {
                level_key: "qpg://work/public".into(),
                text: "schema note".into(),
            },
            ContextEntry {
                level_key: "qpg://work/public.orders".into(),
                text: "table note".into(),
            },
        ];

        let resolved = resolve("work", &objects, &contexts);
        assert_eq!(
            resolved[&column.object_id],
            "source note\n\nschema note\n\ntable note"
        );
        // The column has no context of its own, but inherits its owning
        // table's, which is the same text as the table's own entry.
        assert_eq!(
            resolved[&table.object_id],
            "source note\n\nschema note\n\ntable note"
        );
    }

    #[test]
    fn missing_contexts_yield_empty_text() {
        let table = obj("public.nothing", ObjectKind::Table, "public", "public.nothing", None);
        let resolved = resolve("work", &[table.clone()], &[]);
        assert_eq!(resolved[&table.object_id], "");
    }
}
