use serde::{Deserialize, Serialize};

use crate::{ConstraintKind, DependencyKind, ObjectId, ObjectKind};

/// The canonical record of one indexed entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbObject {
    pub object_id: ObjectId,
    pub source_name: String,
    pub kind: ObjectKind,
    pub schema_name: String,
    pub object_name: String,
    pub fqname: String,
    pub parent_object_id: Option<ObjectId>,
    pub signature: String,
    pub comment: Option<String>,
    pub definition: String,
}

/// A column belonging to a table or view (`parent_object_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub object_id: ObjectId,
    pub parent_object_id: ObjectId,
    pub ordinal: i32,
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
}

/// A constraint belonging to a table (`parent_object_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub object_id: ObjectId,
    pub parent_object_id: ObjectId,
    pub name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
    /// For `fk`, the referenced table's fqname and its target columns.
    pub references_table: Option<String>,
    pub references_columns: Vec<String>,
}

/// An index belonging to a table or view (`parent_object_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub object_id: ObjectId,
    pub parent_object_id: ObjectId,
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
}

/// A directed edge in the dependency multigraph, modeled as an edge list
/// keyed by `(from, to, kind)` rather than a pointer cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub from_object_id: ObjectId,
    pub to_object_id: ObjectId,
    pub kind: DependencyKind,
}
