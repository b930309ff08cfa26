use serde::{Deserialize, Serialize};

/// Closed enumeration of object kinds this system indexes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Schema,
    Table,
    View,
    Column,
    Constraint,
    Index,
    Function,
    Extension,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Schema => "schema",
            ObjectKind::Table => "table",
            ObjectKind::View => "view",
            ObjectKind::Column => "column",
            ObjectKind::Constraint => "constraint",
            ObjectKind::Index => "index",
            ObjectKind::Function => "function",
            ObjectKind::Extension => "extension",
        }
    }

    /// Child kinds own a `parent_object_id` pointing at a table or view.
    pub fn is_child(&self) -> bool {
        matches!(
            self,
            ObjectKind::Column | ObjectKind::Constraint | ObjectKind::Index
        )
    }
}

impl std::str::FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "schema" => Ok(ObjectKind::Schema),
            "table" => Ok(ObjectKind::Table),
            "view" => Ok(ObjectKind::View),
            "column" => Ok(ObjectKind::Column),
            "constraint" => Ok(ObjectKind::Constraint),
            "index" => Ok(ObjectKind::Index),
            "function" => Ok(ObjectKind::Function),
            "extension" => Ok(ObjectKind::Extension),
            other => Err(format!("unrecognized object kind: {other}")),
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge label for `dependencies.kind`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Fk,
    ViewRef,
    FunctionUses,
    IndexOn,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Fk => "fk",
            DependencyKind::ViewRef => "view_ref",
            DependencyKind::FunctionUses => "function_uses",
            DependencyKind::IndexOn => "index_on",
        }
    }
}

impl std::str::FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fk" => Ok(DependencyKind::Fk),
            "view_ref" => Ok(DependencyKind::ViewRef),
            "function_uses" => Ok(DependencyKind::FunctionUses),
            "index_on" => Ok(DependencyKind::IndexOn),
            other => Err(format!("unrecognized dependency kind: {other}")),
        }
    }
}

/// `constraints.kind`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Pk,
    Fk,
    Unique,
    Check,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Pk => "pk",
            ConstraintKind::Fk => "fk",
            ConstraintKind::Unique => "unique",
            ConstraintKind::Check => "check",
        }
    }
}

impl std::str::FromStr for ConstraintKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pk" => Ok(ConstraintKind::Pk),
            "fk" => Ok(ConstraintKind::Fk),
            "unique" => Ok(ConstraintKind::Unique),
            "check" => Ok(ConstraintKind::Check),
            other => Err(format!("unrecognized constraint kind: {other}")),
        }
    }
}
