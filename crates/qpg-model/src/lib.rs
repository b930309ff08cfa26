//! Canonical object model shared across the indexing and retrieval crates:
//! `Source`, `DbObject` and its children, the context-inheritance types,
//! the `ObjectId` content address, and the top-level error taxonomy.

mod context;
mod error;
mod kind;
mod object;
mod object_id;
mod source;

pub use context::{Context, ContextLevel, EffectiveContext};
pub use error::{Error, Result};
pub use kind::{ConstraintKind, DependencyKind, ObjectKind};
pub use object::{Column, Constraint, DbObject, Dependency, Index};
pub use object_id::ObjectId;
pub use source::Source;
