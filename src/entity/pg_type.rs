use super::Entity;
use crate::ident::{type_id, StableId};

/// A single attribute of a composite type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompositeAttribute {
    pub name: String,
    pub formatted_type: String,
    pub position: i16,
    pub not_null: bool,
}

/// The `typtype`-specific payload of a user-defined type.
///
/// `Base` types (`typtype = 'b'`) and multirange types (`typtype = 'm'`)
/// are deliberately not extracted: a base type's definition lives in C
/// I/O functions the catalog can only name by OID, not reproduce as DDL,
/// and a multirange type is always auto-created alongside its range type
/// (there is nothing independent to diff). This mirrors the original
/// source's own `typtype IN ('e', 'd', 'c', 'r')` extraction filter.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TypeKind {
    Enum { values: Vec<String> },
    Domain { base_type: String, constraints: Vec<String> },
    Composite { attributes: Vec<CompositeAttribute> },
    Range { subtype: String },
}

/// A user-defined type (`pg_type`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Type {
    pub schema: String,
    pub name: String,
    pub kind: TypeKind,

    /// Internal: type OID.
    pub oid: u32,
}

impl Entity for Type {
    fn stable_id(&self) -> StableId {
        type_id(&self.schema, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.name == other.name && self.kind == other.kind
    }
}
