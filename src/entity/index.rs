use super::Entity;
use crate::ident::{index_id, table_id, StableId};

/// An index (`pg_index` joined with `pg_class`). `definition` is the full,
/// pre-rendered `pg_get_indexdef()` output — a complete `CREATE [UNIQUE]
/// INDEX ... ON "schema"."table" ...` statement.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Index {
    pub schema: String,
    pub name: String,
    pub table: String,

    pub is_unique: bool,
    pub is_primary: bool,
    /// True when a `pg_constraint` row references this index's OID via
    /// `conindid` — such indexes are skipped by index diffing, since their
    /// lifecycle is driven by the owning constraint instead.
    pub is_constraint_backed: bool,
    pub definition: String,

    /// Internal: index OID, owning table OID.
    pub oid: u32,
    pub table_oid: u32,
}

impl Index {
    pub fn table_stable_id(&self) -> StableId {
        table_id(&self.schema, &self.table)
    }
}

impl Entity for Index {
    fn stable_id(&self) -> StableId {
        index_id(&self.schema, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.name == other.name
            && self.table == other.table
            && self.is_unique == other.is_unique
            && self.is_primary == other.is_primary
            && self.is_constraint_backed == other.is_constraint_backed
            && self.definition == other.definition
    }
}
