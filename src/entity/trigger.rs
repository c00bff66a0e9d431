use super::Entity;
use crate::ident::{table_id, trigger_id, StableId};

/// A trigger (`pg_trigger`, internal/constraint-backed triggers excluded).
/// `definition` is the complete `pg_get_triggerdef()` output.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Trigger {
    pub schema: String,
    pub table: String,
    pub name: String,

    pub definition: String,

    /// Internal: trigger OID, owning table OID, called function OID.
    pub oid: u32,
    pub table_oid: u32,
    pub function_oid: u32,
}

impl Trigger {
    pub fn table_stable_id(&self) -> StableId {
        table_id(&self.schema, &self.table)
    }
}

impl Entity for Trigger {
    fn stable_id(&self) -> StableId {
        trigger_id(&self.schema, &self.table, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.table == other.table
            && self.name == other.name
            && self.definition == other.definition
    }
}
