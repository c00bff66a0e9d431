use super::Entity;
use crate::ident::{schema_id, StableId};

/// A PostgreSQL namespace (`pg_namespace`). `public` is implicit: the
/// differ never emits `CreateSchema`/`DropSchema` for it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    pub name: String,
    /// Internal: namespace OID, used only to resolve `pg_depend` rows
    /// during extraction.
    pub oid: u32,
}

impl Schema {
    pub fn is_public(&self) -> bool {
        self.name == "public"
    }
}

impl Entity for Schema {
    fn stable_id(&self) -> StableId {
        schema_id(&self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
