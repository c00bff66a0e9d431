use super::Entity;
use crate::ident::{table_id, StableId};

/// A PostgreSQL relation of kind `r` (ordinary table), from `pg_class`.
/// Views and materialized views are modeled separately (`entity::view`)
/// even though the original source unifies all three under one
/// `relkind`-discriminated `PgClass` — splitting them lets the Rust type
/// system enforce that a table's RLS flag only ever appears where it is
/// meaningful.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Table {
    pub schema: String,
    pub name: String,
    /// `pg_class.relrowsecurity`.
    pub row_level_security: bool,
    /// Internal: class OID, used only to resolve `pg_depend` rows.
    pub oid: u32,
}

impl Entity for Table {
    fn stable_id(&self) -> StableId {
        table_id(&self.schema, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.name == other.name
            && self.row_level_security == other.row_level_security
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_relkind_tagged() {
        let t = Table {
            schema: "public".into(),
            name: "users".into(),
            row_level_security: false,
            oid: 1,
        };
        assert_eq!(t.stable_id().as_str(), "r:public.users");
    }

    #[test]
    fn oid_does_not_affect_semantic_equality() {
        let a = Table {
            schema: "public".into(),
            name: "users".into(),
            row_level_security: true,
            oid: 1,
        };
        let b = Table { oid: 999, ..a.clone() };
        assert!(a.semantically_eq(&b));
    }

    #[test]
    fn rls_difference_is_semantic() {
        let a = Table {
            schema: "public".into(),
            name: "users".into(),
            row_level_security: false,
            oid: 1,
        };
        let b = Table { row_level_security: true, ..a.clone() };
        assert!(!a.semantically_eq(&b));
    }
}
