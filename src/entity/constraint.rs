use super::{Entity, FkAction, FkMatchType};
use crate::ident::{constraint_id, StableId};

/// `pg_constraint.contype`, restricted to the forms the original source
/// (and this crate) actually diffs: `t` (constraint trigger) and `x`
/// (exclusion) are read by the original but never produce DDL changes of
/// their own kind, so they are out of scope here (an exclusion
/// constraint's backing index is still diffed as an Index entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
}

impl ConstraintKind {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'p' => Self::PrimaryKey,
            'f' => Self::ForeignKey,
            'u' => Self::Unique,
            'c' => Self::Check,
            _ => return None,
        })
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::PrimaryKey => "PRIMARY KEY",
            Self::ForeignKey => "FOREIGN KEY",
            Self::Unique => "UNIQUE",
            Self::Check => "CHECK",
        }
    }
}

/// Foreign-key-only details. `None` on every non-FK constraint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForeignKeyDetail {
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub on_update: FkAction,
    pub on_delete: FkAction,
    pub match_type: FkMatchType,
}

/// A table constraint (`pg_constraint`, `conrelid` rows only — domain
/// constraints are handled as part of the owning `Type` entity).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Constraint {
    pub schema: String,
    pub table: String,
    pub name: String,

    pub kind: ConstraintKind,
    /// Constrained column names, in `conkey` order. Empty for a CHECK
    /// constraint with no explicit column list.
    pub columns: Vec<String>,
    /// Set only for `Check`: the expression inside `CHECK (...)`.
    pub check_expression: Option<String>,
    /// Set only for `ForeignKey`.
    pub foreign_key: Option<ForeignKeyDetail>,

    pub deferrable: bool,
    pub initially_deferred: bool,

    /// Internal: constraint OID, table OID, used for `pg_depend` joins.
    pub oid: u32,
    pub table_oid: u32,
}

impl Entity for Constraint {
    fn stable_id(&self) -> StableId {
        constraint_id(&self.schema, &self.table, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.table == other.table
            && self.name == other.name
            && self.kind == other.kind
            && self.columns == other.columns
            && self.check_expression == other.check_expression
            && self.foreign_key == other.foreign_key
            && self.deferrable == other.deferrable
            && self.initially_deferred == other.initially_deferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_kind_codes() {
        assert_eq!(ConstraintKind::from_code('p'), Some(ConstraintKind::PrimaryKey));
        assert_eq!(ConstraintKind::from_code('f'), Some(ConstraintKind::ForeignKey));
        assert_eq!(ConstraintKind::from_code('u'), Some(ConstraintKind::Unique));
        assert_eq!(ConstraintKind::from_code('c'), Some(ConstraintKind::Check));
        assert_eq!(ConstraintKind::from_code('x'), None);
    }

    #[test]
    fn stable_id_includes_table() {
        let c = Constraint {
            schema: "public".into(),
            table: "users".into(),
            name: "users_pkey".into(),
            kind: ConstraintKind::PrimaryKey,
            columns: vec!["id".into()],
            check_expression: None,
            foreign_key: None,
            deferrable: false,
            initially_deferred: false,
            oid: 1,
            table_oid: 2,
        };
        assert_eq!(c.stable_id().as_str(), "public.users.users_pkey");
    }
}
