use super::{Entity, GeneratedKind};
use crate::ident::{column_id, matview_id, table_id, view_id, StableId};

/// The kind of relation a column belongs to. Internal-only: it exists so
/// a column can report its owner's stable id without re-reading the
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OwnerKind {
    Table,
    View,
    MaterializedView,
}

/// An attribute of a table (`pg_attribute`, `attnum > 0`, not dropped).
/// Only table columns are diffed; columns of views/matviews are not
/// extracted as independent entities since a view's column list is
/// implied by its stored `pg_get_viewdef` fragment.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Column {
    pub owner_schema: String,
    pub owner_table: String,
    pub name: String,

    pub position: i16,
    pub not_null: bool,
    pub formatted_type: String,
    pub default_value: Option<String>,
    pub generated: GeneratedKind,
    pub generated_expression: Option<String>,

    /// Internal: used only to join `pg_attrdef` rows during extraction.
    pub owner_oid: u32,
    pub owner_kind: OwnerKind,
}

impl Column {
    pub fn is_generated(&self) -> bool {
        matches!(self.generated, GeneratedKind::Stored)
    }

    pub fn owner_stable_id(&self) -> StableId {
        match self.owner_kind {
            OwnerKind::Table => table_id(&self.owner_schema, &self.owner_table),
            OwnerKind::View => view_id(&self.owner_schema, &self.owner_table),
            OwnerKind::MaterializedView => matview_id(&self.owner_schema, &self.owner_table),
        }
    }
}

impl Entity for Column {
    fn stable_id(&self) -> StableId {
        column_id(&self.owner_schema, &self.owner_table, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.owner_schema == other.owner_schema
            && self.owner_table == other.owner_table
            && self.name == other.name
            && self.position == other.position
            && self.not_null == other.not_null
            && self.formatted_type == other.formatted_type
            && self.default_value == other.default_value
            && self.generated == other.generated
            && self.generated_expression == other.generated_expression
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col() -> Column {
        Column {
            owner_schema: "public".into(),
            owner_table: "users".into(),
            name: "email".into(),
            position: 2,
            not_null: true,
            formatted_type: "text".into(),
            default_value: None,
            generated: GeneratedKind::NotGenerated,
            generated_expression: None,
            owner_oid: 1,
            owner_kind: OwnerKind::Table,
        }
    }

    #[test]
    fn stable_id_format() {
        assert_eq!(col().stable_id().as_str(), "public.users.email");
    }

    #[test]
    fn owner_oid_ignored_by_semantic_eq() {
        let a = col();
        let b = Column { owner_oid: 42, ..a.clone() };
        assert!(a.semantically_eq(&b));
    }

    #[test]
    fn type_change_is_semantic() {
        let a = col();
        let b = Column { formatted_type: "varchar".into(), ..a.clone() };
        assert!(!a.semantically_eq(&b));
    }
}
