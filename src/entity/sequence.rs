use super::Entity;
use crate::ident::{sequence_id, table_id, StableId};

/// A sequence (`pg_sequence` joined with `pg_class`), including `SERIAL`-
/// backed sequences. Ownership (`OWNED BY`) is resolved from `pg_depend`
/// at extraction time, per the original's `pg_sequence.py`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sequence {
    pub schema: String,
    pub name: String,

    pub data_type: String,
    pub increment_by: i64,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub start_value: i64,
    pub cache_size: i64,
    pub cycle: bool,

    /// `OWNED BY "<owned_by_table>"."<owned_by_column>"`, if any.
    pub owned_by_table: Option<String>,
    pub owned_by_column: Option<String>,

    /// Internal: sequence relation OID.
    pub oid: u32,
}

impl Sequence {
    pub fn owner_table_stable_id(&self) -> Option<StableId> {
        match (&self.owned_by_table, &self.owned_by_column) {
            (Some(table), Some(_column)) => Some(table_id(&self.schema, table)),
            _ => None,
        }
    }
}

impl Entity for Sequence {
    fn stable_id(&self) -> StableId {
        sequence_id(&self.schema, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.name == other.name
            && self.data_type == other.data_type
            && self.increment_by == other.increment_by
            && self.min_value == other.min_value
            && self.max_value == other.max_value
            && self.start_value == other.start_value
            && self.cache_size == other.cache_size
            && self.cycle == other.cycle
            && self.owned_by_table == other.owned_by_table
            && self.owned_by_column == other.owned_by_column
    }
}
