use super::Entity;
use crate::ident::{function_id, StableId};

/// A function (`pg_proc`, `prokind = 'f'` only — procedures and
/// aggregates are out of scope). `definition` is the complete
/// `pg_get_functiondef()` output, a full `CREATE OR REPLACE FUNCTION ...`
/// statement.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Function {
    pub schema: String,
    pub name: String,
    /// Argument types as rendered by `pg_get_function_identity_arguments`,
    /// e.g. `"integer,integer"`. Part of the stable id so overloads are
    /// distinct entities.
    pub arg_types: String,

    pub definition: String,

    /// Internal: function OID.
    pub oid: u32,
}

impl Entity for Function {
    fn stable_id(&self) -> StableId {
        function_id(&self.schema, &self.name, &self.arg_types)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.name == other.name
            && self.arg_types == other.arg_types
            && self.definition == other.definition
    }
}
