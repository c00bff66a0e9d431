use super::Entity;
use crate::ident::{matview_id, view_id, StableId};

/// A plain view (`pg_class.relkind = 'v'`). `definition` is composed at
/// extraction time as a full `CREATE VIEW "schema"."name" AS <body>`
/// statement, where `<body>` is `pg_get_viewdef()`'s output — the
/// dispatcher itself never calls `pg_get_viewdef`, it only substitutes
/// `CREATE` for `CREATE OR REPLACE` on the stored text.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct View {
    pub schema: String,
    pub name: String,
    pub definition: String,

    /// Internal: relation OID.
    pub oid: u32,
}

impl Entity for View {
    fn stable_id(&self) -> StableId {
        view_id(&self.schema, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.name == other.name && self.definition == other.definition
    }
}

/// A materialized view (`pg_class.relkind = 'm'`). Unlike [`View`] it has
/// no `CREATE OR REPLACE` form in PostgreSQL, so a replacement is always
/// `DROP` + `CREATE ... WITH NO DATA`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaterializedView {
    pub schema: String,
    pub name: String,
    pub definition: String,

    /// Internal: relation OID.
    pub oid: u32,
}

impl Entity for MaterializedView {
    fn stable_id(&self) -> StableId {
        matview_id(&self.schema, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.name == other.name && self.definition == other.definition
    }
}
