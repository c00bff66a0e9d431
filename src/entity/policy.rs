use super::{Entity, PolicyCommand};
use crate::ident::{policy_id, table_id, StableId};

/// A row-level-security policy (`pg_policy`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Policy {
    pub schema: String,
    pub table: String,
    pub name: String,

    pub command: PolicyCommand,
    pub permissive: bool,
    pub roles: Vec<String>,
    pub using_expr: Option<String>,
    pub with_check_expr: Option<String>,

    /// Internal: policy OID.
    pub oid: u32,
}

impl Policy {
    pub fn table_stable_id(&self) -> StableId {
        table_id(&self.schema, &self.table)
    }

    /// True when every field except `name` is identical — the condition
    /// under which the differ prefers `RenamePolicyTo`.
    pub fn differs_only_by_name(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.table == other.table
            && self.name != other.name
            && self.command == other.command
            && self.permissive == other.permissive
            && self.roles == other.roles
            && self.using_expr == other.using_expr
            && self.with_check_expr == other.with_check_expr
    }
}

impl Entity for Policy {
    fn stable_id(&self) -> StableId {
        policy_id(&self.schema, &self.table, &self.name)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.table == other.table
            && self.name == other.name
            && self.command == other.command
            && self.permissive == other.permissive
            && self.roles == other.roles
            && self.using_expr == other.using_expr
            && self.with_check_expr == other.with_check_expr
    }
}
