//! The change set: one tagged value per DDL transformation the differ can
//! produce. Each variant embeds enough entity data to be emitted without
//! consulting either snapshot again.

use crate::entity::column::Column;
use crate::entity::constraint::Constraint;
use crate::entity::function::Function;
use crate::entity::index::Index;
use crate::entity::pg_type::Type;
use crate::entity::policy::Policy;
use crate::entity::sequence::Sequence;
use crate::entity::trigger::Trigger;
use crate::entity::view::{MaterializedView, View};
use crate::ident::{
    column_id, constraint_id, function_id, index_id, matview_id, policy_id, schema_id,
    sequence_id, table_id, trigger_id, type_id, view_id, StableId,
};

/// Operation-kind priority used by the resolver for same-object ordering
/// (`DROP(0) < CREATE(1) < ALTER(2) < REPLACE(3)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpKind {
    Drop,
    Create,
    Alter,
    Replace,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlterSequenceDelta {
    pub old: Sequence,
    pub new: Sequence,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlterConstraintDelta {
    pub old: Constraint,
    pub new: Constraint,
}

/// Roles/USING/WITH CHECK edits to an existing policy. `None` means
/// unchanged; `Some(String::new())` on the expression fields means an
/// explicit request to remove that clause (the emitter must honor the
/// distinction, not collapse it to "unchanged").
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlterPolicyDelta {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub new_roles: Option<Vec<String>>,
    pub new_using: Option<String>,
    pub new_with_check: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Change {
    CreateSchema { name: String },
    DropSchema { name: String },

    CreateTable { schema: String, name: String, columns: Vec<Column> },
    DropTable { schema: String, name: String },

    AddColumn { schema: String, table: String, column: Column },
    DropColumn { schema: String, table: String, column_name: String },
    AlterColumnType { schema: String, table: String, column_name: String, new_type: String },
    AlterColumnSetDefault { schema: String, table: String, column_name: String, default_expression: String },
    AlterColumnDropDefault { schema: String, table: String, column_name: String },
    AlterColumnSetNotNull { schema: String, table: String, column_name: String },
    AlterColumnDropNotNull { schema: String, table: String, column_name: String },
    EnableRowLevelSecurity { schema: String, table: String },
    DisableRowLevelSecurity { schema: String, table: String },

    CreateView { view: View },
    DropView { schema: String, name: String },
    ReplaceView { view: View },

    CreateMaterializedView { view: MaterializedView },
    DropMaterializedView { schema: String, name: String },
    ReplaceMaterializedView { view: MaterializedView },

    CreateSequence { sequence: Sequence },
    DropSequence { schema: String, name: String },
    AlterSequence(AlterSequenceDelta),

    CreateIndex { index: Index },
    DropIndex { schema: String, name: String },
    /// Reachable only if the differ ever decides two indexes differ by
    /// name alone; the emitter always rejects it (open question #2 — see
    /// DESIGN.md).
    AlterIndex { schema: String, old_name: String, new_name: String },

    CreateConstraint { constraint: Constraint },
    DropConstraint { schema: String, table: String, name: String },
    /// Foreign keys only — PostgreSQL's `ALTER CONSTRAINT` is restricted
    /// to deferrability settings.
    AlterConstraint(AlterConstraintDelta),

    CreateFunction { function: Function },
    DropFunction { schema: String, name: String, arg_types: String },
    ReplaceFunction { function: Function },

    CreateTrigger { trigger: Trigger },
    DropTrigger { schema: String, table: String, name: String },

    CreateType { ty: Type },
    DropType { schema: String, name: String },

    CreatePolicy { policy: Policy },
    DropPolicy { schema: String, table: String, name: String },
    RenamePolicyTo { schema: String, table: String, old_name: String, new_name: String },
    AlterPolicy(AlterPolicyDelta),
}

impl Change {
    /// The stable id of the object this change targets. For column- and
    /// policy-level changes this is the column/policy id, not the owning
    /// table — the resolver needs the finer-grained id to place e.g. an
    /// `AddColumn` after the `CreateTable` it depends on.
    pub fn target_id(&self) -> StableId {
        match self {
            Change::CreateSchema { name } | Change::DropSchema { name } => schema_id(name),

            Change::CreateTable { schema, name, .. } | Change::DropTable { schema, name } => {
                table_id(schema, name)
            }

            Change::AddColumn { schema, table, column } => {
                column_id(schema, table, &column.name)
            }
            Change::DropColumn { schema, table, column_name }
            | Change::AlterColumnType { schema, table, column_name, .. }
            | Change::AlterColumnSetDefault { schema, table, column_name, .. }
            | Change::AlterColumnDropDefault { schema, table, column_name }
            | Change::AlterColumnSetNotNull { schema, table, column_name }
            | Change::AlterColumnDropNotNull { schema, table, column_name } => {
                column_id(schema, table, column_name)
            }
            Change::EnableRowLevelSecurity { schema, table }
            | Change::DisableRowLevelSecurity { schema, table } => table_id(schema, table),

            Change::CreateView { view } | Change::ReplaceView { view } => {
                view_id(&view.schema, &view.name)
            }
            Change::DropView { schema, name } => view_id(schema, name),

            Change::CreateMaterializedView { view } | Change::ReplaceMaterializedView { view } => {
                matview_id(&view.schema, &view.name)
            }
            Change::DropMaterializedView { schema, name } => matview_id(schema, name),

            Change::CreateSequence { sequence } => sequence_id(&sequence.schema, &sequence.name),
            Change::DropSequence { schema, name } => sequence_id(schema, name),
            Change::AlterSequence(d) => sequence_id(&d.new.schema, &d.new.name),

            Change::CreateIndex { index } => index_id(&index.schema, &index.name),
            Change::DropIndex { schema, name } => index_id(schema, name),
            Change::AlterIndex { schema, old_name, .. } => index_id(schema, old_name),

            Change::CreateConstraint { constraint } => {
                constraint_id(&constraint.schema, &constraint.table, &constraint.name)
            }
            Change::DropConstraint { schema, table, name } => constraint_id(schema, table, name),
            Change::AlterConstraint(d) => {
                constraint_id(&d.new.schema, &d.new.table, &d.new.name)
            }

            Change::CreateFunction { function } | Change::ReplaceFunction { function } => {
                function_id(&function.schema, &function.name, &function.arg_types)
            }
            Change::DropFunction { schema, name, arg_types } => {
                function_id(schema, name, arg_types)
            }

            Change::CreateTrigger { trigger } => {
                trigger_id(&trigger.schema, &trigger.table, &trigger.name)
            }
            Change::DropTrigger { schema, table, name } => trigger_id(schema, table, name),

            Change::CreateType { ty } => type_id(&ty.schema, &ty.name),
            Change::DropType { schema, name } => type_id(schema, name),

            Change::CreatePolicy { policy } => {
                policy_id(&policy.schema, &policy.table, &policy.name)
            }
            Change::DropPolicy { schema, table, name } => policy_id(schema, table, name),
            Change::RenamePolicyTo { schema, table, old_name, .. } => {
                policy_id(schema, table, old_name)
            }
            Change::AlterPolicy(d) => policy_id(&d.schema, &d.table, &d.name),
        }
    }

    /// Operation-kind priority used for same-object ordering constraints
    /// (resolver stage 2).
    pub fn op_kind(&self) -> OpKind {
        match self {
            Change::DropSchema { .. }
            | Change::DropTable { .. }
            | Change::DropColumn { .. }
            | Change::DropView { .. }
            | Change::DropMaterializedView { .. }
            | Change::DropSequence { .. }
            | Change::DropIndex { .. }
            | Change::DropConstraint { .. }
            | Change::DropFunction { .. }
            | Change::DropTrigger { .. }
            | Change::DropType { .. }
            | Change::DropPolicy { .. } => OpKind::Drop,

            Change::CreateSchema { .. }
            | Change::CreateTable { .. }
            | Change::AddColumn { .. }
            | Change::CreateView { .. }
            | Change::CreateMaterializedView { .. }
            | Change::CreateSequence { .. }
            | Change::CreateIndex { .. }
            | Change::CreateConstraint { .. }
            | Change::CreateFunction { .. }
            | Change::CreateTrigger { .. }
            | Change::CreateType { .. }
            | Change::CreatePolicy { .. } => OpKind::Create,

            Change::ReplaceView { .. }
            | Change::ReplaceMaterializedView { .. }
            | Change::ReplaceFunction { .. } => OpKind::Replace,

            Change::AlterColumnType { .. }
            | Change::AlterColumnSetDefault { .. }
            | Change::AlterColumnDropDefault { .. }
            | Change::AlterColumnSetNotNull { .. }
            | Change::AlterColumnDropNotNull { .. }
            | Change::EnableRowLevelSecurity { .. }
            | Change::DisableRowLevelSecurity { .. }
            | Change::AlterSequence(_)
            | Change::AlterIndex { .. }
            | Change::AlterConstraint(_)
            | Change::RenamePolicyTo { .. }
            | Change::AlterPolicy(_) => OpKind::Alter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_id_of_add_column_is_the_column_not_the_table() {
        let change = Change::AddColumn {
            schema: "public".into(),
            table: "users".into(),
            column: Column {
                owner_schema: "public".into(),
                owner_table: "users".into(),
                name: "email".into(),
                position: 1,
                not_null: false,
                formatted_type: "text".into(),
                default_value: None,
                generated: crate::entity::GeneratedKind::NotGenerated,
                generated_expression: None,
                owner_oid: 1,
                owner_kind: crate::entity::column::OwnerKind::Table,
            },
        };
        assert_eq!(change.target_id().as_str(), "public.users.email");
    }

    #[test]
    fn op_kind_priority_orders_drop_before_create_before_alter_before_replace() {
        assert!(OpKind::Drop < OpKind::Create);
        assert!(OpKind::Create < OpKind::Alter);
        assert!(OpKind::Alter < OpKind::Replace);
    }
}
