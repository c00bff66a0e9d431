//! Structural diff: per-kind three-way set comparison between two
//! snapshots, producing an unordered change set.

mod policy;
mod table;

use std::collections::HashMap;

use crate::change::{AlterConstraintDelta, AlterSequenceDelta, Change};
use crate::entity::constraint::Constraint;
use crate::entity::Entity;
use crate::ident::StableId;
use crate::snapshot::Snapshot;

/// Split two same-kind maps into entities only in `master`, only in
/// `branch`, and present in both but semantically unequal.
fn set_diff<'a, E: Entity>(
    master: &'a HashMap<StableId, E>,
    branch: &'a HashMap<StableId, E>,
) -> (Vec<&'a E>, Vec<&'a E>, Vec<(&'a E, &'a E)>) {
    let mut only_master = Vec::new();
    let mut only_branch = Vec::new();
    let mut differing = Vec::new();

    for (id, m) in master {
        match branch.get(id) {
            None => only_master.push(m),
            Some(b) => {
                if !m.semantically_eq(b) {
                    differing.push((m, b));
                }
            }
        }
    }
    for (id, b) in branch {
        if !master.contains_key(id) {
            only_branch.push(b);
        }
    }
    (only_master, only_branch, differing)
}

/// End-to-end structural diff. The returned change set is unordered; the
/// resolver (`crate::resolve`) is responsible for sequencing it.
pub fn diff(master: &Snapshot, branch: &Snapshot) -> Vec<Change> {
    let mut changes = Vec::new();

    diff_schemas(master, branch, &mut changes);
    diff_tables(master, branch, &mut changes);
    diff_views(master, branch, &mut changes);
    diff_materialized_views(master, branch, &mut changes);
    diff_sequences(master, branch, &mut changes);
    diff_indexes(master, branch, &mut changes);
    diff_constraints(master, branch, &mut changes);
    diff_functions(master, branch, &mut changes);
    diff_triggers(master, branch, &mut changes);
    diff_types(master, branch, &mut changes);
    changes.extend(policy::diff_policies(&master.policies, &branch.policies));

    tracing::debug!(change_count = changes.len(), "differ.complete");
    changes
}

fn diff_schemas(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, _) = set_diff(&master.schemas, &branch.schemas);
    for s in only_master {
        if !s.is_public() {
            changes.push(Change::DropSchema { name: s.name.clone() });
        }
    }
    for s in only_branch {
        if !s.is_public() {
            changes.push(Change::CreateSchema { name: s.name.clone() });
        }
    }
}

fn diff_tables(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, differing) = set_diff(&master.tables, &branch.tables);

    for t in only_master {
        changes.push(Change::DropTable { schema: t.schema.clone(), name: t.name.clone() });
    }
    for t in only_branch {
        let columns = branch.columns_of(&t.stable_id()).into_iter().cloned().collect();
        changes.push(Change::CreateTable { schema: t.schema.clone(), name: t.name.clone(), columns });
        if t.row_level_security {
            changes.push(Change::EnableRowLevelSecurity { schema: t.schema.clone(), table: t.name.clone() });
        }
    }
    for (m, b) in differing {
        let master_cols = master.columns_of(&m.stable_id());
        let branch_cols = branch.columns_of(&b.stable_id());
        changes.extend(table::diff_columns(&m.schema, &m.name, &master_cols, &branch_cols));

        if m.row_level_security != b.row_level_security {
            if b.row_level_security {
                changes.push(Change::EnableRowLevelSecurity { schema: b.schema.clone(), table: b.name.clone() });
            } else {
                changes.push(Change::DisableRowLevelSecurity { schema: b.schema.clone(), table: b.name.clone() });
            }
        }
    }
}

fn diff_views(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, differing) = set_diff(&master.views, &branch.views);
    for v in only_master {
        changes.push(Change::DropView { schema: v.schema.clone(), name: v.name.clone() });
    }
    for v in only_branch {
        changes.push(Change::CreateView { view: v.clone() });
    }
    for (_, b) in differing {
        changes.push(Change::ReplaceView { view: b.clone() });
    }
}

fn diff_materialized_views(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, differing) = set_diff(&master.materialized_views, &branch.materialized_views);
    for v in only_master {
        changes.push(Change::DropMaterializedView { schema: v.schema.clone(), name: v.name.clone() });
    }
    for v in only_branch {
        changes.push(Change::CreateMaterializedView { view: v.clone() });
    }
    for (_, b) in differing {
        changes.push(Change::ReplaceMaterializedView { view: b.clone() });
    }
}

fn diff_sequences(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, differing) = set_diff(&master.sequences, &branch.sequences);
    for s in only_master {
        changes.push(Change::DropSequence { schema: s.schema.clone(), name: s.name.clone() });
    }
    for s in only_branch {
        changes.push(Change::CreateSequence { sequence: s.clone() });
    }
    for (m, b) in differing {
        changes.push(Change::AlterSequence(AlterSequenceDelta { old: m.clone(), new: b.clone() }));
    }
}

fn diff_indexes(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, differing) = set_diff(&master.indexes, &branch.indexes);
    for i in only_master {
        if !i.is_constraint_backed {
            changes.push(Change::DropIndex { schema: i.schema.clone(), name: i.name.clone() });
        }
    }
    for i in only_branch {
        if !i.is_constraint_backed {
            changes.push(Change::CreateIndex { index: i.clone() });
        }
    }
    for (m, b) in differing {
        if m.is_constraint_backed || b.is_constraint_backed {
            continue;
        }
        changes.push(Change::DropIndex { schema: m.schema.clone(), name: m.name.clone() });
        changes.push(Change::CreateIndex { index: b.clone() });
    }
}

fn differs_only_by_deferrability(a: &Constraint, b: &Constraint) -> bool {
    a.schema == b.schema
        && a.table == b.table
        && a.name == b.name
        && a.kind == b.kind
        && a.columns == b.columns
        && a.check_expression == b.check_expression
        && a.foreign_key == b.foreign_key
        && (a.deferrable != b.deferrable || a.initially_deferred != b.initially_deferred)
}

fn diff_constraints(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, differing) = set_diff(&master.constraints, &branch.constraints);
    for c in only_master {
        changes.push(Change::DropConstraint { schema: c.schema.clone(), table: c.table.clone(), name: c.name.clone() });
    }
    for c in only_branch {
        changes.push(Change::CreateConstraint { constraint: c.clone() });
    }
    for (m, b) in differing {
        use crate::entity::constraint::ConstraintKind;
        if m.kind == ConstraintKind::ForeignKey && differs_only_by_deferrability(m, b) {
            changes.push(Change::AlterConstraint(AlterConstraintDelta { old: m.clone(), new: b.clone() }));
        } else {
            changes.push(Change::DropConstraint { schema: m.schema.clone(), table: m.table.clone(), name: m.name.clone() });
            changes.push(Change::CreateConstraint { constraint: b.clone() });
        }
    }
}

fn diff_functions(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, differing) = set_diff(&master.functions, &branch.functions);
    for f in only_master {
        changes.push(Change::DropFunction { schema: f.schema.clone(), name: f.name.clone(), arg_types: f.arg_types.clone() });
    }
    for f in only_branch {
        changes.push(Change::CreateFunction { function: f.clone() });
    }
    for (_, b) in differing {
        changes.push(Change::ReplaceFunction { function: b.clone() });
    }
}

fn diff_triggers(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, differing) = set_diff(&master.triggers, &branch.triggers);
    for t in only_master {
        changes.push(Change::DropTrigger { schema: t.schema.clone(), table: t.table.clone(), name: t.name.clone() });
    }
    for t in only_branch {
        changes.push(Change::CreateTrigger { trigger: t.clone() });
    }
    for (m, b) in differing {
        changes.push(Change::DropTrigger { schema: m.schema.clone(), table: m.table.clone(), name: m.name.clone() });
        changes.push(Change::CreateTrigger { trigger: b.clone() });
    }
}

fn diff_types(master: &Snapshot, branch: &Snapshot, changes: &mut Vec<Change>) {
    let (only_master, only_branch, differing) = set_diff(&master.types, &branch.types);
    for t in only_master {
        changes.push(Change::DropType { schema: t.schema.clone(), name: t.name.clone() });
    }
    for t in only_branch {
        changes.push(Change::CreateType { ty: t.clone() });
    }
    for (m, b) in differing {
        changes.push(Change::DropType { schema: m.schema.clone(), name: m.name.clone() });
        changes.push(Change::CreateType { ty: b.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::table::Table;

    #[test]
    fn no_op_diff_is_empty() {
        let mut a = Snapshot::new();
        a.add_table(Table { schema: "public".into(), name: "users".into(), row_level_security: false, oid: 1 });
        let changes = diff(&a.clone(), &a);
        assert!(changes.is_empty());
    }

    #[test]
    fn public_schema_never_diffed() {
        use crate::entity::schema::Schema;
        let master = Snapshot::new();
        let mut branch = Snapshot::new();
        branch.add_schema(Schema { name: "public".into(), oid: 11 });
        assert!(diff(&master, &branch).is_empty());
    }

    #[test]
    fn table_creation_carries_branch_columns() {
        use crate::entity::column::{Column, OwnerKind};
        use crate::entity::GeneratedKind;

        let master = Snapshot::new();
        let mut branch = Snapshot::new();
        branch.add_table(Table { schema: "public".into(), name: "users".into(), row_level_security: false, oid: 1 });
        branch.add_column(Column {
            owner_schema: "public".into(),
            owner_table: "users".into(),
            name: "id".into(),
            position: 1,
            not_null: true,
            formatted_type: "integer".into(),
            default_value: None,
            generated: GeneratedKind::NotGenerated,
            generated_expression: None,
            owner_oid: 1,
            owner_kind: OwnerKind::Table,
        });

        let changes = diff(&master, &branch);
        assert_eq!(changes.len(), 1);
        match &changes[0] {
            Change::CreateTable { schema, name, columns } => {
                assert_eq!(schema, "public");
                assert_eq!(name, "users");
                assert_eq!(columns.len(), 1);
            }
            other => panic!("unexpected change: {other:?}"),
        }
    }
}
