//! Per-column table diff, modeled on a column-operation family
//! (add/drop/alter-type/alter-default/alter-nullability) rather than
//! one monolithic table-rewrite change.

use std::collections::HashMap;

use crate::change::Change;
use crate::entity::column::Column;

/// Diff one table's columns, `master`/`branch` already ordered by
/// position (as returned by `Snapshot::columns_of`). Emission order
/// follows branch column number, falling back to master's for columns
/// only present there.
pub fn diff_columns(schema: &str, table: &str, master: &[&Column], branch: &[&Column]) -> Vec<Change> {
    let master_by_name: HashMap<&str, &Column> = master.iter().map(|c| (c.name.as_str(), *c)).collect();
    let branch_by_name: HashMap<&str, &Column> = branch.iter().map(|c| (c.name.as_str(), *c)).collect();

    let mut names: Vec<&str> = master_by_name.keys().chain(branch_by_name.keys()).copied().collect();
    names.sort_unstable();
    names.dedup();
    names.sort_by_key(|name| {
        branch_by_name
            .get(name)
            .map(|c| c.position)
            .unwrap_or_else(|| master_by_name[name].position)
    });

    let mut changes = Vec::new();
    for name in names {
        match (master_by_name.get(name), branch_by_name.get(name)) {
            (None, Some(b)) => changes.push(Change::AddColumn {
                schema: schema.to_string(),
                table: table.to_string(),
                column: (*b).clone(),
            }),
            (Some(_), None) => changes.push(Change::DropColumn {
                schema: schema.to_string(),
                table: table.to_string(),
                column_name: name.to_string(),
            }),
            (Some(m), Some(b)) => {
                diff_one_column(schema, table, m, b, &mut changes);
            }
            (None, None) => unreachable!("name came from the union of both maps"),
        }
    }
    changes
}

fn diff_one_column(schema: &str, table: &str, master: &Column, branch: &Column, changes: &mut Vec<Change>) {
    if master.generated != branch.generated || master.generated_expression != branch.generated_expression {
        changes.push(Change::DropColumn {
            schema: schema.to_string(),
            table: table.to_string(),
            column_name: master.name.clone(),
        });
        changes.push(Change::AddColumn {
            schema: schema.to_string(),
            table: table.to_string(),
            column: branch.clone(),
        });
        return;
    }

    if master.formatted_type != branch.formatted_type {
        changes.push(Change::AlterColumnType {
            schema: schema.to_string(),
            table: table.to_string(),
            column_name: branch.name.clone(),
            new_type: branch.formatted_type.clone(),
        });
    }

    if master.default_value != branch.default_value && !branch.is_generated() {
        match &branch.default_value {
            Some(default_expression) => changes.push(Change::AlterColumnSetDefault {
                schema: schema.to_string(),
                table: table.to_string(),
                column_name: branch.name.clone(),
                default_expression: default_expression.clone(),
            }),
            None => changes.push(Change::AlterColumnDropDefault {
                schema: schema.to_string(),
                table: table.to_string(),
                column_name: branch.name.clone(),
            }),
        }
    }

    if master.not_null != branch.not_null {
        if branch.not_null {
            changes.push(Change::AlterColumnSetNotNull {
                schema: schema.to_string(),
                table: table.to_string(),
                column_name: branch.name.clone(),
            });
        } else {
            changes.push(Change::AlterColumnDropNotNull {
                schema: schema.to_string(),
                table: table.to_string(),
                column_name: branch.name.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::column::OwnerKind;
    use crate::entity::GeneratedKind;

    fn col(name: &str, position: i16, ty: &str, not_null: bool, default: Option<&str>) -> Column {
        Column {
            owner_schema: "public".into(),
            owner_table: "users".into(),
            name: name.into(),
            position,
            not_null,
            formatted_type: ty.into(),
            default_value: default.map(String::from),
            generated: GeneratedKind::NotGenerated,
            generated_expression: None,
            owner_oid: 1,
            owner_kind: OwnerKind::Table,
        }
    }

    #[test]
    fn added_column_emits_add_column() {
        let branch_col = col("email", 2, "text", true, None);
        let changes = diff_columns("public", "users", &[], &[&branch_col]);
        assert_eq!(changes, vec![Change::AddColumn {
            schema: "public".into(),
            table: "users".into(),
            column: branch_col,
        }]);
    }

    #[test]
    fn dropped_column_emits_drop_column() {
        let master_col = col("legacy", 1, "text", false, None);
        let changes = diff_columns("public", "users", &[&master_col], &[]);
        assert_eq!(changes, vec![Change::DropColumn {
            schema: "public".into(),
            table: "users".into(),
            column_name: "legacy".into(),
        }]);
    }

    #[test]
    fn type_change_emits_alter_column_type() {
        let master_col = col("age", 1, "smallint", false, None);
        let branch_col = col("age", 1, "integer", false, None);
        let changes = diff_columns("public", "users", &[&master_col], &[&branch_col]);
        assert_eq!(changes, vec![Change::AlterColumnType {
            schema: "public".into(),
            table: "users".into(),
            column_name: "age".into(),
            new_type: "integer".into(),
        }]);
    }

    #[test]
    fn default_removed_emits_drop_default() {
        let master_col = col("flag", 1, "boolean", false, Some("true"));
        let branch_col = col("flag", 1, "boolean", false, None);
        let changes = diff_columns("public", "users", &[&master_col], &[&branch_col]);
        assert_eq!(changes, vec![Change::AlterColumnDropDefault {
            schema: "public".into(),
            table: "users".into(),
            column_name: "flag".into(),
        }]);
    }

    #[test]
    fn not_null_toggled_both_ways() {
        let master_col = col("name", 1, "text", false, None);
        let branch_col = col("name", 1, "text", true, None);
        let changes = diff_columns("public", "users", &[&master_col], &[&branch_col]);
        assert_eq!(changes, vec![Change::AlterColumnSetNotNull {
            schema: "public".into(),
            table: "users".into(),
            column_name: "name".into(),
        }]);

        let changes_back = diff_columns("public", "users", &[&branch_col], &[&master_col]);
        assert_eq!(changes_back, vec![Change::AlterColumnDropNotNull {
            schema: "public".into(),
            table: "users".into(),
            column_name: "name".into(),
        }]);
    }

    #[test]
    fn generated_expression_change_is_drop_and_add_not_alter() {
        let master_col = Column {
            generated: GeneratedKind::Stored,
            generated_expression: Some("a + b".into()),
            ..col("total", 1, "integer", true, None)
        };
        let branch_col = Column {
            generated: GeneratedKind::Stored,
            generated_expression: Some("a + b + c".into()),
            ..col("total", 1, "integer", true, None)
        };
        let changes = diff_columns("public", "users", &[&master_col], &[&branch_col]);
        assert_eq!(
            changes,
            vec![
                Change::DropColumn { schema: "public".into(), table: "users".into(), column_name: "total".into() },
                Change::AddColumn { schema: "public".into(), table: "users".into(), column: branch_col },
            ]
        );
    }
}
