//! Per-policy diff, with rename detection: a policy pair that differs
//! only by name emits a single rename rather than a drop/create pair.

use std::collections::{HashMap, HashSet};

use crate::change::{AlterPolicyDelta, Change};
use crate::entity::policy::Policy;
use crate::entity::Entity;
use crate::ident::StableId;

pub fn diff_policies(master: &HashMap<StableId, Policy>, branch: &HashMap<StableId, Policy>) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut master_only: Vec<&Policy> = Vec::new();
    let mut branch_only: Vec<&Policy> = Vec::new();

    for (id, m) in master {
        match branch.get(id) {
            None => master_only.push(m),
            Some(b) => {
                if m.semantically_eq(b) {
                    continue;
                }
                if m.command != b.command || m.permissive != b.permissive {
                    changes.push(Change::DropPolicy {
                        schema: m.schema.clone(),
                        table: m.table.clone(),
                        name: m.name.clone(),
                    });
                    changes.push(Change::CreatePolicy { policy: b.clone() });
                } else {
                    changes.push(Change::AlterPolicy(AlterPolicyDelta {
                        schema: b.schema.clone(),
                        table: b.table.clone(),
                        name: b.name.clone(),
                        new_roles: diff_field(&m.roles, &b.roles),
                        new_using: diff_expr(&m.using_expr, &b.using_expr),
                        new_with_check: diff_expr(&m.with_check_expr, &b.with_check_expr),
                    }));
                }
            }
        }
    }
    for (id, b) in branch {
        if !master.contains_key(id) {
            branch_only.push(b);
        }
    }

    let mut matched_master: HashSet<StableId> = HashSet::new();
    let mut matched_branch: HashSet<StableId> = HashSet::new();
    for m in &master_only {
        if let Some(b) = branch_only
            .iter()
            .find(|b| !matched_branch.contains(&b.stable_id()) && m.differs_only_by_name(b))
        {
            changes.push(Change::RenamePolicyTo {
                schema: m.schema.clone(),
                table: m.table.clone(),
                old_name: m.name.clone(),
                new_name: b.name.clone(),
            });
            matched_master.insert(m.stable_id());
            matched_branch.insert(b.stable_id());
        }
    }

    for m in &master_only {
        if !matched_master.contains(&m.stable_id()) {
            changes.push(Change::DropPolicy {
                schema: m.schema.clone(),
                table: m.table.clone(),
                name: m.name.clone(),
            });
        }
    }
    for b in &branch_only {
        if !matched_branch.contains(&b.stable_id()) {
            changes.push(Change::CreatePolicy { policy: (*b).clone() });
        }
    }

    changes
}

fn diff_field<T: Clone + PartialEq>(old: &T, new: &T) -> Option<T> {
    if old == new {
        None
    } else {
        Some(new.clone())
    }
}

/// `None` = unchanged, `Some("")` = explicit removal, `Some(expr)` = new value.
fn diff_expr(old: &Option<String>, new: &Option<String>) -> Option<String> {
    if old == new {
        None
    } else {
        Some(new.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PolicyCommand;
    use crate::ident::policy_id;

    fn policy(name: &str, using: Option<&str>) -> Policy {
        Policy {
            schema: "public".into(),
            table: "posts".into(),
            name: name.into(),
            command: PolicyCommand::Select,
            permissive: true,
            roles: vec!["authenticated".into()],
            using_expr: using.map(String::from),
            with_check_expr: None,
            oid: 1,
        }
    }

    #[test]
    fn rename_only_emits_single_rename_change() {
        let mut master = HashMap::new();
        let old = policy("read_posts", Some("true"));
        master.insert(old.stable_id(), old);

        let mut branch = HashMap::new();
        let renamed = policy("read_posts_v2", Some("true"));
        branch.insert(renamed.stable_id(), renamed);

        let changes = diff_policies(&master, &branch);
        assert_eq!(
            changes,
            vec![Change::RenamePolicyTo {
                schema: "public".into(),
                table: "posts".into(),
                old_name: "read_posts".into(),
                new_name: "read_posts_v2".into(),
            }]
        );
    }

    #[test]
    fn command_change_is_drop_and_create() {
        let mut master = HashMap::new();
        let mut m = policy("read_posts", Some("true"));
        m.command = PolicyCommand::Select;
        master.insert(m.stable_id(), m);

        let mut branch = HashMap::new();
        let mut b = policy("read_posts", Some("true"));
        b.command = PolicyCommand::All;
        branch.insert(b.stable_id(), b.clone());

        let changes = diff_policies(&master, &branch);
        assert_eq!(
            changes,
            vec![
                Change::DropPolicy { schema: "public".into(), table: "posts".into(), name: "read_posts".into() },
                Change::CreatePolicy { policy: b },
            ]
        );
    }

    #[test]
    fn using_expression_removed_is_explicit_empty_string() {
        let mut master = HashMap::new();
        let m = policy("read_posts", Some("true"));
        master.insert(m.stable_id(), m);

        let mut branch = HashMap::new();
        let b = policy("read_posts", None);
        branch.insert(b.stable_id(), b);

        let changes = diff_policies(&master, &branch);
        assert_eq!(
            changes,
            vec![Change::AlterPolicy(AlterPolicyDelta {
                schema: "public".into(),
                table: "posts".into(),
                name: "read_posts".into(),
                new_roles: None,
                new_using: Some(String::new()),
                new_with_check: None,
            })]
        );
    }

    #[test]
    fn identical_policies_yield_no_changes() {
        let mut master = HashMap::new();
        let m = policy("read_posts", Some("true"));
        master.insert(m.stable_id(), m.clone());
        let mut branch = HashMap::new();
        branch.insert(policy_id("public", "posts", "read_posts"), m);

        assert!(diff_policies(&master, &branch).is_empty());
    }
}
