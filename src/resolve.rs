//! The Dependency Resolver, grounded in the original's
//! `dependency_resolution.py`: relevance expansion, pairwise semantic
//! constraint generation, same-object operation-priority ordering, and a
//! topological sort over the resulting constraint graph.

use std::collections::{HashSet, VecDeque};

use crate::change::{Change, OpKind};
use crate::error::CyclicDependencyError;
use crate::ident::StableId;
use crate::snapshot::{Snapshot, SourceTag};

struct DependencyModel {
    edges: Vec<(StableId, StableId, SourceTag)>,
}

impl DependencyModel {
    fn has_dependency(&self, dependent: &StableId, referenced: &StableId, source: Option<SourceTag>) -> bool {
        self.edges.iter().any(|(d, r, s)| {
            d == dependent && r == referenced && match source {
                Some(want) => *s == want,
                None => true,
            }
        })
    }
}

/// Seed with every change's target id, then expand transitively through
/// both snapshots' dependency edges up to depth 2, in both directions.
fn find_relevant_objects(seeds: &HashSet<StableId>, master: &Snapshot, branch: &Snapshot) -> HashSet<StableId> {
    let mut relevant = seeds.clone();
    let mut frontier: Vec<StableId> = seeds.iter().cloned().collect();

    for _ in 0..2 {
        let mut next = Vec::new();
        for id in &frontier {
            for edge in master.resolved_depends().chain(branch.resolved_depends()) {
                if &edge.dependent == id && relevant.insert(edge.referenced.clone()) {
                    next.push(edge.referenced.clone());
                }
                if &edge.referenced == id && relevant.insert(edge.dependent.clone()) {
                    next.push(edge.dependent.clone());
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    relevant
}

fn build_dependency_model(master: &Snapshot, branch: &Snapshot, relevant: &HashSet<StableId>) -> DependencyModel {
    let mut edges = Vec::new();
    for e in master.resolved_depends() {
        if relevant.contains(&e.dependent) && relevant.contains(&e.referenced) {
            edges.push((e.dependent.clone(), e.referenced.clone(), SourceTag::Master));
        }
    }
    for e in branch.resolved_depends() {
        if relevant.contains(&e.dependent) && relevant.contains(&e.referenced) {
            edges.push((e.dependent.clone(), e.referenced.clone(), SourceTag::Branch));
        }
    }
    DependencyModel { edges }
}

enum PairOrder {
    AThenB,
    BThenA,
}

fn is_drop(c: &Change) -> bool {
    c.op_kind() == OpKind::Drop
}
fn is_create(c: &Change) -> bool {
    c.op_kind() == OpKind::Create
}
fn is_create_alter_replace(c: &Change) -> bool {
    !is_drop(c)
}

/// First-match-wins pairwise rule table. `a`/`b` are distinct
/// changes; a match determines their relative order.
fn analyze_pair(model: &DependencyModel, a: &Change, a_id: &StableId, b: &Change, b_id: &StableId) -> Option<(PairOrder, &'static str)> {
    if matches!(a, Change::CreateSequence { .. })
        && matches!(b, Change::CreateTable { .. })
        && model.has_dependency(a_id, b_id, Some(SourceTag::Branch))
    {
        return Some((PairOrder::AThenB, "sequence must exist before table references it"));
    }

    if is_drop(a) && is_drop(b) && model.has_dependency(a_id, b_id, Some(SourceTag::Master)) {
        return Some((PairOrder::AThenB, "drop dependents before dependencies"));
    }

    if is_create(a) && is_create(b) && model.has_dependency(a_id, b_id, Some(SourceTag::Branch)) {
        return Some((PairOrder::BThenA, "create dependencies before dependents"));
    }

    if is_create_alter_replace(a) && is_create_alter_replace(b) && model.has_dependency(a_id, b_id, Some(SourceTag::Branch)) {
        return Some((PairOrder::BThenA, "create/alter/replace dependencies before dependents"));
    }

    if is_create_alter_replace(a)
        && is_drop(b)
        && (model.has_dependency(a_id, b_id, Some(SourceTag::Master)) || model.has_dependency(a_id, b_id, Some(SourceTag::Branch)))
    {
        return Some((PairOrder::BThenA, "clear old objects before installing replacements"));
    }

    None
}

fn topological_sort(n: usize, edges: &[(usize, usize)]) -> Result<Vec<usize>, Vec<usize>> {
    let mut indegree = vec![0usize; n];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(before, after) in edges {
        adjacency[before].push(after);
        indegree[after] += 1;
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = queue.pop_front() {
        order.push(i);
        for &j in &adjacency[i] {
            indegree[j] -= 1;
            if indegree[j] == 0 {
                queue.push_back(j);
            }
        }
    }

    if order.len() == n {
        Ok(order)
    } else {
        let seen: HashSet<usize> = order.iter().copied().collect();
        Err((0..n).filter(|i| !seen.contains(i)).collect())
    }
}

/// Order an unordered change set into a sequence safe to execute against
/// `master`: depth-2 relevance expansion, pairwise dependency-rule
/// ordering, then a topological sort.
pub fn resolve(master: &Snapshot, branch: &Snapshot, changes: Vec<Change>) -> Result<Vec<Change>, CyclicDependencyError> {
    let n = changes.len();
    if n <= 1 {
        return Ok(changes);
    }

    let target_ids: Vec<StableId> = changes.iter().map(Change::target_id).collect();
    let seeds: HashSet<StableId> = target_ids.iter().cloned().collect();
    let relevant = find_relevant_objects(&seeds, master, branch);
    let model = build_dependency_model(master, branch, &relevant);

    let mut edges: Vec<(usize, usize)> = Vec::new();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if let Some((order, reason)) = analyze_pair(&model, &changes[i], &target_ids[i], &changes[j], &target_ids[j]) {
                let (before, after) = match order {
                    PairOrder::AThenB => (i, j),
                    PairOrder::BThenA => (j, i),
                };
                tracing::debug!(before, after, reason, "resolve.constraint");
                edges.push((before, after));
            }
        }
    }

    // Same-object operation-priority ordering: DROP < CREATE < ALTER < REPLACE.
    let mut by_target: std::collections::HashMap<&StableId, Vec<usize>> = std::collections::HashMap::new();
    for (i, id) in target_ids.iter().enumerate() {
        by_target.entry(id).or_default().push(i);
    }
    for (_, mut indices) in by_target {
        if indices.len() < 2 {
            continue;
        }
        indices.sort_by_key(|&i| changes[i].op_kind());
        for pair in indices.windows(2) {
            edges.push((pair[0], pair[1]));
        }
    }

    match topological_sort(n, &edges) {
        Ok(order) => {
            let mut slots: Vec<Option<Change>> = changes.into_iter().map(Some).collect();
            let ordered = order.into_iter().map(|i| slots[i].take().expect("each index visited once")).collect();
            Ok(ordered)
        }
        Err(remaining) => {
            let cycle = remaining.into_iter().map(|i| target_ids[i].clone()).collect();
            Err(CyclicDependencyError { cycle })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::sequence::Sequence;
    use crate::entity::table::Table;
    use crate::snapshot::DependencyEdge;

    fn sequence(name: &str) -> Sequence {
        Sequence {
            schema: "s".into(),
            name: name.into(),
            data_type: "integer".into(),
            increment_by: 1,
            min_value: Some(1),
            max_value: None,
            start_value: 1,
            cache_size: 1,
            cycle: false,
            owned_by_table: Some("users".into()),
            owned_by_column: Some("id".into()),
            oid: 1,
        }
    }

    fn table(name: &str) -> Table {
        Table { schema: "s".into(), name: name.into(), row_level_security: false, oid: 2 }
    }

    #[test]
    fn sequence_ordered_before_table_that_references_it() {
        let mut branch = Snapshot::new();
        branch.add_table(table("users"));
        branch.add_sequence(sequence("users_id_seq"));
        let seq_id = crate::ident::sequence_id("s", "users_id_seq");
        let table_id = crate::ident::table_id("s", "users");
        branch.depends.push(DependencyEdge { dependent: seq_id.clone(), referenced: table_id.clone() });

        let master = Snapshot::new();
        let changes = vec![
            Change::CreateTable { schema: "s".into(), name: "users".into(), columns: vec![] },
            Change::CreateSequence { sequence: sequence("users_id_seq") },
        ];

        let ordered = resolve(&master, &branch, changes).unwrap();
        let seq_pos = ordered.iter().position(|c| matches!(c, Change::CreateSequence { .. })).unwrap();
        let table_pos = ordered.iter().position(|c| matches!(c, Change::CreateTable { .. })).unwrap();
        assert!(seq_pos < table_pos);
    }

    #[test]
    fn same_object_drop_before_create_when_both_present() {
        let master = Snapshot::new();
        let branch = Snapshot::new();
        let changes = vec![
            Change::CreateTable { schema: "s".into(), name: "users".into(), columns: vec![] },
            Change::DropTable { schema: "s".into(), name: "users".into() },
        ];
        let ordered = resolve(&master, &branch, changes).unwrap();
        assert!(matches!(ordered[0], Change::DropTable { .. }));
        assert!(matches!(ordered[1], Change::CreateTable { .. }));
    }

    #[test]
    fn cyclic_dependency_is_reported() {
        let master = Snapshot::new();
        let mut branch = Snapshot::new();
        let a = crate::ident::table_id("s", "a");
        let b = crate::ident::table_id("s", "b");
        branch.depends.push(DependencyEdge { dependent: a.clone(), referenced: b.clone() });
        branch.depends.push(DependencyEdge { dependent: b.clone(), referenced: a.clone() });

        let changes = vec![
            Change::CreateTable { schema: "s".into(), name: "a".into(), columns: vec![] },
            Change::CreateTable { schema: "s".into(), name: "b".into(), columns: vec![] },
        ];
        assert!(resolve(&master, &branch, changes).is_err());
    }

    #[test]
    fn trivial_change_sets_pass_through() {
        let master = Snapshot::new();
        let branch = Snapshot::new();
        assert!(resolve(&master, &branch, vec![]).unwrap().is_empty());
    }
}
