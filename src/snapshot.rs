//! The immutable Catalog Snapshot.

use std::collections::HashMap;

use crate::entity::column::Column;
use crate::entity::constraint::Constraint;
use crate::entity::function::Function;
use crate::entity::index::Index;
use crate::entity::pg_type::Type;
use crate::entity::policy::Policy;
use crate::entity::schema::Schema;
use crate::entity::sequence::Sequence;
use crate::entity::table::Table;
use crate::entity::trigger::Trigger;
use crate::entity::view::{MaterializedView, View};
use crate::entity::Entity;
use crate::ident::StableId;

/// Which snapshot a dependency edge was extracted from. Assigned by the
/// resolver when it tags edges during relevance expansion,
/// not by extraction itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SourceTag {
    Master,
    Branch,
}

/// `(dependent_stable_id, referenced_stable_id, source_tag)`. Edges whose
/// endpoints did not resolve to a known entity
/// during extraction carry the `unknown.*` sentinel prefix in one or both
/// ids; [`Snapshot::dependency_edges`] retains them, downstream consumers
/// (the resolver) filter them out.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DependencyEdge {
    pub dependent: StableId,
    pub referenced: StableId,
}

/// An immutable, fully-materialized view of one catalog. Built once by
/// the Extraction Adapter (or by a test fixture) and never mutated
/// afterward.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    pub schemas: HashMap<StableId, Schema>,
    pub tables: HashMap<StableId, Table>,
    pub views: HashMap<StableId, View>,
    pub materialized_views: HashMap<StableId, MaterializedView>,
    pub columns: HashMap<StableId, Column>,
    pub constraints: HashMap<StableId, Constraint>,
    pub indexes: HashMap<StableId, Index>,
    pub sequences: HashMap<StableId, Sequence>,
    pub policies: HashMap<StableId, Policy>,
    pub functions: HashMap<StableId, Function>,
    pub triggers: HashMap<StableId, Trigger>,
    pub types: HashMap<StableId, Type>,

    /// Raw dependency edges as resolved during extraction, before the
    /// resolver tags them with a source. Kept untagged here since a
    /// single snapshot has only one possible source when it is later
    /// consulted by the resolver.
    pub depends: Vec<DependencyEdge>,
}

fn insert_keyed<E: Entity>(map: &mut HashMap<StableId, E>, entity: E) {
    map.insert(entity.stable_id(), entity);
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_schema(&mut self, e: Schema) {
        insert_keyed(&mut self.schemas, e);
    }
    pub fn add_table(&mut self, e: Table) {
        insert_keyed(&mut self.tables, e);
    }
    pub fn add_view(&mut self, e: View) {
        insert_keyed(&mut self.views, e);
    }
    pub fn add_materialized_view(&mut self, e: MaterializedView) {
        insert_keyed(&mut self.materialized_views, e);
    }
    pub fn add_column(&mut self, e: Column) {
        insert_keyed(&mut self.columns, e);
    }
    pub fn add_constraint(&mut self, e: Constraint) {
        insert_keyed(&mut self.constraints, e);
    }
    pub fn add_index(&mut self, e: Index) {
        insert_keyed(&mut self.indexes, e);
    }
    pub fn add_sequence(&mut self, e: Sequence) {
        insert_keyed(&mut self.sequences, e);
    }
    pub fn add_policy(&mut self, e: Policy) {
        insert_keyed(&mut self.policies, e);
    }
    pub fn add_function(&mut self, e: Function) {
        insert_keyed(&mut self.functions, e);
    }
    pub fn add_trigger(&mut self, e: Trigger) {
        insert_keyed(&mut self.triggers, e);
    }
    pub fn add_type(&mut self, e: Type) {
        insert_keyed(&mut self.types, e);
    }

    /// Columns belonging to one owning relation, ordered by position —
    /// the order the differ and the `CREATE TABLE` emitter both rely on.
    pub fn columns_of(&self, owner: &StableId) -> Vec<&Column> {
        let mut cols: Vec<&Column> = self
            .columns
            .values()
            .filter(|c| &c.owner_stable_id() == owner)
            .collect();
        cols.sort_by_key(|c| c.position);
        cols
    }

    /// Direct dependency edges, both directions, excluding any edge whose
    /// endpoint is an `unknown.*` sentinel.
    pub fn resolved_depends(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.depends
            .iter()
            .filter(|e| !e.dependent.is_unknown_sentinel() && !e.referenced.is_unknown_sentinel())
    }

    /// Full-catalog semantic comparison, used by the verification harness
    /// collaborator. Dependency edges are excluded, matching the
    /// original's `semantically_equals` (it skips the `depends` field).
    pub fn semantically_equals(&self, other: &Snapshot) -> bool {
        fn kind_eq<E: Entity + PartialEq>(a: &HashMap<StableId, E>, b: &HashMap<StableId, E>) -> bool {
            a.len() == b.len()
                && a.iter()
                    .all(|(id, entity)| b.get(id).is_some_and(|o| entity.semantically_eq(o)))
        }

        kind_eq(&self.schemas, &other.schemas)
            && kind_eq(&self.tables, &other.tables)
            && kind_eq(&self.views, &other.views)
            && kind_eq(&self.materialized_views, &other.materialized_views)
            && kind_eq(&self.columns, &other.columns)
            && kind_eq(&self.constraints, &other.constraints)
            && kind_eq(&self.indexes, &other.indexes)
            && kind_eq(&self.sequences, &other.sequences)
            && kind_eq(&self.policies, &other.policies)
            && kind_eq(&self.functions, &other.functions)
            && kind_eq(&self.triggers, &other.triggers)
            && kind_eq(&self.types, &other.types)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn load(path: &std::path::Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)
    }
}
