//! Extraction Adapter: turns a live connection into a
//! [`Snapshot`]. Two session backends share the same queries and
//! row-mapping code (`queries.rs`) and differ only in how they drive the
//! connection — blocking (`postgres`) or async (`tokio-postgres`).

mod queries;

#[cfg(feature = "sync")]
pub mod sync;

#[cfg(feature = "tokio-postgres")]
pub mod asynchronous;

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
use crate::snapshot::{DependencyEdge, Snapshot};

/// One `pg_depend` row, before oid resolution.
pub(crate) struct RawDepend {
    pub classid_name: String,
    pub objid: u32,
    pub refclassid_name: String,
    pub refobjid: u32,
}

/// Every entity set and raw dependency row pulled from one catalog,
/// before assembly into an immutable [`Snapshot`]. Assembled separately
/// from extraction so both session backends can share one code path.
#[derive(Default)]
pub(crate) struct RawCatalog {
    pub schemas: Vec<Schema>,
    pub tables: Vec<Table>,
    pub views: Vec<View>,
    pub materialized_views: Vec<MaterializedView>,
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
    pub indexes: Vec<Index>,
    pub sequences: Vec<Sequence>,
    pub policies: Vec<Policy>,
    pub functions: Vec<Function>,
    pub triggers: Vec<Trigger>,
    pub types: Vec<Type>,
    pub depends: Vec<RawDepend>,
    /// `(view_oid, referenced_table_or_view_oid)`, from `pg_rewrite`, used
    /// to augment a view's `pg_depend` edges with its base-relation reads.
    pub view_depends: Vec<(u32, u32)>,
}

/// Maps a `pg_depend` `(classid_name, oid)` pair to the stable id of the
/// entity it names, mirroring the original's `oid_to_stable_id` dict
/// (`model/pg_depend.py`). `pg_class` covers tables, views, materialized
/// views, sequences, and indexes — all share that catalog.
struct OidIndex {
    pg_class: HashMap<u32, StableId>,
    pg_constraint: HashMap<u32, StableId>,
    pg_policy: HashMap<u32, StableId>,
    pg_proc: HashMap<u32, StableId>,
    pg_trigger: HashMap<u32, StableId>,
    pg_type: HashMap<u32, StableId>,
}

impl OidIndex {
    fn resolve(&self, classid_name: &str, oid: u32) -> Option<StableId> {
        match classid_name {
            "pg_class" => self.pg_class.get(&oid).cloned(),
            "pg_constraint" => self.pg_constraint.get(&oid).cloned(),
            "pg_policy" => self.pg_policy.get(&oid).cloned(),
            "pg_proc" => self.pg_proc.get(&oid).cloned(),
            "pg_trigger" => self.pg_trigger.get(&oid).cloned(),
            "pg_type" => self.pg_type.get(&oid).cloned(),
            _ => None,
        }
    }
}

pub(crate) fn assemble(raw: RawCatalog) -> Snapshot {
    let mut snapshot = Snapshot::new();

    let mut pg_class = HashMap::new();
    for t in &raw.tables {
        pg_class.insert(t.oid, t.stable_id());
    }
    for v in &raw.views {
        pg_class.insert(v.oid, v.stable_id());
    }
    for v in &raw.materialized_views {
        pg_class.insert(v.oid, v.stable_id());
    }
    for s in &raw.sequences {
        pg_class.insert(s.oid, s.stable_id());
    }
    for i in &raw.indexes {
        pg_class.insert(i.oid, i.stable_id());
    }

    let oid_index = OidIndex {
        pg_class,
        pg_constraint: raw.constraints.iter().map(|c| (c.oid, c.stable_id())).collect(),
        pg_policy: raw.policies.iter().map(|p| (p.oid, p.stable_id())).collect(),
        pg_proc: raw.functions.iter().map(|f| (f.oid, f.stable_id())).collect(),
        pg_trigger: raw.triggers.iter().map(|t| (t.oid, t.stable_id())).collect(),
        pg_type: raw.types.iter().map(|t| (t.oid, t.stable_id())).collect(),
    };

    for d in &raw.depends {
        snapshot.depends.push(queries::resolve_edge(
            &d.classid_name,
            d.objid,
            &d.refclassid_name,
            d.refobjid,
            |c, o| oid_index.resolve(c, o),
        ));
    }
    for (view_oid, ref_oid) in &raw.view_depends {
        if let (Some(dependent), Some(referenced)) =
            (oid_index.pg_class.get(view_oid), oid_index.pg_class.get(ref_oid))
        {
            snapshot
                .depends
                .push(DependencyEdge { dependent: dependent.clone(), referenced: referenced.clone() });
        }
    }

    for e in raw.schemas {
        snapshot.add_schema(e);
    }
    for e in raw.tables {
        snapshot.add_table(e);
    }
    for e in raw.views {
        snapshot.add_view(e);
    }
    for e in raw.materialized_views {
        snapshot.add_materialized_view(e);
    }
    for e in raw.columns {
        snapshot.add_column(e);
    }
    for e in raw.constraints {
        snapshot.add_constraint(e);
    }
    for e in raw.indexes {
        snapshot.add_index(e);
    }
    for e in raw.sequences {
        snapshot.add_sequence(e);
    }
    for e in raw.policies {
        snapshot.add_policy(e);
    }
    for e in raw.functions {
        snapshot.add_function(e);
    }
    for e in raw.triggers {
        snapshot.add_trigger(e);
    }
    for e in raw.types {
        snapshot.add_type(e);
    }

    tracing::info!(
        tables = snapshot.tables.len(),
        columns = snapshot.columns.len(),
        depends = snapshot.depends.len(),
        "extract.complete"
    );
    snapshot
}
