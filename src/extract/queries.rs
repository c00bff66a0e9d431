//! Catalog SQL, grounded in the original source's per-relation query
//! modules (`model/pg_*.py`), and the row-to-entity mapping shared by the
//! sync and async extraction adapters. Both `postgres::Row` and
//! `tokio_postgres::Row` are the same type, so one set of mapping
//! functions serves both sessions.

// `postgres::Row` is a re-export of `tokio_postgres::Row` (the sync crate
// wraps the async one), so either feature alone is enough to name it here.
#[cfg(feature = "tokio-postgres")]
use tokio_postgres::Row;
#[cfg(all(feature = "sync", not(feature = "tokio-postgres")))]
use postgres::Row;

use crate::entity::column::{Column, OwnerKind};
use crate::entity::constraint::{Constraint, ForeignKeyDetail};
use crate::entity::function::Function;
use crate::entity::index::Index;
use crate::entity::pg_type::{CompositeAttribute, Type, TypeKind};
use crate::entity::policy::Policy;
use crate::entity::schema::Schema;
use crate::entity::sequence::Sequence;
use crate::entity::table::Table;
use crate::entity::trigger::Trigger;
use crate::entity::view::{MaterializedView, View};
use crate::entity::constraint::ConstraintKind;
use crate::entity::{FkAction, FkMatchType, GeneratedKind, PolicyCommand};
use crate::error::ExtractionError;
use crate::snapshot::DependencyEdge;

/// Excludes system namespaces the same way every catalog query in the
/// original does (`pg_namespace.py` and friends).
const NAMESPACE_FILTER: &str = "
    AND n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
    AND n.nspname NOT LIKE 'pg_temp_%'
    AND n.nspname NOT LIKE 'pg_toast_temp_%'
";

pub const SET_EMPTY_SEARCH_PATH: &str = "SET search_path = ''";

pub fn namespaces_sql() -> String {
    format!(
        "SELECT oid, nspname FROM pg_catalog.pg_namespace
         WHERE nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
         AND nspname NOT LIKE 'pg_temp_%' AND nspname NOT LIKE 'pg_toast_temp_%'
         ORDER BY nspname"
    )
}

pub fn tables_sql() -> String {
    format!(
        "SELECT c.oid, n.nspname, c.relname, c.relrowsecurity
         FROM pg_catalog.pg_class c
         JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
         WHERE c.relkind = 'r' {NAMESPACE_FILTER}
         ORDER BY n.nspname, c.relname"
    )
}

pub fn views_sql(relkind: char) -> String {
    format!(
        "SELECT c.oid, n.nspname, c.relname, pg_catalog.pg_get_viewdef(c.oid) AS body
         FROM pg_catalog.pg_class c
         JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
         WHERE c.relkind = '{relkind}' {NAMESPACE_FILTER}
         ORDER BY n.nspname, c.relname"
    )
}

pub fn columns_sql() -> String {
    format!(
        "SELECT
            a.attrelid, c.oid AS owner_oid, n.nspname AS owner_schema, c.relname AS owner_table,
            a.attname, a.attnum, a.attnotnull,
            pg_catalog.format_type(a.atttypid, a.atttypmod) AS formatted_type,
            CASE WHEN a.attgenerated = '' THEN pg_catalog.pg_get_expr(d.adbin, d.adrelid) ELSE NULL END AS default_value,
            COALESCE(a.attgenerated, '') AS attgenerated,
            CASE WHEN a.attgenerated = 's' THEN pg_catalog.pg_get_expr(g.adbin, g.adrelid, true) ELSE NULL END AS generated_expression
         FROM pg_catalog.pg_attribute a
         JOIN pg_catalog.pg_class c ON a.attrelid = c.oid
         JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
         LEFT JOIN pg_catalog.pg_attrdef d ON a.attrelid = d.adrelid AND a.attnum = d.adnum AND a.attgenerated = ''
         LEFT JOIN pg_catalog.pg_attrdef g ON a.attrelid = g.adrelid AND a.attnum = g.adnum AND a.attgenerated = 's'
         WHERE c.relkind = 'r' {NAMESPACE_FILTER}
         AND a.attnum > 0 AND NOT a.attisdropped
         ORDER BY n.nspname, c.relname, a.attnum"
    )
}

pub fn constraints_sql() -> String {
    format!(
        "SELECT
            c.oid, c.conname, c.contype, c.conrelid AS table_oid,
            c.condeferrable, c.condeferred,
            n.nspname AS namespace_name, r.relname AS table_name,
            (SELECT array_agg(a.attname ORDER BY u.ord)
             FROM unnest(c.conkey) WITH ORDINALITY AS u(attnum, ord)
             JOIN pg_catalog.pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = u.attnum
            ) AS columns,
            CASE WHEN c.contype = 'c'
                 THEN substring(pg_catalog.pg_get_constraintdef(c.oid) FROM 'CHECK \\((.*)\\)$')
                 ELSE NULL
            END AS check_expression,
            rn.nspname AS ref_schema, rt.relname AS ref_table,
            (SELECT array_agg(ra.attname ORDER BY u.ord)
             FROM unnest(c.confkey) WITH ORDINALITY AS u(attnum, ord)
             JOIN pg_catalog.pg_attribute ra ON ra.attrelid = c.confrelid AND ra.attnum = u.attnum
            ) AS ref_columns,
            c.confupdtype, c.confdeltype, c.confmatchtype
         FROM pg_catalog.pg_constraint c
         JOIN pg_catalog.pg_class r ON c.conrelid = r.oid
         JOIN pg_catalog.pg_namespace n ON r.relnamespace = n.oid
         LEFT JOIN pg_catalog.pg_class rt ON c.confrelid = rt.oid
         LEFT JOIN pg_catalog.pg_namespace rn ON rt.relnamespace = rn.oid
         WHERE r.relkind = 'r' AND c.contype IN ('p', 'f', 'u', 'c')
         {NAMESPACE_FILTER}
         ORDER BY n.nspname, r.relname, c.conname"
    )
}

pub fn indexes_sql() -> String {
    format!(
        "SELECT
            ci.oid, n.nspname AS namespace_name, ci.relname AS index_name, ct.relname AS table_name,
            i.indrelid AS table_oid, i.indisunique, i.indisprimary,
            pg_catalog.pg_get_indexdef(i.indexrelid) AS index_definition,
            EXISTS (SELECT 1 FROM pg_catalog.pg_constraint c WHERE c.conindid = i.indexrelid) AS is_constraint_index
         FROM pg_catalog.pg_index i
         JOIN pg_catalog.pg_class ci ON i.indexrelid = ci.oid
         JOIN pg_catalog.pg_class ct ON i.indrelid = ct.oid
         JOIN pg_catalog.pg_namespace n ON ci.relnamespace = n.oid
         WHERE 1 = 1 {NAMESPACE_FILTER}
         ORDER BY n.nspname, ci.relname"
    )
}

pub fn sequences_sql() -> String {
    format!(
        "SELECT
            c.oid, n.nspname AS namespace, c.relname AS seqname,
            s.seqtypid::regtype::text AS data_type,
            s.seqincrement AS increment_by, s.seqmin AS min_value, s.seqmax AS max_value,
            s.seqstart AS start_value, s.seqcache AS cache_size, s.seqcycle AS cycle,
            ref_c.relname AS owned_by_table, ref_a.attname AS owned_by_column
         FROM pg_catalog.pg_sequence s
         JOIN pg_catalog.pg_class c ON s.seqrelid = c.oid
         JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
         LEFT JOIN pg_catalog.pg_depend dep ON (
             dep.objid = c.oid AND dep.classid = 'pg_class'::regclass
             AND dep.objsubid = 0 AND dep.deptype = 'a'
         )
         LEFT JOIN pg_catalog.pg_class ref_c ON dep.refobjid = ref_c.oid
         LEFT JOIN pg_catalog.pg_attribute ref_a ON dep.refobjid = ref_a.attrelid AND dep.refobjsubid = ref_a.attnum
         WHERE 1 = 1 {NAMESPACE_FILTER}
         ORDER BY n.nspname, c.relname"
    )
}

pub fn policies_sql() -> String {
    format!(
        "SELECT
            pol.oid, pol.polname, c.relname AS tablename, n.nspname AS namespace,
            pol.polcmd, pol.polpermissive,
            CASE WHEN pol.polroles = '{{0}}' THEN ARRAY['public']::text[]
                 ELSE ARRAY(SELECT rolname FROM pg_catalog.pg_roles WHERE oid = ANY(pol.polroles) ORDER BY rolname)
            END AS polroles,
            pg_catalog.pg_get_expr(pol.polqual, c.oid) AS polqual,
            pg_catalog.pg_get_expr(pol.polwithcheck, c.oid) AS polwithcheck
         FROM pg_catalog.pg_policy pol
         JOIN pg_catalog.pg_class c ON pol.polrelid = c.oid
         JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
         WHERE 1 = 1 {NAMESPACE_FILTER}
         ORDER BY n.nspname, c.relname, pol.polname"
    )
}

pub fn functions_sql() -> String {
    format!(
        "SELECT
            p.oid, n.nspname AS namespace, p.proname,
            pg_catalog.pg_get_function_identity_arguments(p.oid) AS proargtypes,
            pg_catalog.pg_get_functiondef(p.oid) AS function_definition
         FROM pg_catalog.pg_proc p
         JOIN pg_catalog.pg_namespace n ON p.pronamespace = n.oid
         WHERE p.prokind = 'f' {NAMESPACE_FILTER}
         AND NOT EXISTS (
             SELECT 1 FROM pg_catalog.pg_depend d
             WHERE d.classid = 'pg_proc'::regclass AND d.objid = p.oid AND d.deptype = 'i'
         )
         ORDER BY n.nspname, p.proname, p.oid"
    )
}

pub fn triggers_sql() -> String {
    format!(
        "SELECT
            t.oid, t.tgrelid AS table_oid, t.tgfoid AS function_oid,
            n.nspname AS namespace, c.relname AS table_name, t.tgname,
            pg_catalog.pg_get_triggerdef(t.oid) AS trigger_definition
         FROM pg_catalog.pg_trigger t
         JOIN pg_catalog.pg_class c ON t.tgrelid = c.oid
         JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
         WHERE NOT t.tgisinternal {NAMESPACE_FILTER}
         ORDER BY n.nspname, c.relname, t.tgname"
    )
}

pub fn types_sql() -> String {
    format!(
        "SELECT t.oid, n.nspname, t.typname, t.typtype, t.typbasetype, t.typtypmod, t.typrelid
         FROM pg_catalog.pg_type t
         JOIN pg_catalog.pg_namespace n ON t.typnamespace = n.oid
         WHERE t.typtype IN ('e', 'd', 'c', 'r') {NAMESPACE_FILTER}
         AND NOT (t.typtype = 'c' AND t.typrelid != 0 AND EXISTS (
             SELECT 1 FROM pg_catalog.pg_class rc WHERE rc.oid = t.typrelid AND rc.relkind = 'r'
         ))
         ORDER BY n.nspname, t.typname"
    )
}

pub const ENUM_VALUES_SQL: &str =
    "SELECT enumlabel FROM pg_catalog.pg_enum WHERE enumtypid = $1 ORDER BY enumsortorder";

pub const DOMAIN_CONSTRAINTS_SQL: &str = "
    SELECT substring(pg_catalog.pg_get_constraintdef(oid) FROM 'CHECK \\((.*)\\)$') AS expr
    FROM pg_catalog.pg_constraint
    WHERE contypid = $1 AND contype = 'c'
    ORDER BY oid
";

pub const COMPOSITE_ATTRIBUTES_SQL: &str = "
    SELECT attname, attnum, attnotnull, pg_catalog.format_type(atttypid, atttypmod) AS formatted_type
    FROM pg_catalog.pg_attribute
    WHERE attrelid = $1 AND attnum > 0 AND NOT attisdropped
    ORDER BY attnum
";

pub const RANGE_SUBTYPE_SQL: &str =
    "SELECT pg_catalog.format_type(rngsubtype, NULL) AS subtype FROM pg_catalog.pg_range WHERE rngtypid = $1";

/// The dependency query is grounded in `pg_depend.py`: restricted to the
/// dependency types that matter for DDL ordering, and resolved against an
/// oid->stable-id map assembled client-side rather than in SQL (the
/// original builds the same map in Python for the same reason — `pg_depend`
/// alone cannot distinguish an index's stable id from its table's, both
/// living in `pg_class`).
pub fn depends_sql() -> String {
    "SELECT d.classid::regclass::text AS classid_name, d.objid, d.objsubid,
            d.refclassid::regclass::text AS refclassid_name, d.refobjid, d.refobjsubid, d.deptype
     FROM pg_catalog.pg_depend d
     WHERE d.deptype IN ('n', 'a', 'i')
     ORDER BY d.objid, d.objsubid"
        .to_string()
}

pub fn view_depends_sql() -> String {
    "SELECT DISTINCT r.ev_class AS view_oid, d.refobjid
     FROM pg_catalog.pg_rewrite r
     JOIN pg_catalog.pg_depend d ON d.objid = r.oid AND d.classid = 'pg_rewrite'::regclass
     WHERE d.refclassid = 'pg_class'::regclass AND d.deptype = 'n'"
        .to_string()
}

pub fn schema_from_row(row: &Row) -> Schema {
    Schema { name: row.get("nspname"), oid: row.get::<_, u32>("oid") }
}

pub fn table_from_row(row: &Row) -> Table {
    Table {
        schema: row.get("nspname"),
        name: row.get("relname"),
        row_level_security: row.get("relrowsecurity"),
        oid: row.get::<_, u32>("oid"),
    }
}

pub fn view_from_row(row: &Row) -> View {
    let schema: String = row.get("nspname");
    let name: String = row.get("relname");
    let body: String = row.get("body");
    let definition = format!(
        "CREATE VIEW {} AS\n{}",
        crate::ident::quote_qualified(&schema, &name),
        body.trim()
    );
    View { schema, name, definition, oid: row.get::<_, u32>("oid") }
}

pub fn materialized_view_from_row(row: &Row) -> MaterializedView {
    let schema: String = row.get("nspname");
    let name: String = row.get("relname");
    let body: String = row.get("body");
    let definition = format!(
        "CREATE MATERIALIZED VIEW {} AS\n{}",
        crate::ident::quote_qualified(&schema, &name),
        body.trim()
    );
    MaterializedView { schema, name, definition, oid: row.get::<_, u32>("oid") }
}

pub fn column_from_row(row: &Row) -> Column {
    let attgenerated: String = row.get("attgenerated");
    Column {
        owner_schema: row.get("owner_schema"),
        owner_table: row.get("owner_table"),
        name: row.get("attname"),
        position: row.get::<_, i16>("attnum"),
        not_null: row.get("attnotnull"),
        formatted_type: row.get("formatted_type"),
        default_value: row.get("default_value"),
        generated: GeneratedKind::from_code(&attgenerated),
        generated_expression: row.get("generated_expression"),
        owner_oid: row.get::<_, u32>("owner_oid"),
        owner_kind: OwnerKind::Table,
    }
}

pub fn constraint_from_row(row: &Row) -> Result<Constraint, ExtractionError> {
    let contype: i8 = row.get::<_, i8>("contype");
    let kind = ConstraintKind::from_code(contype as u8 as char).ok_or_else(|| ExtractionError::MalformedRow {
        catalog: "pg_constraint",
        reason: format!("unrecognized contype '{}'", contype as u8 as char),
    })?;
    let columns: Vec<String> = row.get::<_, Option<Vec<String>>>("columns").unwrap_or_default();

    let foreign_key = if kind == ConstraintKind::ForeignKey {
        let confupdtype: i8 = row.get("confupdtype");
        let confdeltype: i8 = row.get("confdeltype");
        let confmatchtype: i8 = row.get("confmatchtype");
        Some(ForeignKeyDetail {
            ref_schema: row.get("ref_schema"),
            ref_table: row.get("ref_table"),
            ref_columns: row.get::<_, Option<Vec<String>>>("ref_columns").unwrap_or_default(),
            on_update: FkAction::from_code(confupdtype as u8 as char).ok_or_else(|| ExtractionError::MalformedRow {
                catalog: "pg_constraint",
                reason: format!("unrecognized confupdtype '{}'", confupdtype as u8 as char),
            })?,
            on_delete: FkAction::from_code(confdeltype as u8 as char).ok_or_else(|| ExtractionError::MalformedRow {
                catalog: "pg_constraint",
                reason: format!("unrecognized confdeltype '{}'", confdeltype as u8 as char),
            })?,
            match_type: FkMatchType::from_code(confmatchtype as u8 as char).ok_or_else(|| ExtractionError::MalformedRow {
                catalog: "pg_constraint",
                reason: format!("unrecognized confmatchtype '{}'", confmatchtype as u8 as char),
            })?,
        })
    } else {
        None
    };

    Ok(Constraint {
        schema: row.get("namespace_name"),
        table: row.get("table_name"),
        name: row.get("conname"),
        kind,
        columns,
        check_expression: row.get("check_expression"),
        foreign_key,
        deferrable: row.get("condeferrable"),
        initially_deferred: row.get("condeferred"),
        oid: row.get::<_, u32>("oid"),
        table_oid: row.get::<_, u32>("table_oid"),
    })
}

pub fn index_from_row(row: &Row) -> Index {
    Index {
        schema: row.get("namespace_name"),
        name: row.get("index_name"),
        table: row.get("table_name"),
        is_unique: row.get("indisunique"),
        is_primary: row.get("indisprimary"),
        is_constraint_backed: row.get("is_constraint_index"),
        definition: row.get("index_definition"),
        oid: row.get::<_, u32>("oid"),
        table_oid: row.get::<_, u32>("table_oid"),
    }
}

pub fn sequence_from_row(row: &Row) -> Sequence {
    Sequence {
        schema: row.get("namespace"),
        name: row.get("seqname"),
        data_type: row.get("data_type"),
        increment_by: row.get("increment_by"),
        min_value: row.get("min_value"),
        max_value: row.get("max_value"),
        start_value: row.get("start_value"),
        cache_size: row.get("cache_size"),
        cycle: row.get("cycle"),
        owned_by_table: row.get("owned_by_table"),
        owned_by_column: row.get("owned_by_column"),
        oid: row.get::<_, u32>("oid"),
    }
}

pub fn policy_from_row(row: &Row) -> Result<Policy, ExtractionError> {
    let polcmd: i8 = row.get::<_, i8>("polcmd");
    let command = PolicyCommand::from_code(polcmd as u8 as char).ok_or_else(|| ExtractionError::MalformedRow {
        catalog: "pg_policy",
        reason: format!("unrecognized polcmd '{}'", polcmd as u8 as char),
    })?;
    Ok(Policy {
        schema: row.get("namespace"),
        table: row.get("tablename"),
        name: row.get("polname"),
        command,
        permissive: row.get("polpermissive"),
        roles: row.get("polroles"),
        using_expr: row.get("polqual"),
        with_check_expr: row.get("polwithcheck"),
        oid: row.get::<_, u32>("oid"),
    })
}

pub fn function_from_row(row: &Row) -> Function {
    Function {
        schema: row.get("namespace"),
        name: row.get("proname"),
        arg_types: row.get::<_, Option<String>>("proargtypes").unwrap_or_default(),
        definition: row.get("function_definition"),
        oid: row.get::<_, u32>("oid"),
    }
}

pub fn trigger_from_row(row: &Row) -> Trigger {
    Trigger {
        schema: row.get("namespace"),
        table: row.get("table_name"),
        name: row.get("tgname"),
        definition: row.get("trigger_definition"),
        oid: row.get::<_, u32>("oid"),
        table_oid: row.get::<_, u32>("table_oid"),
        function_oid: row.get::<_, u32>("function_oid"),
    }
}

/// Everything needed to fill in `Type::kind` after the row's `typtype` has
/// been inspected; the per-kind sub-queries run separately (enum values,
/// domain constraints, composite attributes, range subtype) since they
/// have no common shape to join into one row.
pub struct TypeRow {
    pub schema: String,
    pub name: String,
    pub typtype: char,
    pub typbasetype: u32,
    pub typtypmod: i32,
    pub typrelid: u32,
    pub oid: u32,
}

pub fn type_row_from_row(row: &Row) -> TypeRow {
    let typtype: i8 = row.get::<_, i8>("typtype");
    TypeRow {
        schema: row.get("nspname"),
        name: row.get("typname"),
        typtype: typtype as u8 as char,
        typbasetype: row.get::<_, u32>("typbasetype"),
        typtypmod: row.get::<_, i32>("typtypmod"),
        typrelid: row.get::<_, u32>("typrelid"),
        oid: row.get::<_, u32>("oid"),
    }
}

pub const DOMAIN_BASE_TYPE_SQL: &str = "SELECT pg_catalog.format_type($1, $2) AS t";

pub fn finish_type(row: TypeRow, kind: TypeKind) -> Type {
    Type { schema: row.schema, name: row.name, kind, oid: row.oid }
}

pub fn composite_attribute_from_row(row: &Row) -> CompositeAttribute {
    CompositeAttribute {
        name: row.get("attname"),
        formatted_type: row.get("formatted_type"),
        position: row.get::<_, i16>("attnum"),
        not_null: row.get("attnotnull"),
    }
}

/// Build a `DependencyEdge`, substituting the `unknown.*` sentinel for
/// either endpoint the oid map can't resolve.
pub fn resolve_edge(
    classid_name: &str,
    objid: u32,
    refclassid_name: &str,
    refobjid: u32,
    resolve: impl Fn(&str, u32) -> Option<crate::ident::StableId>,
) -> DependencyEdge {
    let dependent = resolve(classid_name, objid)
        .unwrap_or_else(|| crate::ident::StableId::new(format!("unknown.{classid_name}.{objid}")));
    let referenced = resolve(refclassid_name, refobjid)
        .unwrap_or_else(|| crate::ident::StableId::new(format!("unknown.{refclassid_name}.{refobjid}")));
    DependencyEdge { dependent, referenced }
}
