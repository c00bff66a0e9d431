//! Non-blocking extraction via the `tokio-postgres` crate.

use tokio_postgres::Client;

use super::{queries, RawCatalog, RawDepend};
use crate::entity::pg_type::{CompositeAttribute, TypeKind};
use crate::error::ExtractionError;
use crate::snapshot::Snapshot;

async fn query(client: &Client, catalog: &'static str, sql: &str) -> Result<Vec<tokio_postgres::Row>, ExtractionError> {
    client
        .query(sql, &[])
        .await
        .map_err(|e| ExtractionError::Query { catalog, source: Box::new(e) })
}

/// Extract a full catalog snapshot over an async connection.
pub async fn extract(client: &Client) -> Result<Snapshot, ExtractionError> {
    client
        .batch_execute(queries::SET_EMPTY_SEARCH_PATH)
        .await
        .map_err(|e| ExtractionError::Query { catalog: "search_path", source: Box::new(e) })?;

    let mut raw = RawCatalog::default();

    raw.schemas = query(client, "pg_namespace", &queries::namespaces_sql())
        .await?
        .iter()
        .map(queries::schema_from_row)
        .collect();
    raw.tables = query(client, "pg_class", &queries::tables_sql())
        .await?
        .iter()
        .map(queries::table_from_row)
        .collect();
    raw.views = query(client, "pg_class", &queries::views_sql('v'))
        .await?
        .iter()
        .map(queries::view_from_row)
        .collect();
    raw.materialized_views = query(client, "pg_class", &queries::views_sql('m'))
        .await?
        .iter()
        .map(queries::materialized_view_from_row)
        .collect();
    raw.columns = query(client, "pg_attribute", &queries::columns_sql())
        .await?
        .iter()
        .map(queries::column_from_row)
        .collect();
    raw.constraints = query(client, "pg_constraint", &queries::constraints_sql())
        .await?
        .iter()
        .map(queries::constraint_from_row)
        .collect::<Result<_, _>>()?;
    raw.indexes = query(client, "pg_index", &queries::indexes_sql())
        .await?
        .iter()
        .map(queries::index_from_row)
        .collect();
    raw.sequences = query(client, "pg_sequence", &queries::sequences_sql())
        .await?
        .iter()
        .map(queries::sequence_from_row)
        .collect();
    raw.policies = query(client, "pg_policy", &queries::policies_sql())
        .await?
        .iter()
        .map(queries::policy_from_row)
        .collect::<Result<_, _>>()?;
    raw.functions = query(client, "pg_proc", &queries::functions_sql())
        .await?
        .iter()
        .map(queries::function_from_row)
        .collect();
    raw.triggers = query(client, "pg_trigger", &queries::triggers_sql())
        .await?
        .iter()
        .map(queries::trigger_from_row)
        .collect();

    for row in query(client, "pg_type", &queries::types_sql()).await? {
        let type_row = queries::type_row_from_row(&row);
        let kind = match type_row.typtype {
            'e' => {
                let values = client
                    .query(queries::ENUM_VALUES_SQL, &[&type_row.oid])
                    .await
                    .map_err(|e| ExtractionError::Query { catalog: "pg_enum", source: Box::new(e) })?
                    .iter()
                    .map(|r| r.get::<_, String>("enumlabel"))
                    .collect();
                TypeKind::Enum { values }
            }
            'd' => {
                let base_type = client
                    .query_one(queries::DOMAIN_BASE_TYPE_SQL, &[&type_row.typbasetype, &type_row.typtypmod])
                    .await
                    .map_err(|e| ExtractionError::Query { catalog: "pg_type", source: Box::new(e) })?
                    .get::<_, String>("t");
                let constraints = client
                    .query(queries::DOMAIN_CONSTRAINTS_SQL, &[&type_row.oid])
                    .await
                    .map_err(|e| ExtractionError::Query { catalog: "pg_constraint", source: Box::new(e) })?
                    .iter()
                    .filter_map(|r| r.get::<_, Option<String>>("expr"))
                    .collect();
                TypeKind::Domain { base_type, constraints }
            }
            'c' => {
                let attributes: Vec<CompositeAttribute> = client
                    .query(queries::COMPOSITE_ATTRIBUTES_SQL, &[&type_row.typrelid])
                    .await
                    .map_err(|e| ExtractionError::Query { catalog: "pg_attribute", source: Box::new(e) })?
                    .iter()
                    .map(queries::composite_attribute_from_row)
                    .collect();
                TypeKind::Composite { attributes }
            }
            'r' => {
                let subtype = client
                    .query_one(queries::RANGE_SUBTYPE_SQL, &[&type_row.oid])
                    .await
                    .map_err(|e| ExtractionError::Query { catalog: "pg_range", source: Box::new(e) })?
                    .get::<_, String>("subtype");
                TypeKind::Range { subtype }
            }
            other => {
                return Err(ExtractionError::MalformedRow {
                    catalog: "pg_type",
                    reason: format!("unexpected typtype '{other}'"),
                })
            }
        };
        raw.types.push(queries::finish_type(type_row, kind));
    }

    for row in query(client, "pg_depend", &queries::depends_sql()).await? {
        raw.depends.push(RawDepend {
            classid_name: row.get("classid_name"),
            objid: row.get::<_, u32>("objid"),
            refclassid_name: row.get("refclassid_name"),
            refobjid: row.get::<_, u32>("refobjid"),
        });
    }
    for row in query(client, "pg_rewrite", &queries::view_depends_sql()).await? {
        raw.view_depends.push((row.get::<_, u32>("view_oid"), row.get::<_, u32>("refobjid")));
    }

    Ok(super::assemble(raw))
}
