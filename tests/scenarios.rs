//! End-to-end scenarios built from hand-constructed snapshots, no live
//! database involved.

use pgdelta::change::Change;
use pgdelta::entity::column::{Column, OwnerKind};
use pgdelta::entity::constraint::{Constraint, ConstraintKind};
use pgdelta::entity::pg_type::Type;
use pgdelta::entity::policy::Policy;
use pgdelta::entity::schema::Schema;
use pgdelta::entity::sequence::Sequence;
use pgdelta::entity::table::Table;
use pgdelta::entity::view::{MaterializedView, View};
use pgdelta::entity::{GeneratedKind, PolicyCommand};
use pgdelta::ident::{constraint_id, sequence_id, table_id};
use pgdelta::snapshot::DependencyEdge;
use pgdelta::{diff, emit, Snapshot};

fn column(name: &str, position: i16, ty: &str, not_null: bool) -> Column {
    Column {
        owner_schema: "s".into(),
        owner_table: "users".into(),
        name: name.into(),
        position,
        not_null,
        formatted_type: ty.into(),
        default_value: None,
        generated: GeneratedKind::NotGenerated,
        generated_expression: None,
        owner_oid: 1,
        owner_kind: OwnerKind::Table,
    }
}

fn render(changes: &[Change]) -> String {
    changes.iter().map(|c| emit(c).unwrap()).collect::<Vec<_>>().join("\n")
}

#[test]
fn empty_to_empty_yields_no_changes() {
    let changes = diff(&Snapshot::new(), &Snapshot::new()).unwrap();
    assert!(changes.is_empty());
}

#[test]
fn schema_and_table_creation_orders_schema_before_table() {
    let master = Snapshot::new();
    let mut branch = Snapshot::new();
    branch.add_schema(Schema { name: "test_schema".into(), oid: 1 });
    branch.add_table(Table { schema: "test_schema".into(), name: "users".into(), row_level_security: false, oid: 2 });
    branch.add_column(Column {
        owner_schema: "test_schema".into(),
        owner_table: "users".into(),
        name: "id".into(),
        position: 1,
        not_null: false,
        formatted_type: "integer".into(),
        default_value: None,
        generated: GeneratedKind::NotGenerated,
        generated_expression: None,
        owner_oid: 2,
        owner_kind: OwnerKind::Table,
    });
    branch.add_column(Column {
        owner_schema: "test_schema".into(),
        owner_table: "users".into(),
        name: "name".into(),
        position: 2,
        not_null: true,
        formatted_type: "text".into(),
        default_value: None,
        generated: GeneratedKind::NotGenerated,
        generated_expression: None,
        owner_oid: 2,
        owner_kind: OwnerKind::Table,
    });

    let changes = diff(&master, &branch).unwrap();
    let schema_pos = changes.iter().position(|c| matches!(c, Change::CreateSchema { .. })).unwrap();
    let table_pos = changes.iter().position(|c| matches!(c, Change::CreateTable { .. })).unwrap();
    assert!(schema_pos < table_pos);

    let sql = render(&changes);
    assert!(sql.contains("CREATE SCHEMA \"test_schema\";"));
    assert!(sql.contains("CREATE TABLE \"test_schema\".\"users\""));
    assert!(sql.contains("\"id\" integer"));
    assert!(sql.contains("\"name\" text NOT NULL"));
}

#[test]
fn add_not_null_column_with_default() {
    let mut master = Snapshot::new();
    master.add_table(Table { schema: "s".into(), name: "users".into(), row_level_security: false, oid: 1 });
    master.add_column(column("id", 1, "integer", true));

    let mut branch = master.clone();
    let mut email = column("email", 2, "character varying(255)", true);
    email.default_value = Some("'x@y'".into());
    branch.add_column(email);

    let changes = diff(&master, &branch).unwrap();
    let sql = render(&changes);
    assert_eq!(
        sql,
        "ALTER TABLE \"s\".\"users\" ADD COLUMN \"email\" character varying(255) NOT NULL DEFAULT 'x@y';"
    );
}

#[test]
fn serial_primary_key_creation_order() {
    let master = Snapshot::new();
    let mut branch = Snapshot::new();
    branch.add_schema(Schema { name: "s".into(), oid: 1 });
    branch.add_table(Table { schema: "s".into(), name: "users".into(), row_level_security: false, oid: 2 });
    branch.add_column(Column {
        owner_schema: "s".into(),
        owner_table: "users".into(),
        name: "id".into(),
        position: 1,
        not_null: true,
        formatted_type: "integer".into(),
        default_value: Some("nextval('s.users_id_seq'::regclass)".into()),
        generated: GeneratedKind::NotGenerated,
        generated_expression: None,
        owner_oid: 2,
        owner_kind: OwnerKind::Table,
    });
    branch.add_sequence(Sequence {
        schema: "s".into(),
        name: "users_id_seq".into(),
        data_type: "integer".into(),
        increment_by: 1,
        min_value: Some(1),
        max_value: None,
        start_value: 1,
        cache_size: 1,
        cycle: false,
        owned_by_table: Some("users".into()),
        owned_by_column: Some("id".into()),
        oid: 3,
    });
    branch.add_constraint(Constraint {
        schema: "s".into(),
        table: "users".into(),
        name: "users_pkey".into(),
        kind: ConstraintKind::PrimaryKey,
        columns: vec!["id".into()],
        check_expression: None,
        foreign_key: None,
        deferrable: false,
        initially_deferred: false,
        oid: 4,
        table_oid: 2,
    });

    let seq_id = sequence_id("s", "users_id_seq");
    let tbl_id = table_id("s", "users");
    let pk_id = constraint_id("s", "users", "users_pkey");
    branch.depends.push(DependencyEdge { dependent: seq_id.clone(), referenced: tbl_id.clone() });
    branch.depends.push(DependencyEdge { dependent: pk_id.clone(), referenced: tbl_id.clone() });

    let changes = diff(&master, &branch).unwrap();
    let seq_pos = changes.iter().position(|c| matches!(c, Change::CreateSequence { .. })).unwrap();
    let table_pos = changes.iter().position(|c| matches!(c, Change::CreateTable { .. })).unwrap();
    let pk_pos = changes.iter().position(|c| matches!(c, Change::CreateConstraint { .. })).unwrap();
    assert!(seq_pos < table_pos);
    assert!(table_pos < pk_pos);

    let sql = render(&changes);
    assert!(sql.contains("CREATE SEQUENCE"));
    assert!(sql.contains("CREATE TABLE"));
    assert!(sql.contains("ADD CONSTRAINT \"users_pkey\" PRIMARY KEY (\"id\")"));
}

#[test]
fn view_depending_on_view_orders_the_base_view_first() {
    let master = Snapshot::new();
    let mut branch = Snapshot::new();
    branch.add_table(Table { schema: "s".into(), name: "base".into(), row_level_security: false, oid: 1 });
    let v1 = View {
        schema: "s".into(),
        name: "v1".into(),
        definition: "CREATE VIEW \"s\".\"v1\" AS\nSELECT id FROM s.base".into(),
        oid: 2,
    };
    let v2 = View {
        schema: "s".into(),
        name: "v2".into(),
        definition: "CREATE VIEW \"s\".\"v2\" AS\nSELECT * FROM s.v1".into(),
        oid: 3,
    };
    branch.add_view(v1);
    branch.add_view(v2);
    branch.depends.push(DependencyEdge {
        dependent: pgdelta::ident::view_id("s", "v2"),
        referenced: pgdelta::ident::view_id("s", "v1"),
    });

    let changes = diff(&master, &branch).unwrap();
    let v1_pos = changes
        .iter()
        .position(|c| matches!(c, Change::CreateView { view } if view.name == "v1"))
        .unwrap();
    let v2_pos = changes
        .iter()
        .position(|c| matches!(c, Change::CreateView { view } if view.name == "v2"))
        .unwrap();
    assert!(v1_pos < v2_pos);
}

#[test]
fn policy_rename_only_emits_single_rename() {
    let mut master = Snapshot::new();
    master.add_policy(Policy {
        schema: "s".into(),
        table: "posts".into(),
        name: "read_posts".into(),
        command: PolicyCommand::Select,
        permissive: true,
        roles: vec!["authenticated".into()],
        using_expr: Some("true".into()),
        with_check_expr: None,
        oid: 1,
    });

    let mut branch = Snapshot::new();
    branch.add_policy(Policy {
        schema: "s".into(),
        table: "posts".into(),
        name: "read_posts_v2".into(),
        command: PolicyCommand::Select,
        permissive: true,
        roles: vec!["authenticated".into()],
        using_expr: Some("true".into()),
        with_check_expr: None,
        oid: 1,
    });

    let changes = diff(&master, &branch).unwrap();
    assert_eq!(changes.len(), 1);
    assert!(matches!(&changes[0], Change::RenamePolicyTo { old_name, new_name, .. }
        if old_name == "read_posts" && new_name == "read_posts_v2"));

    let sql = render(&changes);
    assert_eq!(sql, "ALTER POLICY \"read_posts\" ON \"s\".\"posts\" RENAME TO \"read_posts_v2\";");
}

#[test]
fn materialized_view_definition_change_is_drop_then_create_with_no_data() {
    let mut master = Snapshot::new();
    master.add_materialized_view(MaterializedView {
        schema: "analytics".into(),
        name: "monthly_sales".into(),
        definition: "CREATE MATERIALIZED VIEW \"analytics\".\"monthly_sales\" AS SELECT 1".into(),
        oid: 1,
    });

    let mut branch = Snapshot::new();
    branch.add_materialized_view(MaterializedView {
        schema: "analytics".into(),
        name: "monthly_sales".into(),
        definition: "CREATE MATERIALIZED VIEW \"analytics\".\"monthly_sales\" AS SELECT 2".into(),
        oid: 1,
    });

    let changes = diff(&master, &branch).unwrap();
    assert_eq!(changes.len(), 1);
    assert!(matches!(&changes[0], Change::ReplaceMaterializedView { .. }));

    let sql = render(&changes);
    let mut lines = sql.lines();
    assert_eq!(lines.next().unwrap(), "DROP MATERIALIZED VIEW \"analytics\".\"monthly_sales\";");
    assert_eq!(
        lines.next().unwrap(),
        "CREATE MATERIALIZED VIEW \"analytics\".\"monthly_sales\" AS SELECT 2 WITH NO DATA;"
    );
}

#[test]
fn no_op_diff_of_identical_catalog_is_empty() {
    let mut snap = Snapshot::new();
    snap.add_schema(Schema { name: "s".into(), oid: 1 });
    snap.add_table(Table { schema: "s".into(), name: "users".into(), row_level_security: false, oid: 2 });
    snap.add_column(column("id", 1, "integer", true));
    snap.add_type(Type {
        schema: "s".into(),
        name: "mood".into(),
        kind: pgdelta::entity::pg_type::TypeKind::Enum { values: vec!["happy".into(), "sad".into()] },
        oid: 3,
    });
    assert!(diff(&snap, &snap).unwrap().is_empty());
}
