//! End-to-end sync runs against in-memory databases

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use db_schema_sync::config::parse_config;
use db_schema_sync::db::dump::extract_create_table;
use db_schema_sync::schema::{ColumnDescriptor, ForeignKeyDescriptor, TableSnapshot};
use db_schema_sync::{
    ArtifactKind, ArtifactWriter, ConnectionProfile, DumpTool, Error, Introspector, Result,
    SyncEngine, SyncSummary,
};

const RUN_ID: &str = "2024-03-07";

struct MemoryDb {
    tables: Vec<TableSnapshot>,
}

impl MemoryDb {
    fn new(tables: Vec<TableSnapshot>) -> Self {
        Self { tables }
    }

    fn table(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[async_trait]
impl Introspector for MemoryDb {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn get_columns(&self, table: &str) -> Result<Option<IndexMap<String, ColumnDescriptor>>> {
        Ok(self.table(table).map(|t| t.columns.clone()))
    }

    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDescriptor>> {
        Ok(self
            .table(table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }
}

/// Canned dump output per table; tables without output fail like a broken dump
struct CannedDump {
    outputs: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl CannedDump {
    fn new(outputs: &[(&str, &str)]) -> Self {
        Self {
            outputs: outputs
                .iter()
                .map(|(t, o)| (t.to_string(), o.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DumpTool for CannedDump {
    fn extract_create_statement(&self, profile: &ConnectionProfile, table: &str) -> Result<String> {
        assert_eq!(profile.host, "db-new", "dump must read the new database");
        self.calls.lock().unwrap().push(table.to_string());

        let output = self.outputs.get(table).map(String::as_str).unwrap_or(
            "mysqldump: Couldn't find table\n",
        );
        extract_create_table(output, table)
    }
}

fn new_profile() -> ConnectionProfile {
    parse_config(
        r#"
new_db: { host: db-new, user: sync, password: pw, db: shop }
old_db: { host: db-old, user: sync, password: pw, db: shop }
"#,
        "sync.yml",
    )
    .unwrap()
    .new_db
}

fn table(name: &str, columns: &[&str]) -> TableSnapshot {
    columns.iter().fold(TableSnapshot::new(name), |t, c| {
        t.with_column(ColumnDescriptor::new(c, "int"))
    })
}

fn read(writer: &ArtifactWriter, kind: ArtifactKind) -> String {
    fs::read_to_string(writer.path(kind)).unwrap_or_default()
}

async fn sync(
    new_db: &MemoryDb,
    old_db: &MemoryDb,
    dump: &CannedDump,
    root: &Path,
) -> (Result<SyncSummary>, ArtifactWriter) {
    let profile = new_profile();
    let writer = ArtifactWriter::new(root, RUN_ID);
    let result = SyncEngine::new(new_db, old_db, dump, &profile, &writer)
        .run()
        .await;
    (result, writer)
}

const ORDERS_DUMP: &str = "-- MySQL dump 10.13\n\
DROP TABLE IF EXISTS `orders`;\n\
CREATE TABLE `orders` (\n\
  `id` int NOT NULL,\n\
  `user_id` int NOT NULL,\n\
  PRIMARY KEY (`id`)\n\
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;\n";

#[tokio::test]
async fn identical_schemas_write_nothing() {
    let root = tempdir().unwrap();
    let schema = vec![table("users", &["id", "name"]), table("orders", &["id"])];
    let new_db = MemoryDb::new(schema.clone());
    let old_db = MemoryDb::new(schema);
    let dump = CannedDump::new(&[]);

    let (summary, writer) = sync(&new_db, &old_db, &dump, root.path()).await;
    let summary = summary.unwrap();

    assert!(summary.is_in_sync());
    assert_eq!(summary.tables_inspected, 2);
    assert!(!writer.run_dir().exists());
    assert!(dump.calls().is_empty());
}

#[tokio::test]
async fn missing_table_and_column() {
    let root = tempdir().unwrap();
    let new_db = MemoryDb::new(vec![
        TableSnapshot::new("users")
            .with_column(ColumnDescriptor::new("id", "int"))
            .with_column(ColumnDescriptor::new("name", "varchar(64)"))
            .with_column(
                ColumnDescriptor::new("email", "varchar(255)")
                    .nullable(true)
                    .comment("contact address"),
            ),
        table("orders", &["id", "user_id"]),
    ]);
    let old_db = MemoryDb::new(vec![TableSnapshot::new("users")
        .with_column(ColumnDescriptor::new("id", "int"))
        .with_column(ColumnDescriptor::new("name", "varchar(64)"))]);
    let dump = CannedDump::new(&[("orders", ORDERS_DUMP)]);

    let (summary, writer) = sync(&new_db, &old_db, &dump, root.path()).await;
    let summary = summary.unwrap();

    assert_eq!(summary.missing_tables, 1);
    assert_eq!(summary.missing_columns, 1);
    assert_eq!(dump.calls(), vec!["orders"]);

    assert_eq!(
        read(&writer, ArtifactKind::NewColumns),
        "ALTER TABLE `users` ADD COLUMN `email` varchar(255) NULL COMMENT 'contact address';\n"
    );
    assert_eq!(
        read(&writer, ArtifactKind::UndoColumns),
        "ALTER TABLE `users` DROP COLUMN `email`;\n"
    );
    assert_eq!(
        read(&writer, ArtifactKind::NewTables),
        "CREATE TABLE `orders` (`id` int NOT NULL,`user_id` int NOT NULL,PRIMARY KEY (`id`)) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;\n"
    );
    assert_eq!(
        read(&writer, ArtifactKind::UndoTables),
        "DROP TABLE IF EXISTS `orders`;\n"
    );
}

#[tokio::test]
async fn foreign_key_column_gets_its_constraint() {
    let root = tempdir().unwrap();
    let employees = TableSnapshot::new("employees")
        .with_column(ColumnDescriptor::new("id", "int"))
        .with_column(ColumnDescriptor::new("dept_id", "int").nullable(true))
        .with_foreign_key(
            ForeignKeyDescriptor::new("fk_employees_dept", "departments")
                .column("dept_id", "id")
                .on_delete("CASCADE"),
        );
    let new_db = MemoryDb::new(vec![table("departments", &["id"]), employees]);
    let old_db = MemoryDb::new(vec![
        table("departments", &["id"]),
        table("employees", &["id"]),
    ]);
    let dump = CannedDump::new(&[]);

    let (summary, writer) = sync(&new_db, &old_db, &dump, root.path()).await;
    let summary = summary.unwrap();

    assert_eq!(summary.missing_columns, 1);
    assert_eq!(summary.missing_tables, 0);

    let forward: Vec<String> = read(&writer, ArtifactKind::NewColumns)
        .lines()
        .map(String::from)
        .collect();
    assert_eq!(
        forward,
        vec![
            "ALTER TABLE `employees` ADD COLUMN `dept_id` int NULL COMMENT '';",
            "ALTER TABLE `employees` ADD CONSTRAINT `fk_employees_dept` FOREIGN KEY (`dept_id`) REFERENCES `departments`(`id`) ON DELETE CASCADE;",
        ]
    );
    assert_eq!(
        read(&writer, ArtifactKind::UndoColumns),
        "ALTER TABLE `employees` DROP FOREIGN KEY `fk_employees_dept`;\nALTER TABLE `employees` DROP COLUMN `dept_id`;\n"
    );
}

#[tokio::test]
async fn old_only_objects_are_never_reported() {
    let root = tempdir().unwrap();
    let new_db = MemoryDb::new(vec![table("users", &["id"])]);
    let old_db = MemoryDb::new(vec![
        table("users", &["id", "legacy_flag"]),
        table("audit_log", &["id"]),
    ]);
    let dump = CannedDump::new(&[]);

    let (summary, writer) = sync(&new_db, &old_db, &dump, root.path()).await;

    assert!(summary.unwrap().is_in_sync());
    assert!(writer.written().is_empty());
}

#[tokio::test]
async fn columns_are_written_in_lexical_order() {
    let root = tempdir().unwrap();
    let new_db = MemoryDb::new(vec![table("users", &["id", "zip", "city", "age"])]);
    let old_db = MemoryDb::new(vec![table("users", &["id"])]);
    let dump = CannedDump::new(&[]);

    let (summary, writer) = sync(&new_db, &old_db, &dump, root.path()).await;

    assert_eq!(summary.unwrap().missing_columns, 3);
    assert_eq!(
        read(&writer, ArtifactKind::UndoColumns),
        "ALTER TABLE `users` DROP COLUMN `age`;\nALTER TABLE `users` DROP COLUMN `city`;\nALTER TABLE `users` DROP COLUMN `zip`;\n"
    );
    assert_eq!(read(&writer, ArtifactKind::NewColumns).lines().count(), 3);
}

#[tokio::test]
async fn rerunning_unchanged_schemas_appends_nothing() {
    let root = tempdir().unwrap();
    let schema = vec![table("users", &["id", "name"])];
    let new_db = MemoryDb::new(schema.clone());
    let old_db = MemoryDb::new(schema);
    let dump = CannedDump::new(&[]);

    for _ in 0..2 {
        let (summary, writer) = sync(&new_db, &old_db, &dump, root.path()).await;
        assert!(summary.unwrap().is_in_sync());
        assert!(writer.written().is_empty());
    }
}

#[tokio::test]
async fn rerunning_with_differences_appends_duplicates() {
    let root = tempdir().unwrap();
    let new_db = MemoryDb::new(vec![table("users", &["id", "email"])]);
    let old_db = MemoryDb::new(vec![table("users", &["id"])]);
    let dump = CannedDump::new(&[]);

    sync(&new_db, &old_db, &dump, root.path()).await.0.unwrap();
    let (_, writer) = sync(&new_db, &old_db, &dump, root.path()).await;

    assert_eq!(
        read(&writer, ArtifactKind::UndoColumns),
        "ALTER TABLE `users` DROP COLUMN `email`;\nALTER TABLE `users` DROP COLUMN `email`;\n"
    );
}

#[tokio::test]
async fn failed_dump_skips_only_that_table() {
    let root = tempdir().unwrap();
    let new_db = MemoryDb::new(vec![
        table("broken", &["id"]),
        table("orders", &["id", "user_id"]),
        table("users", &["id", "email"]),
    ]);
    let old_db = MemoryDb::new(vec![table("users", &["id"])]);
    let dump = CannedDump::new(&[("orders", ORDERS_DUMP)]);

    let (summary, writer) = sync(&new_db, &old_db, &dump, root.path()).await;
    let summary = summary.unwrap();

    assert_eq!(dump.calls(), vec!["broken", "orders"]);
    assert_eq!(summary.missing_tables, 1);
    assert_eq!(summary.missing_columns, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].0, "broken");
    assert!(summary.skipped[0].1.contains("no CREATE TABLE"));

    assert_eq!(
        read(&writer, ArtifactKind::UndoTables),
        "DROP TABLE IF EXISTS `orders`;\n"
    );
    assert_eq!(read(&writer, ArtifactKind::NewTables).lines().count(), 1);
}

#[tokio::test]
async fn one_create_and_one_drop_per_missing_table() {
    let root = tempdir().unwrap();
    let invoices_dump = "CREATE TABLE `invoices` (\n  `id` int NOT NULL\n) ENGINE=InnoDB;\n";
    let new_db = MemoryDb::new(vec![
        table("orders", &["id"]),
        table("invoices", &["id"]),
    ]);
    let old_db = MemoryDb::new(Vec::new());
    let dump = CannedDump::new(&[("orders", ORDERS_DUMP), ("invoices", invoices_dump)]);

    let (summary, writer) = sync(&new_db, &old_db, &dump, root.path()).await;

    assert_eq!(summary.unwrap().missing_tables, 2);
    assert_eq!(
        read(&writer, ArtifactKind::UndoTables),
        "DROP TABLE IF EXISTS `orders`;\nDROP TABLE IF EXISTS `invoices`;\n"
    );
    let creates = read(&writer, ArtifactKind::NewTables);
    assert_eq!(creates.lines().count(), 2);
    assert!(creates.lines().all(|l| l.starts_with("CREATE TABLE") && l.ends_with(';')));
    assert!(!writer.path(ArtifactKind::NewColumns).exists());
}

#[tokio::test]
async fn unwritable_output_aborts_the_run() {
    let root = tempdir().unwrap();
    let blocker = root.path().join("sql");
    fs::write(&blocker, "not a directory").unwrap();

    let new_db = MemoryDb::new(vec![table("users", &["id", "email"])]);
    let old_db = MemoryDb::new(vec![table("users", &["id"])]);
    let dump = CannedDump::new(&[]);

    let (result, _) = sync(&new_db, &old_db, &dump, &blocker).await;

    assert!(matches!(result, Err(Error::FileWriteFailure { .. })));
}
