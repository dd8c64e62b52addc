//! Database schema analyzer
//!
//! Reads table, column and foreign key metadata from a MySQL catalog.
//! Nothing here writes to the database.

use async_trait::async_trait;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::FromRow;

use crate::db::connection::DatabaseConnection;
use crate::error::Result;
use crate::schema::types::{ColumnDescriptor, ForeignKeyDescriptor, TableLookup, TableSnapshot};

/// Read access to one database's schema metadata
#[async_trait]
pub trait Introspector: Send + Sync {
    /// Base table names, in catalog order
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of a table keyed by name, or `None` if the table does not exist
    async fn get_columns(&self, table: &str) -> Result<Option<IndexMap<String, ColumnDescriptor>>>;

    /// Foreign keys defined on a table; empty if there are none
    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDescriptor>>;

    /// Columns and foreign keys of a table in one lookup
    async fn snapshot(&self, table: &str) -> Result<TableLookup> {
        let Some(columns) = self.get_columns(table).await? else {
            return Ok(TableLookup::NotFound);
        };

        Ok(TableLookup::Found(TableSnapshot {
            name: table.to_string(),
            columns,
            foreign_keys: self.get_foreign_keys(table).await?,
        }))
    }
}

/// Schema analyzer for MySQL databases
pub struct SchemaAnalyzer {
    connection: DatabaseConnection,
}

impl SchemaAnalyzer {
    /// Create a new schema analyzer
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

// information_schema columns are cast to CHAR so they decode as text on
// servers that report them with a binary collation.

#[derive(FromRow)]
struct TableRow {
    table_name: String,
}

#[derive(FromRow)]
struct ColumnRow {
    column_name: String,
    column_type: String,
    is_nullable: String,
    column_default: Option<String>,
    column_comment: Option<String>,
    extra: Option<String>,
}

#[derive(FromRow)]
struct ForeignKeyRow {
    constraint_name: String,
    column_name: String,
    ref_schema: String,
    ref_table: String,
    ref_column: String,
    delete_rule: String,
    update_rule: String,
}

#[async_trait]
impl Introspector for SchemaAnalyzer {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let sql = r#"
            SELECT CAST(table_name AS CHAR) AS table_name
            FROM information_schema.tables
            WHERE table_schema = ?
              AND table_type = 'BASE TABLE'
        "#;

        let rows = sqlx::query_as::<_, TableRow>(sql)
            .bind(self.connection.schema())
            .fetch_all(self.connection.pool())
            .await?;

        Ok(rows.into_iter().map(|r| r.table_name).collect())
    }

    async fn get_columns(&self, table: &str) -> Result<Option<IndexMap<String, ColumnDescriptor>>> {
        let sql = r#"
            SELECT
                CAST(column_name AS CHAR) AS column_name,
                CAST(column_type AS CHAR) AS column_type,
                CAST(is_nullable AS CHAR) AS is_nullable,
                CAST(column_default AS CHAR) AS column_default,
                CAST(column_comment AS CHAR) AS column_comment,
                CAST(extra AS CHAR) AS extra
            FROM information_schema.columns
            WHERE table_schema = ? AND table_name = ?
            ORDER BY ordinal_position
        "#;

        let rows = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(self.connection.schema())
            .bind(table)
            .fetch_all(self.connection.pool())
            .await?;

        // A MySQL table always has at least one column.
        if rows.is_empty() {
            return Ok(None);
        }

        let columns = rows
            .into_iter()
            .map(|row| {
                let extra = row.extra.unwrap_or_default();
                let column = ColumnDescriptor {
                    default: render_default(row.column_default.as_deref(), &extra),
                    comment: row.column_comment.filter(|c| !c.is_empty()),
                    nullable: row.is_nullable.eq_ignore_ascii_case("YES"),
                    data_type: row.column_type,
                    name: row.column_name,
                };
                (column.name.clone(), column)
            })
            .collect();

        Ok(Some(columns))
    }

    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDescriptor>> {
        let sql = r#"
            SELECT
                CAST(kcu.constraint_name AS CHAR) AS constraint_name,
                CAST(kcu.column_name AS CHAR) AS column_name,
                CAST(kcu.referenced_table_schema AS CHAR) AS ref_schema,
                CAST(kcu.referenced_table_name AS CHAR) AS ref_table,
                CAST(kcu.referenced_column_name AS CHAR) AS ref_column,
                CAST(rc.delete_rule AS CHAR) AS delete_rule,
                CAST(rc.update_rule AS CHAR) AS update_rule
            FROM information_schema.key_column_usage kcu
            JOIN information_schema.referential_constraints rc
              ON rc.constraint_schema = kcu.constraint_schema
             AND rc.constraint_name = kcu.constraint_name
             AND rc.table_name = kcu.table_name
            WHERE kcu.table_schema = ?
              AND kcu.table_name = ?
              AND kcu.referenced_table_name IS NOT NULL
            ORDER BY kcu.constraint_name, kcu.ordinal_position
        "#;

        let rows = sqlx::query_as::<_, ForeignKeyRow>(sql)
            .bind(self.connection.schema())
            .bind(table)
            .fetch_all(self.connection.pool())
            .await?;

        Ok(group_foreign_keys(rows, self.connection.schema()))
    }
}

/// Fold per-column key rows into one descriptor per constraint
///
/// The referenced schema is kept only when it differs from `schema`.
fn group_foreign_keys(rows: Vec<ForeignKeyRow>, schema: &str) -> Vec<ForeignKeyDescriptor> {
    let mut foreign_keys: IndexMap<String, ForeignKeyDescriptor> = IndexMap::new();

    for row in rows {
        let fk = foreign_keys
            .entry(row.constraint_name.clone())
            .or_insert_with(|| ForeignKeyDescriptor {
                name: row.constraint_name,
                columns: Vec::new(),
                ref_schema: (row.ref_schema != schema).then_some(row.ref_schema),
                ref_table: row.ref_table,
                ref_columns: Vec::new(),
                on_delete: referential_action(&row.delete_rule),
                on_update: referential_action(&row.update_rule),
            });
        fk.columns.push(row.column_name);
        fk.ref_columns.push(row.ref_column);
    }

    foreign_keys.into_values().collect()
}

/// `NO ACTION` is what MySQL reports when no rule was declared.
fn referential_action(rule: &str) -> Option<String> {
    let rule = rule.trim();
    if rule.is_empty() || rule.eq_ignore_ascii_case("NO ACTION") {
        None
    } else {
        Some(rule.to_ascii_uppercase())
    }
}

static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid numeric literal pattern")
});

/// Turn a raw `COLUMN_DEFAULT` into an SQL expression
///
/// MySQL stores string defaults unquoted, so anything that is not a number,
/// bit literal, timestamp keyword or generated expression is quoted. MariaDB
/// reports literals already quoted; those are passed through.
fn render_default(raw: Option<&str>, extra: &str) -> Option<String> {
    let raw = raw?;
    let upper = raw.to_ascii_uppercase();

    if upper == "NULL" && !extra.to_ascii_uppercase().contains("DEFAULT_GENERATED") {
        return None;
    }

    let is_timestamp_keyword = upper.starts_with("CURRENT_TIMESTAMP")
        || upper.starts_with("NOW(")
        || upper.starts_with("LOCALTIMESTAMP");

    if is_timestamp_keyword {
        return Some(raw.to_string());
    }

    if extra.to_ascii_uppercase().contains("DEFAULT_GENERATED") {
        return Some(format!("({raw})"));
    }

    let is_bit_literal = (raw.starts_with("b'") || raw.starts_with("0x")) && raw.len() > 2;
    if is_bit_literal || NUMERIC_LITERAL.is_match(raw) {
        return Some(raw.to_string());
    }

    let is_quoted_literal = raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'');
    if is_quoted_literal {
        return Some(raw.to_string());
    }

    Some(crate::utils::text::quote_literal(raw))
}
