//! DDL statement generator
//!
//! Every statement is built as a typed [`Statement`] and validated when it is
//! rendered, so a malformed statement is an error instead of a line in an
//! output file.

use crate::error::{Error, Result};
use crate::schema::types::{ColumnDescriptor, ForeignKeyDescriptor, TableSnapshot};
use crate::utils::text::{column_list, escape_literal, quote_identifier};

/// A single DDL statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    AddColumn {
        table: String,
        column: ColumnDescriptor,
    },
    DropColumn {
        table: String,
        column: String,
    },
    AddForeignKey {
        table: String,
        foreign_key: ForeignKeyDescriptor,
    },
    DropForeignKey {
        table: String,
        name: String,
    },
    /// A `CREATE TABLE` taken verbatim from the dump utility
    CreateTableFromRaw {
        table: String,
        sql: String,
    },
    DropTable {
        table: String,
    },
}

impl Statement {
    /// Validate and render the statement, terminated by `;`
    pub fn render(&self) -> Result<String> {
        self.validate()?;

        let sql = match self {
            Statement::AddColumn { table, column } => {
                let mut parts = vec![
                    format!(
                        "ALTER TABLE {} ADD COLUMN {}",
                        quote_identifier(table),
                        quote_identifier(&column.name)
                    ),
                    column.data_type.clone(),
                    (if column.nullable { "NULL" } else { "NOT NULL" }).to_string(),
                ];
                if let Some(default) = &column.default {
                    parts.push(format!("DEFAULT {}", default));
                }
                parts.push(format!(
                    "COMMENT '{}'",
                    escape_literal(column.comment.as_deref().unwrap_or(""))
                ));
                format!("{};", parts.join(" "))
            }
            Statement::DropColumn { table, column } => {
                format!(
                    "ALTER TABLE {} DROP COLUMN {};",
                    quote_identifier(table),
                    quote_identifier(column)
                )
            }
            Statement::AddForeignKey { table, foreign_key: fk } => {
                let mut sql = format!(
                    "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
                    quote_identifier(table),
                    quote_identifier(&fk.name),
                    column_list(&fk.columns),
                    referenced_table(fk),
                    column_list(&fk.ref_columns)
                );
                if let Some(action) = &fk.on_delete {
                    sql.push_str(&format!(" ON DELETE {}", action));
                }
                if let Some(action) = &fk.on_update {
                    sql.push_str(&format!(" ON UPDATE {}", action));
                }
                sql.push(';');
                sql
            }
            Statement::DropForeignKey { table, name } => {
                format!(
                    "ALTER TABLE {} DROP FOREIGN KEY {};",
                    quote_identifier(table),
                    quote_identifier(name)
                )
            }
            Statement::CreateTableFromRaw { sql, .. } => sql.trim().to_string(),
            Statement::DropTable { table } => {
                format!("DROP TABLE IF EXISTS {};", quote_identifier(table))
            }
        };

        Ok(sql)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Statement::AddColumn { table, column } => {
                require_identifier("table", table)?;
                require_identifier("column", &column.name)?;
                if column.data_type.trim().is_empty() {
                    return Err(invalid(format!(
                        "column {}.{} has no type",
                        table, column.name
                    )));
                }
                Ok(())
            }
            Statement::DropColumn { table, column } => {
                require_identifier("table", table)?;
                require_identifier("column", column)
            }
            Statement::AddForeignKey { table, foreign_key: fk } => {
                require_identifier("table", table)?;
                require_identifier("constraint", &fk.name)?;
                require_identifier("referenced table", &fk.ref_table)?;
                if fk.columns.is_empty() || fk.columns.len() != fk.ref_columns.len() {
                    return Err(invalid(format!(
                        "foreign key {} maps {} column(s) onto {}",
                        fk.name,
                        fk.columns.len(),
                        fk.ref_columns.len()
                    )));
                }
                for column in fk.columns.iter().chain(&fk.ref_columns) {
                    require_identifier("key column", column)?;
                }
                Ok(())
            }
            Statement::DropForeignKey { table, name } => {
                require_identifier("table", table)?;
                require_identifier("constraint", name)
            }
            Statement::CreateTableFromRaw { table, sql } => {
                require_identifier("table", table)?;
                let sql = sql.trim();
                if !sql.to_ascii_uppercase().starts_with("CREATE TABLE") || !sql.ends_with(';') {
                    return Err(invalid(format!(
                        "create statement for {} is not a complete CREATE TABLE",
                        table
                    )));
                }
                Ok(())
            }
            Statement::DropTable { table } => require_identifier("table", table),
        }
    }
}

fn referenced_table(fk: &ForeignKeyDescriptor) -> String {
    match &fk.ref_schema {
        Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(&fk.ref_table)),
        None => quote_identifier(&fk.ref_table),
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidStatement(reason)
}

/// Identifiers are always backtick-quoted, so only an empty name is unusable.
fn require_identifier(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(format!("empty {} name", kind)));
    }
    Ok(())
}

/// Forward and undo statements for one missing column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnStatements {
    pub column: String,
    /// `ADD COLUMN`, followed by any `ADD CONSTRAINT` it completes
    pub forward: Vec<Statement>,
    /// Any `DROP FOREIGN KEY` it must come after, then `DROP COLUMN`
    pub undo: Vec<Statement>,
}

/// Forward and undo statements for one missing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatements {
    pub forward: Statement,
    pub undo: Statement,
}

/// Rendered SQL lines, ready for the artifact writer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedStatements {
    pub forward: Vec<String>,
    pub undo: Vec<String>,
}

impl ColumnStatements {
    pub fn render(&self) -> Result<RenderedStatements> {
        Ok(RenderedStatements {
            forward: render_all(&self.forward)?,
            undo: render_all(&self.undo)?,
        })
    }
}

impl TableStatements {
    pub fn render(&self) -> Result<RenderedStatements> {
        Ok(RenderedStatements {
            forward: vec![self.forward.render()?],
            undo: vec![self.undo.render()?],
        })
    }
}

fn render_all(statements: &[Statement]) -> Result<Vec<String>> {
    statements.iter().map(Statement::render).collect()
}

/// Build the statements for the columns `missing` from the old copy of `table`
///
/// Columns are handled in the order given. Every foreign key of the new table
/// that constrains a missing column is emitted exactly once: its
/// `ADD CONSTRAINT` directly after the last missing column it covers is added,
/// its `DROP FOREIGN KEY` directly before the first one is dropped.
pub fn column_statements(table: &TableSnapshot, missing: &[String]) -> Result<Vec<ColumnStatements>> {
    missing
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let column = table.column(name).ok_or_else(|| {
                invalid(format!("column {}.{} is not in the new schema", table.name, name))
            })?;

            let mut forward = vec![Statement::AddColumn {
                table: table.name.clone(),
                column: column.clone(),
            }];
            let mut undo = Vec::new();

            for fk in table.foreign_keys_for(name) {
                let positions: Vec<usize> = fk
                    .columns
                    .iter()
                    .filter_map(|c| missing.iter().position(|m| m == c))
                    .collect();

                if positions.iter().max() == Some(&index) {
                    forward.push(Statement::AddForeignKey {
                        table: table.name.clone(),
                        foreign_key: fk.clone(),
                    });
                }
                if positions.iter().min() == Some(&index) {
                    undo.push(Statement::DropForeignKey {
                        table: table.name.clone(),
                        name: fk.name.clone(),
                    });
                }
            }

            undo.push(Statement::DropColumn {
                table: table.name.clone(),
                column: name.clone(),
            });

            Ok(ColumnStatements {
                column: name.clone(),
                forward,
                undo,
            })
        })
        .collect()
}

/// Build the statements for a table missing from the old database
pub fn table_statements(table: &str, create_sql: &str) -> TableStatements {
    TableStatements {
        forward: Statement::CreateTableFromRaw {
            table: table.to_string(),
            sql: create_sql.to_string(),
        },
        undo: Statement::DropTable {
            table: table.to_string(),
        },
    }
}
