//! The per-table sync loop
//!
//! Tables of the new database are processed one at a time. Table-scoped
//! failures (see [`crate::Error::is_table_scoped`]) skip the table; anything else
//! ends the run.

use crate::artifacts::{ArtifactKind, ArtifactWriter};
use crate::config::ConnectionProfile;
use crate::db::dump::DumpTool;
use crate::error::Result;
use crate::report::{SyncSummary, TableOutcome};
use crate::schema::analyzer::Introspector;
use crate::schema::diff::TableDiff;
use crate::schema::generator::{self, ColumnStatements, RenderedStatements};
use crate::schema::types::TableSnapshot;

/// Compares the new database against the old one and writes the artifacts
pub struct SyncEngine<'a> {
    new_db: &'a dyn Introspector,
    old_db: &'a dyn Introspector,
    dump: &'a dyn DumpTool,
    new_profile: &'a ConnectionProfile,
    writer: &'a ArtifactWriter,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        new_db: &'a dyn Introspector,
        old_db: &'a dyn Introspector,
        dump: &'a dyn DumpTool,
        new_profile: &'a ConnectionProfile,
        writer: &'a ArtifactWriter,
    ) -> Self {
        Self {
            new_db,
            old_db,
            dump,
            new_profile,
            writer,
        }
    }

    /// Process every table of the new database
    pub async fn run(&self) -> Result<SyncSummary> {
        let tables = self.new_db.list_tables().await?;
        tracing::info!(
            tables = tables.len(),
            output = %self.writer.run_dir().display(),
            "Comparing schemas"
        );

        let mut summary = SyncSummary::default();
        for table in &tables {
            let outcome = match self.sync_table(table).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_table_scoped() => {
                    tracing::warn!(table = %table, error = %e, "Skipping table");
                    TableOutcome::Skipped {
                        reason: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };
            summary = summary.record(table, outcome);
        }

        Ok(summary)
    }

    async fn sync_table(&self, table: &str) -> Result<TableOutcome> {
        tracing::info!(table, "Inspecting table");

        let new_table = self.new_db.snapshot(table).await?.require(table)?;
        let old_table = self.old_db.snapshot(table).await?;

        match TableDiff::compute(&new_table, &old_table) {
            TableDiff::InSync => {
                tracing::debug!(table, "Table in sync");
                Ok(TableOutcome::InSync)
            }
            TableDiff::MissingTable => {
                tracing::info!(table, "Table does not exist in old database");
                self.emit_table(table)
            }
            TableDiff::MissingColumns(columns) => {
                tracing::info!(table, columns = ?columns, "Missing columns");
                self.emit_columns(&new_table, &columns)
            }
        }
    }

    fn emit_table(&self, table: &str) -> Result<TableOutcome> {
        let create_sql = self.dump.extract_create_statement(self.new_profile, table)?;
        let rendered = generator::table_statements(table, &create_sql).render()?;

        self.write(ArtifactKind::NewTables, ArtifactKind::UndoTables, &rendered)?;
        Ok(TableOutcome::TableMissing)
    }

    fn emit_columns(&self, new_table: &TableSnapshot, columns: &[String]) -> Result<TableOutcome> {
        // Render everything first so a bad statement leaves no partial output.
        let rendered = generator::column_statements(new_table, columns)?
            .iter()
            .map(ColumnStatements::render)
            .collect::<Result<Vec<_>>>()?;

        for statements in &rendered {
            self.write(ArtifactKind::NewColumns, ArtifactKind::UndoColumns, statements)?;
        }
        Ok(TableOutcome::ColumnsMissing(columns.len()))
    }

    fn write(
        &self,
        forward: ArtifactKind,
        undo: ArtifactKind,
        statements: &RenderedStatements,
    ) -> Result<()> {
        self.writer
            .append_all(forward, statements.forward.iter().map(String::as_str))?;
        self.writer
            .append_all(undo, statements.undo.iter().map(String::as_str))
    }
}
