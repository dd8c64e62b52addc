//! Run summary

use std::fmt;

/// What happened to one table of the new database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    InSync,
    /// Missing from the old database; create/drop statements were written
    TableMissing,
    /// This many columns were missing from the old copy
    ColumnsMissing(usize),
    /// Could not be processed; nothing was written for it
    Skipped { reason: String },
}

/// Counts accumulated over a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub tables_inspected: usize,
    pub missing_tables: usize,
    pub missing_columns: usize,
    /// `(table, reason)` for every table that was skipped
    pub skipped: Vec<(String, String)>,
}

impl SyncSummary {
    /// Fold one table's outcome into the summary
    pub fn record(mut self, table: &str, outcome: TableOutcome) -> Self {
        self.tables_inspected += 1;
        match outcome {
            TableOutcome::InSync => {}
            TableOutcome::TableMissing => self.missing_tables += 1,
            TableOutcome::ColumnsMissing(count) => self.missing_columns += count,
            TableOutcome::Skipped { reason } => self.skipped.push((table.to_string(), reason)),
        }
        self
    }

    /// No missing tables and no missing columns
    pub fn is_in_sync(&self) -> bool {
        self.missing_tables == 0 && self.missing_columns == 0
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_in_sync() {
            writeln!(f, "Tables in sync!")?;
        } else {
            writeln!(f, "Tables missing: {}", self.missing_tables)?;
            writeln!(f, "Columns missing: {}", self.missing_columns)?;
            writeln!(
                f,
                "Note: only additions are detected; tables and columns that exist only in the old database are not reported."
            )?;
        }

        if !self.skipped.is_empty() {
            writeln!(f, "Tables skipped: {}", self.skipped.len())?;
            for (table, reason) in &self.skipped {
                writeln!(f, "  {}: {}", table, reason)?;
            }
        }

        writeln!(f)?;
        write!(f, "Done.")
    }
}

/// Print the final summary to stdout
pub fn print_summary(summary: &SyncSummary) {
    println!("{}", summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn records_outcomes() {
        let summary = SyncSummary::default()
            .record("users", TableOutcome::ColumnsMissing(2))
            .record("orders", TableOutcome::TableMissing)
            .record("audit", TableOutcome::InSync)
            .record("legacy", TableOutcome::Skipped { reason: "dump failed".into() });

        assert_eq!(summary.tables_inspected, 4);
        assert_eq!(summary.missing_tables, 1);
        assert_eq!(summary.missing_columns, 2);
        assert_eq!(summary.skipped, vec![("legacy".to_string(), "dump failed".to_string())]);
        assert!(!summary.is_in_sync());
    }

    #[test]
    fn renders_in_sync() {
        let summary = SyncSummary::default().record("users", TableOutcome::InSync);
        assert_eq!(summary.to_string(), "Tables in sync!\n\nDone.");
    }

    #[test]
    fn renders_counts() {
        let summary = SyncSummary::default()
            .record("orders", TableOutcome::TableMissing)
            .record("users", TableOutcome::ColumnsMissing(1));
        let text = summary.to_string();

        assert!(text.starts_with("Tables missing: 1\nColumns missing: 1\n"));
        assert!(text.contains("only additions are detected"));
        assert!(text.ends_with("Done."));
    }

    #[test]
    fn skipped_tables_do_not_count_as_missing() {
        let summary = SyncSummary::default()
            .record("legacy", TableOutcome::Skipped { reason: "no CREATE TABLE".into() });

        assert!(summary.is_in_sync());
        assert!(summary.to_string().contains("  legacy: no CREATE TABLE"));
    }
}
