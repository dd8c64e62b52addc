//! Output files of a sync run
//!
//! Each run writes into `<root>/<YYYY-MM-DD>/`. Files are only created when
//! something is written to them, and they are never truncated: running twice
//! on the same day appends a second copy of any statements.

use chrono::{Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The four artifact files of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    NewColumns,
    UndoColumns,
    NewTables,
    UndoTables,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::NewColumns,
        ArtifactKind::UndoColumns,
        ArtifactKind::NewTables,
        ArtifactKind::UndoTables,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::NewColumns => "new_columns.sql",
            ArtifactKind::UndoColumns => "undo_columns.sql",
            ArtifactKind::NewTables => "new_tables.sql",
            ArtifactKind::UndoTables => "undo_tables.sql",
        }
    }
}

/// Run identifier for a date
pub fn run_id_for(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Run identifier for today, in local time
pub fn today_run_id() -> String {
    run_id_for(Local::now().date_naive())
}

/// Appends statements to the artifact files of one run
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    run_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl AsRef<Path>, run_id: &str) -> Self {
        Self {
            run_dir: root.as_ref().join(run_id),
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.run_dir.join(kind.file_name())
    }

    /// Append one statement, followed by a newline
    pub fn append(&self, kind: ArtifactKind, statement: &str) -> Result<()> {
        self.append_all(kind, std::iter::once(statement))
    }

    /// Append several statements in order, each on its own line
    pub fn append_all<'a>(
        &self,
        kind: ArtifactKind,
        statements: impl IntoIterator<Item = &'a str>,
    ) -> Result<()> {
        let path = self.path(kind);

        fs::create_dir_all(&self.run_dir).map_err(|source| Error::FileWriteFailure {
            path: self.run_dir.clone(),
            source,
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| Error::FileWriteFailure {
                path: path.clone(),
                source,
            })?;

        for statement in statements {
            writeln!(file, "{}", statement).map_err(|source| Error::FileWriteFailure {
                path: path.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Artifact files that exist for this run
    pub fn written(&self) -> Vec<PathBuf> {
        ArtifactKind::ALL
            .iter()
            .map(|kind| self.path(*kind))
            .filter(|path| path.is_file())
            .collect()
    }
}
