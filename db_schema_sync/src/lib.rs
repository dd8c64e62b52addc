//! db_schema_sync: bring an old MySQL schema in line with a new one
//!
//! Every table of the "new" database is looked up in the "old" database.
//! Tables missing from the old database are exported with `mysqldump`; missing
//! columns get `ALTER TABLE ... ADD COLUMN` statements plus any foreign keys
//! that constrain them. Forward and undo statements are written to a dated
//! directory for review. Neither database is ever written to.

pub mod artifacts;
pub mod config;
pub mod db;
pub mod error;
pub mod report;
pub mod schema;
pub mod sync;
pub mod utils;

// Re-export main types for easier access
pub use artifacts::{ArtifactKind, ArtifactWriter};
pub use config::{Config, ConnectionProfile};
pub use db::connection::DatabaseConnection;
pub use db::dump::{DumpTool, MysqlDump};
pub use error::{Error, Result};
pub use report::{SyncSummary, TableOutcome};
pub use schema::analyzer::{Introspector, SchemaAnalyzer};
pub use sync::SyncEngine;

/// Holds both database connections for one run
pub struct SchemaSyncClient {
    config: Config,
    new_db: SchemaAnalyzer,
    old_db: SchemaAnalyzer,
    dump: MysqlDump,
}

impl SchemaSyncClient {
    /// Connect to the new and the old database
    ///
    /// Either connection failing aborts; nothing is retried.
    pub async fn connect(config: Config) -> Result<Self> {
        let new_db = DatabaseConnection::connect(&config.new_db).await?;
        let old_db = DatabaseConnection::connect(&config.old_db).await?;
        let dump = MysqlDump::new(&config.dump);

        Ok(Self {
            new_db: SchemaAnalyzer::new(new_db),
            old_db: SchemaAnalyzer::new(old_db),
            dump,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Writer for the artifacts of `run_id` under the configured output root
    pub fn artifact_writer(&self, run_id: &str) -> ArtifactWriter {
        ArtifactWriter::new(&self.config.output.directory, run_id)
    }

    /// Compare the two databases and write the artifacts of `run_id`
    pub async fn sync_database(&self, run_id: &str) -> Result<SyncSummary> {
        let writer = self.artifact_writer(run_id);

        let summary = SyncEngine::new(
            &self.new_db,
            &self.old_db,
            &self.dump,
            &self.config.new_db,
            &writer,
        )
        .run()
        .await?;

        for path in writer.written() {
            tracing::info!(path = %path.display(), "Artifact written");
        }

        Ok(summary)
    }

    /// Close both connections
    pub async fn close(&self) {
        self.new_db.connection().close().await;
        self.old_db.connection().close().await;
    }
}
