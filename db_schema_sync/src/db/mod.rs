//! Database module for db_schema_sync
//!
//! This module handles database connections and the external dump utility.

pub mod connection;
pub mod dump;

// Re-export key types
pub use connection::DatabaseConnection;
pub use dump::{DumpTool, MysqlDump};
