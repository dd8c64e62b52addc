//! Schema module for db_schema_sync
//!
//! This module handles schema introspection, comparison, and DDL generation.

pub mod analyzer;
pub mod diff;
pub mod generator;
pub mod types;

// Re-export key types
pub use analyzer::{Introspector, SchemaAnalyzer};
pub use diff::TableDiff;
pub use generator::{ColumnStatements, RenderedStatements, Statement, TableStatements};
pub use types::{ColumnDescriptor, ForeignKeyDescriptor, TableLookup, TableSnapshot};
