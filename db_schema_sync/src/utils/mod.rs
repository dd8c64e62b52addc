//! Utilities for db_schema_sync
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod text;

// Re-export key utility functions
pub use logging::init_logging;
pub use text::{escape_literal, quote_literal, strip_chars};
