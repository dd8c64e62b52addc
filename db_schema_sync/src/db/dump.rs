//! `CREATE TABLE` extraction through the native dump utility
//!
//! Rebuilding full DDL (indexes, engine options, charsets) from the catalog
//! would duplicate what `mysqldump` already does, so missing tables are
//! exported with it and the first `CREATE TABLE` statement is cut out of its
//! output.

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Command;

use crate::config::{ConnectionProfile, DumpConfig};
use crate::error::{Error, Result};
use crate::utils::text::strip_chars;

static CREATE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)CREATE TABLE.*?;").expect("valid CREATE TABLE pattern"));

static PASSWORD_WARNING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^.*Warning\]?:? Using a password.*(\r?\n)?").expect("valid warning pattern")
});

/// Something that can produce a table's `CREATE TABLE` statement
pub trait DumpTool: Send + Sync {
    /// Single-line `CREATE TABLE ...;` for `table` in the database `profile` points at
    fn extract_create_statement(&self, profile: &ConnectionProfile, table: &str) -> Result<String>;
}

/// `mysqldump`, run once per missing table
#[derive(Debug, Clone)]
pub struct MysqlDump {
    binary: String,
    extra_args: Vec<String>,
}

impl MysqlDump {
    pub fn new(config: &DumpConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    /// Arguments for a schema-only dump of one table
    ///
    /// The password is not among them; it goes through `MYSQL_PWD`.
    pub fn command_args(&self, profile: &ConnectionProfile, table: &str) -> Vec<String> {
        let mut args = vec![
            "-h".to_string(),
            profile.host.clone(),
            "-P".to_string(),
            profile.port.to_string(),
            "-u".to_string(),
            profile.user.clone(),
            "--no-data".to_string(),
            "--skip-extended-insert".to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(profile.db.clone());
        args.push(table.to_string());
        args
    }
}

impl DumpTool for MysqlDump {
    fn extract_create_statement(&self, profile: &ConnectionProfile, table: &str) -> Result<String> {
        tracing::debug!(table, binary = %self.binary, "Running dump utility");

        let output = Command::new(&self.binary)
            .args(self.command_args(profile, table))
            .env("MYSQL_PWD", &profile.password)
            .output()
            .map_err(|e| Error::DumpExtractionFailed {
                table: table.to_string(),
                reason: format!("failed to run {}: {}", self.binary, e),
            })?;

        let stderr = filter_password_warning(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(Error::DumpExtractionFailed {
                table: table.to_string(),
                reason: format!("{} exited with {}: {}", self.binary, output.status, stderr.trim()),
            });
        }

        if !stderr.trim().is_empty() {
            tracing::warn!(table, stderr = %stderr.trim(), "Dump utility reported warnings");
        }

        extract_create_table(&String::from_utf8_lossy(&output.stdout), table)
    }
}

/// Drop the "using a password on the command line" warning lines
pub fn filter_password_warning(text: &str) -> String {
    PASSWORD_WARNING.replace_all(text, "").into_owned()
}

/// Cut the first `CREATE TABLE` statement out of dump output
///
/// Runs from the first `CREATE TABLE` through the first `;` after it, with
/// newlines, tabs and double quotes removed so it fits on one line.
pub fn extract_create_table(dump_output: &str, table: &str) -> Result<String> {
    let statement = CREATE_TABLE
        .find(dump_output)
        .ok_or_else(|| Error::DumpExtractionFailed {
            table: table.to_string(),
            reason: if dump_output.contains("CREATE TABLE") {
                "CREATE TABLE statement is not terminated".to_string()
            } else {
                "no CREATE TABLE statement in dump output".to_string()
            },
        })?;

    Ok(strip_chars(statement.as_str(), &['\n', '\t', '"']))
}
