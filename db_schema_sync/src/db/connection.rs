//! Database connection handling
//!
//! One read-only MySQL pool per connection profile, held for the whole run.

use sqlx::{mysql::MySqlPoolOptions, MySql, Pool};

use crate::config::ConnectionProfile;
use crate::error::{Error, Result};

/// A connection to one of the two compared databases
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: Pool<MySql>,
    schema: String,
}

impl DatabaseConnection {
    /// Open a connection for the given profile
    ///
    /// Connection errors are not retried.
    pub async fn connect(profile: &ConnectionProfile) -> Result<Self> {
        tracing::debug!(database = %profile.display_name(), "Connecting");

        // Metadata queries run one after another, a single connection is enough.
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(profile.timeout())
            .connect_with(profile.connect_options())
            .await
            .map_err(|source| Error::ConnectionFailure {
                database: profile.display_name(),
                source,
            })?;

        Ok(Self {
            pool,
            schema: profile.db.clone(),
        })
    }

    /// The database (MySQL schema) this connection introspects
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn pool(&self) -> &Pool<MySql> {
        &self.pool
    }

    /// Close the underlying pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
