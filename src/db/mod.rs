//! Database connection pool and per-request connection handling.
//!
//! This module provides:
//! - Creating the MySQL connection pool from configuration
//! - Session settings applied to every leased connection (`session`)
//! - `:name` parameter binding (`named`)
//! - The request-scoped connection lease (`lease`)

pub mod lease;
pub mod named;
pub mod session;

use async_trait::async_trait;
use sqlx::{
    MySql, Pool,
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    pool::PoolConnection,
};

use crate::{
    config::Config,
    db::{
        lease::{ConnectionLease, ConnectionSource},
        session::SessionConfig,
    },
};

/// Type alias for the MySQL connection pool.
pub type DbPool = Pool<MySql>;

/// Lease on a pooled MySQL connection, as extracted by handlers.
pub type DbLease = ConnectionLease<DbPool>;

/// Connection options for the configured MySQL server.
pub fn connect_options(config: &Config) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.db_host)
        .port(config.db_port)
        .username(&config.db_user)
        .password(&config.db_password)
        .database(&config.db_database)
}

/// Create a new MySQL connection pool.
///
/// # Configuration
///
/// - Maximum connections: `DB_MAX_CONNECTIONS`
/// - Acquisition waits at most `DB_ACQUIRE_TIMEOUT_SECS` before failing
///
/// # Errors
///
/// Returns an error if:
/// - Cannot connect to the MySQL server
/// - Database authentication fails
pub async fn create_pool(config: &Config) -> Result<DbPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(connect_options(config))
        .await
}

#[async_trait]
impl ConnectionSource for DbPool {
    type Connection = PoolConnection<MySql>;

    async fn acquire(&self) -> Result<Self::Connection, sqlx::Error> {
        Pool::acquire(self).await
    }

    async fn configure(
        &self,
        conn: &mut Self::Connection,
        session: &SessionConfig,
    ) -> Result<(), sqlx::Error> {
        // Order matters: sql_mode, then time_zone
        for statement in session.statements() {
            sqlx::query(statement.sql)
                .bind(statement.value)
                .execute(&mut **conn)
                .await?;
        }
        Ok(())
    }

    fn release(&self, conn: Self::Connection) {
        // PoolConnection returns itself to the pool when dropped
        drop(conn);
    }
}
