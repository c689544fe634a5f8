//! Database drivers.
#[cfg(feature = "pg")]
pub mod pg;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::fmt::Debug;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::types::Result;

/// A configured database backend.
#[async_trait]
pub trait DatabaseDriver: Debug + Sync + Send + 'static {
    /// Returns a handle of the connection pool. Cloning it is cheap; every statement acquires and releases its own
    /// connection.
    fn connection(&self) -> DatabaseConnection;
    /// Apply backend-specific session settings. See corresponding driver implementation for details.
    async fn configure(&self) -> Result<()>;
}
