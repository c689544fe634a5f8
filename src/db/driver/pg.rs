use std::time::Duration;

use async_trait::async_trait;
use fieldx::fxstruct;
use sea_orm::ConnectOptions;
use sea_orm::ConnectionTrait;
use sea_orm::DatabaseConnection;
use tracing::debug;
use tracing::error;

use crate::types::Result;

use super::DatabaseDriver;

/// PostgreSQL server connection. Build it, then [`connect`](Pg::connect) before use.
#[derive(Debug)]
#[fxstruct(sync, rc, no_new, builder)]
pub struct Pg {
    host:     String,
    port:     u16,
    user:     String,
    password: String,
    database: String,
    #[fieldx(inner_mut, get(off), set, builder(off))]
    connection: DatabaseConnection,
}

impl Pg {
    /// Connection URL without the password, for messages.
    pub fn display_url(&self) -> String {
        format!("postgres://{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }

    pub async fn connect(&self) -> Result<()> {
        let url = format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        );
        let mut opts = ConnectOptions::new(url);
        opts.max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(60))
            .test_before_acquire(true);

        let db = sea_orm::Database::connect(opts)
            .await
            .inspect_err(|e| error!("Error connecting to database {}: {e}", self.display_url()))?;
        debug!("Connected to {}", self.display_url());
        self.set_connection(db);

        Ok(())
    }
}

#[async_trait]
impl DatabaseDriver for Pg {
    fn connection(&self) -> DatabaseConnection {
        self.connection.read().clone()
    }

    /// Silence notices such as "relation already exists" from idempotent migrations.
    async fn configure(&self) -> Result<()> {
        self.connection()
            .execute_unprepared("SET client_min_messages = warning;")
            .await?;

        Ok(())
    }
}
