use std::path::Path;

use async_trait::async_trait;
use fieldx::fxstruct;
use sea_orm::ConnectionTrait;
use sea_orm::DatabaseConnection;
use tracing::debug;
use tracing::error;

use crate::types::Result;

use super::DatabaseDriver;

/// SQLite database file.
#[derive(Debug)]
#[fxstruct(sync, no_new)]
pub struct Sqlite {
    connection: DatabaseConnection,
}

impl Sqlite {
    /// Open `db_name` in `db_dir`, creating the file if necessary.
    pub async fn connect(db_dir: &Path, db_name: &str) -> Result<Self> {
        let db_path = db_dir.join(db_name);

        let schema = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = sea_orm::Database::connect(&schema)
            .await
            .inspect_err(|e| error!("Error connecting to database {schema}: {e}"))?;

        debug!("Connected to {}", db_path.display());

        Ok(Self { connection: db })
    }
}

#[async_trait]
impl DatabaseDriver for Sqlite {
    fn connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    async fn configure(&self) -> Result<()> {
        let db = &self.connection;

        db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        db.execute_unprepared("PRAGMA synchronous=NORMAL;").await?;
        db.execute_unprepared("PRAGMA foreign_keys=ON;").await?;

        Ok(())
    }
}
