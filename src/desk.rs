use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing::instrument;

use crate::auth::Auth;
use crate::db::driver::DatabaseDriver;
use crate::db::entity::CategoryMgr;
use crate::db::entity::CustomerMgr;
use crate::db::entity::EmployeeMgr;
use crate::db::entity::OrderMgr;
use crate::db::entity::ProductMgr;
use crate::db::entity::ShipmentMgr;
use crate::db::entity::SupplierMgr;
use crate::db::entity::UserMgr;
use crate::db::migrations::Migrator;
use crate::store::RecordStore;
use crate::types::Result;
use crate::view::ListView;

/// Persistence handle of the application.
///
/// There is no global database context; whatever needs the database gets a `Desk` (or a manager obtained from it).
/// Cloning is cheap, all clones share the connection pool.
#[derive(Clone, Debug)]
pub struct Desk {
    db: DatabaseConnection,
}

impl Desk {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn from_driver<D: DatabaseDriver + ?Sized>(driver: &D) -> Self {
        Self::new(driver.connection())
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Apply pending schema migrations.
    #[instrument(level = "debug", skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        Migrator::up(&self.db, None).await?;
        info!("Database schema is up to date");
        Ok(())
    }

    pub fn categories(&self) -> CategoryMgr {
        CategoryMgr::new(self.db.clone())
    }

    pub fn suppliers(&self) -> SupplierMgr {
        SupplierMgr::new(self.db.clone())
    }

    pub fn customers(&self) -> CustomerMgr {
        CustomerMgr::new(self.db.clone())
    }

    pub fn orders(&self) -> OrderMgr {
        OrderMgr::new(self.db.clone())
    }

    pub fn shipments(&self) -> ShipmentMgr {
        ShipmentMgr::new(self.db.clone())
    }

    pub fn products(&self) -> ProductMgr {
        ProductMgr::new(self.db.clone())
    }

    pub fn employees(&self) -> EmployeeMgr {
        EmployeeMgr::new(self.db.clone())
    }

    pub fn users(&self) -> UserMgr {
        UserMgr::new(self.db.clone())
    }

    pub fn auth(&self) -> Auth {
        Auth::new(self.db.clone())
    }

    /// Load a list view over `store`.
    pub async fn open<S: RecordStore>(&self, store: S) -> Result<ListView<S>> {
        ListView::open(store).await
    }
}
