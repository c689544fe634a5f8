use std::fmt::Debug;
use std::marker::PhantomData;

use sea_orm::ActiveModelBehavior;
use sea_orm::ActiveModelTrait;
use sea_orm::ColumnTrait;
use sea_orm::ConnectionTrait;
use sea_orm::DatabaseConnection;
use sea_orm::DbErr;
use sea_orm::EntityTrait;
use sea_orm::IntoActiveModel;
use sea_orm::PrimaryKeyTrait;
use sea_orm::QueryFilter;
use tracing::instrument;

use crate::types::DeskError;
use crate::types::Result;

/// Single-row operations common to all managers.
///
/// Every entity in this crate uses an `i32` primary key, which is what makes this helper generic enough.
pub struct Table<E>
where
    E: EntityTrait, {
    db:     DatabaseConnection,
    entity: &'static str,
    _e:     PhantomData<E>,
}

impl<E> Table<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    pub fn new(db: DatabaseConnection, entity: &'static str) -> Self {
        Self {
            db,
            entity,
            _e: PhantomData,
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    #[instrument(level = "trace", skip(self), fields(entity = self.entity))]
    pub async fn all(&self) -> Result<Vec<E::Model>> {
        Ok(E::find().all(&self.db).await?)
    }

    #[instrument(level = "trace", skip(self), fields(entity = self.entity))]
    pub async fn by_id(&self, id: i32) -> Result<Option<E::Model>> {
        Ok(E::find_by_id(id).one(&self.db).await?)
    }

    #[instrument(level = "trace", skip(self, am), fields(entity = self.entity))]
    pub async fn insert(&self, am: E::ActiveModel) -> Result<E::Model> {
        Ok(am.insert(&self.db).await?)
    }

    /// `am` must carry the primary key of the row being updated.
    #[instrument(level = "trace", skip(self, am), fields(entity = self.entity))]
    pub async fn update(&self, id: i32, am: E::ActiveModel) -> Result<E::Model> {
        am.update(&self.db).await.map_err(|err| self.not_found_or(id, err))
    }

    #[instrument(level = "trace", skip(self), fields(entity = self.entity))]
    pub async fn delete(&self, id: i32) -> Result<()> {
        self.delete_with(&self.db, id).await
    }

    /// Delete within a transaction or any other connection.
    pub async fn delete_with<C: ConnectionTrait>(&self, conn: &C, id: i32) -> Result<()> {
        let res = E::delete_by_id(id).exec(conn).await?;
        if res.rows_affected == 0 {
            Err(DeskError::not_found(self.entity, id))
        }
        else {
            Ok(())
        }
    }

    fn not_found_or(&self, id: i32, err: DbErr) -> DeskError {
        match err {
            DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => DeskError::not_found(self.entity, id),
            err => err.into(),
        }
    }
}

impl<E: EntityTrait> Clone for Table<E> {
    fn clone(&self) -> Self {
        Self {
            db:     self.db.clone(),
            entity: self.entity,
            _e:     PhantomData,
        }
    }
}

impl<E: EntityTrait> Debug for Table<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Table({})", self.entity)
    }
}

/// Tell if any row of `D` references `id` through column `col`.
pub async fn has_dependents<D, C>(conn: &C, col: D::Column, id: i32) -> Result<bool>
where
    D: EntityTrait,
    C: ConnectionTrait,
{
    Ok(D::find().filter(col.eq(id)).one(conn).await?.is_some())
}
