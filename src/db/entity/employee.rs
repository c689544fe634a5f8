use std::cmp::Ordering;

use async_trait::async_trait;
use garde::Validate;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::NotSet;
use sea_orm::ActiveValue::Set;
use sea_orm::ActiveValue::Unchanged;
use sea_orm::QueryFilter;
use sea_orm::QueryOrder;
use serde::Deserialize;
use serde::Serialize;
use tracing::instrument;
use tracing::warn;

use crate::db::table::has_dependents;
use crate::db::table::Table;
use crate::store::integer;
use crate::store::parse_int;
use crate::store::Form;
use crate::store::Listed;
use crate::store::RecordStore;
use crate::store::SortKey;
use crate::types::DeskError;
use crate::types::Result;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:      i32,
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::EnumIter, strum::EnumString, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(usize)]
pub enum EmployeeSort {
    #[default]
    #[strum(serialize = "none")]
    Unsorted,
    IdAsc,
    IdDesc,
    UserAsc,
    UserDesc,
}

fn by_id(a: &Model, b: &Model) -> Ordering {
    a.id.cmp(&b.id)
}

fn by_id_desc(a: &Model, b: &Model) -> Ordering {
    b.id.cmp(&a.id)
}

fn by_user(a: &Model, b: &Model) -> Ordering {
    a.user_id.cmp(&b.user_id)
}

fn by_user_desc(a: &Model, b: &Model) -> Ordering {
    b.user_id.cmp(&a.user_id)
}

impl SortKey<Model> for EmployeeSort {
    fn comparator(self) -> fn(&Model, &Model) -> Ordering {
        match self {
            Self::Unsorted | Self::IdAsc => by_id,
            Self::IdDesc => by_id_desc,
            Self::UserAsc => by_user,
            Self::UserDesc => by_user_desc,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::from_repr(index)
    }
}

impl Listed for Model {
    type Sort = EmployeeSort;

    const ENTITY: &'static str = "employee";

    fn id(&self) -> i32 {
        self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.id.to_string(), self.user_id.to_string()]
    }
}

#[derive(Clone, Debug, Default, Validate)]
pub struct EmployeeForm {
    #[garde(custom(integer))]
    pub user_id: String,
}

impl Form for EmployeeForm {}

impl EmployeeForm {
    fn active_model(&self, id: Option<i32>) -> Result<ActiveModel> {
        self.check()?;
        Ok(ActiveModel {
            id:      id.map_or(NotSet, Unchanged),
            user_id: Set(parse_int("user_id", &self.user_id)?),
        })
    }
}

impl From<&Model> for EmployeeForm {
    fn from(m: &Model) -> Self {
        Self {
            user_id: m.user_id.to_string(),
        }
    }
}

/// Employee table manager.
#[derive(Clone, Debug)]
pub struct Manager {
    table: Table<Entity>,
}

impl Manager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            table: Table::new(db, Model::ENTITY),
        }
    }

    pub async fn get_by_user(&self, user_id: i32) -> Result<Option<Model>> {
        Ok(Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(self.table.connection())
            .await?)
    }
}

#[async_trait]
impl RecordStore for Manager {
    type Form = EmployeeForm;
    type Record = Model;

    #[instrument(level = "debug", skip(self))]
    async fn list_all(&self) -> Result<Vec<Model>> {
        Ok(Entity::find()
            .order_by_asc(Column::Id)
            .all(self.table.connection())
            .await?)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Model>> {
        self.table.by_id(id).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn insert(&self, form: &EmployeeForm) -> Result<Model> {
        self.table.insert(form.active_model(None)?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn update(&self, id: i32, form: &EmployeeForm) -> Result<Model> {
        self.table.update(id, form.active_model(Some(id))?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i32) -> Result<()> {
        let db = self.table.connection();
        if has_dependents::<super::order::Entity, _>(db, super::order::Column::EmployeeId, id).await? {
            warn!("Employee #{id} still has orders");
            return Err(DeskError::conflict(
                "The employee cannot be deleted because there are orders related to it",
            ));
        }
        if has_dependents::<super::shipment::Entity, _>(db, super::shipment::Column::EmployeeId, id).await? {
            warn!("Employee #{id} still has shipments");
            return Err(DeskError::conflict(
                "The employee cannot be deleted because there are shipments related to it",
            ));
        }
        self.table.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_keys() {
        let a = Model { id: 1, user_id: 8 };
        let b = Model { id: 2, user_id: 4 };
        assert_eq!(EmployeeSort::Unsorted.comparator()(&a, &b), Ordering::Less);
        assert_eq!(EmployeeSort::UserAsc.comparator()(&a, &b), Ordering::Greater);
        assert_eq!(EmployeeSort::UserDesc.comparator()(&a, &b), Ordering::Less);
        assert_eq!(EmployeeSort::parse_or_default("user-desc"), EmployeeSort::UserDesc);
    }

    #[test]
    fn test_form() {
        let form = EmployeeForm { user_id: "x".into() };
        assert!(matches!(form.active_model(None), Err(DeskError::Validation(_))));
    }

    #[test]
    fn test_matches() {
        let e = Model { id: 12, user_id: 3 };
        assert!(e.matches("12"));
        assert!(e.matches("3"));
        assert!(!e.matches("7"));
    }
}
