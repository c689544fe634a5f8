use std::cmp::Ordering;

use async_trait::async_trait;
use garde::Validate;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::NotSet;
use sea_orm::ActiveValue::Set;
use sea_orm::ActiveValue::Unchanged;
use sea_orm::QueryOrder;
use serde::Deserialize;
use serde::Serialize;
use tracing::instrument;
use tracing::warn;

use crate::db::table::has_dependents;
use crate::db::table::Table;
use crate::store::not_blank;
use crate::store::text_cmp;
use crate::store::trimmed;
use crate::store::Form;
use crate::store::Listed;
use crate::store::RecordStore;
use crate::store::SortKey;
use crate::types::DeskError;
use crate::types::Result;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:           i32,
    pub name:         String,
    pub contact_name: String,
    pub phone:        String,
    pub address:      String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::EnumIter, strum::EnumString, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(usize)]
pub enum SupplierSort {
    #[default]
    #[strum(serialize = "none")]
    Unsorted,
    NameAsc,
    NameDesc,
    ContactAsc,
    ContactDesc,
}

fn by_name(a: &Model, b: &Model) -> Ordering {
    text_cmp(&a.name, &b.name)
}

fn by_name_desc(a: &Model, b: &Model) -> Ordering {
    text_cmp(&b.name, &a.name)
}

fn by_contact(a: &Model, b: &Model) -> Ordering {
    text_cmp(&a.contact_name, &b.contact_name)
}

fn by_contact_desc(a: &Model, b: &Model) -> Ordering {
    text_cmp(&b.contact_name, &a.contact_name)
}

impl SortKey<Model> for SupplierSort {
    fn comparator(self) -> fn(&Model, &Model) -> Ordering {
        match self {
            Self::Unsorted | Self::NameAsc => by_name,
            Self::NameDesc => by_name_desc,
            Self::ContactAsc => by_contact,
            Self::ContactDesc => by_contact_desc,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::from_repr(index)
    }
}

impl Listed for Model {
    type Sort = SupplierSort;

    const ENTITY: &'static str = "supplier";

    fn id(&self) -> i32 {
        self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.contact_name.clone()]
    }
}

#[derive(Clone, Debug, Default, Validate)]
pub struct SupplierForm {
    #[garde(custom(not_blank))]
    pub name:         String,
    #[garde(custom(not_blank))]
    pub contact_name: String,
    #[garde(custom(not_blank))]
    pub phone:        String,
    #[garde(custom(not_blank))]
    pub address:      String,
}

impl Form for SupplierForm {}

impl SupplierForm {
    fn active_model(&self, id: Option<i32>) -> Result<ActiveModel> {
        self.check()?;
        Ok(ActiveModel {
            id:           id.map_or(NotSet, Unchanged),
            name:         Set(trimmed(&self.name)),
            contact_name: Set(trimmed(&self.contact_name)),
            phone:        Set(trimmed(&self.phone)),
            address:      Set(trimmed(&self.address)),
        })
    }
}

impl From<&Model> for SupplierForm {
    fn from(m: &Model) -> Self {
        Self {
            name:         m.name.clone(),
            contact_name: m.contact_name.clone(),
            phone:        m.phone.clone(),
            address:      m.address.clone(),
        }
    }
}

/// Supplier table manager.
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
}

#[async_trait]
impl RecordStore for Manager {
    type Form = SupplierForm;
    type Record = Model;

    #[instrument(level = "debug", skip(self))]
    async fn list_all(&self) -> Result<Vec<Model>> {
        Ok(Entity::find()
            .order_by_asc(Column::Name)
            .all(self.table.connection())
            .await?)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Model>> {
        self.table.by_id(id).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn insert(&self, form: &SupplierForm) -> Result<Model> {
        self.table.insert(form.active_model(None)?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn update(&self, id: i32, form: &SupplierForm) -> Result<Model> {
        self.table.update(id, form.active_model(Some(id))?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i32) -> Result<()> {
        if has_dependents::<super::shipment::Entity, _>(
            self.table.connection(),
            super::shipment::Column::SupplierId,
            id,
        )
        .await?
        {
            warn!("Supplier #{id} still has shipments");
            return Err(DeskError::conflict(
                "The supplier cannot be deleted because there are shipments related to it",
            ));
        }
        self.table.delete(id).await
    }
}
