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

use crate::db::table::Table;
use crate::store::integer;
use crate::store::number;
use crate::store::parse_int;
use crate::store::parse_number;
use crate::store::Form;
use crate::store::Listed;
use crate::store::RecordStore;
use crate::store::SortKey;
use crate::types::Result;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:          i32,
    pub supplier_id: i32,
    pub employee_id: i32,
    pub total_cost:  f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::EnumIter, strum::EnumString, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(usize)]
pub enum ShipmentSort {
    #[default]
    #[strum(serialize = "none")]
    Unsorted,
    IdAsc,
    IdDesc,
    SupplierAsc,
    SupplierDesc,
}

fn by_id(a: &Model, b: &Model) -> Ordering {
    a.id.cmp(&b.id)
}

fn by_id_desc(a: &Model, b: &Model) -> Ordering {
    b.id.cmp(&a.id)
}

fn by_supplier(a: &Model, b: &Model) -> Ordering {
    a.supplier_id.cmp(&b.supplier_id)
}

fn by_supplier_desc(a: &Model, b: &Model) -> Ordering {
    b.supplier_id.cmp(&a.supplier_id)
}

impl SortKey<Model> for ShipmentSort {
    fn comparator(self) -> fn(&Model, &Model) -> Ordering {
        match self {
            Self::Unsorted | Self::IdAsc => by_id,
            Self::IdDesc => by_id_desc,
            Self::SupplierAsc => by_supplier,
            Self::SupplierDesc => by_supplier_desc,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::from_repr(index)
    }
}

impl Listed for Model {
    type Sort = ShipmentSort;

    const ENTITY: &'static str = "shipment";

    fn id(&self) -> i32 {
        self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.supplier_id.to_string(),
            self.employee_id.to_string(),
            self.total_cost.to_string(),
        ]
    }
}

#[derive(Clone, Debug, Default, Validate)]
pub struct ShipmentForm {
    #[garde(custom(integer))]
    pub supplier_id: String,
    #[garde(custom(integer))]
    pub employee_id: String,
    #[garde(custom(number))]
    pub total_cost:  String,
}

impl Form for ShipmentForm {}

impl ShipmentForm {
    fn active_model(&self, id: Option<i32>) -> Result<ActiveModel> {
        self.check()?;
        Ok(ActiveModel {
            id:          id.map_or(NotSet, Unchanged),
            supplier_id: Set(parse_int("supplier_id", &self.supplier_id)?),
            employee_id: Set(parse_int("employee_id", &self.employee_id)?),
            total_cost:  Set(parse_number("total_cost", &self.total_cost)?),
        })
    }
}

impl From<&Model> for ShipmentForm {
    fn from(m: &Model) -> Self {
        Self {
            supplier_id: m.supplier_id.to_string(),
            employee_id: m.employee_id.to_string(),
            total_cost:  m.total_cost.to_string(),
        }
    }
}

/// Shipment table manager.
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
    type Form = ShipmentForm;
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
    async fn insert(&self, form: &ShipmentForm) -> Result<Model> {
        self.table.insert(form.active_model(None)?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn update(&self, id: i32, form: &ShipmentForm) -> Result<Model> {
        self.table.update(id, form.active_model(Some(id))?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i32) -> Result<()> {
        self.table.delete(id).await
    }
}
