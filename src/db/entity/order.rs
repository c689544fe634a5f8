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
use crate::store::parse_int;
use crate::store::Form;
use crate::store::Listed;
use crate::store::RecordStore;
use crate::store::SortKey;
use crate::types::Result;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:           i32,
    pub customer_id:  i32,
    pub employee_id:  i32,
    pub total_amount: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
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
pub enum OrderSort {
    #[default]
    #[strum(serialize = "none")]
    Unsorted,
    IdAsc,
    IdDesc,
    CustomerAsc,
    CustomerDesc,
}

fn by_id(a: &Model, b: &Model) -> Ordering {
    a.id.cmp(&b.id)
}

fn by_id_desc(a: &Model, b: &Model) -> Ordering {
    b.id.cmp(&a.id)
}

fn by_customer(a: &Model, b: &Model) -> Ordering {
    a.customer_id.cmp(&b.customer_id)
}

fn by_customer_desc(a: &Model, b: &Model) -> Ordering {
    b.customer_id.cmp(&a.customer_id)
}

impl SortKey<Model> for OrderSort {
    fn comparator(self) -> fn(&Model, &Model) -> Ordering {
        match self {
            Self::Unsorted | Self::IdAsc => by_id,
            Self::IdDesc => by_id_desc,
            Self::CustomerAsc => by_customer,
            Self::CustomerDesc => by_customer_desc,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::from_repr(index)
    }
}

impl Listed for Model {
    type Sort = OrderSort;

    const ENTITY: &'static str = "order";

    fn id(&self) -> i32 {
        self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.customer_id.to_string(),
            self.employee_id.to_string(),
            self.total_amount.to_string(),
        ]
    }
}

#[derive(Clone, Debug, Default, Validate)]
pub struct OrderForm {
    #[garde(custom(integer))]
    pub customer_id:  String,
    #[garde(custom(integer))]
    pub employee_id:  String,
    #[garde(custom(integer))]
    pub total_amount: String,
}

impl Form for OrderForm {}

impl OrderForm {
    fn active_model(&self, id: Option<i32>) -> Result<ActiveModel> {
        self.check()?;
        Ok(ActiveModel {
            id:           id.map_or(NotSet, Unchanged),
            customer_id:  Set(parse_int("customer_id", &self.customer_id)?),
            employee_id:  Set(parse_int("employee_id", &self.employee_id)?),
            total_amount: Set(parse_int("total_amount", &self.total_amount)?),
        })
    }
}

impl From<&Model> for OrderForm {
    fn from(m: &Model) -> Self {
        Self {
            customer_id:  m.customer_id.to_string(),
            employee_id:  m.employee_id.to_string(),
            total_amount: m.total_amount.to_string(),
        }
    }
}

/// Order table manager.
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
    type Form = OrderForm;
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
    async fn insert(&self, form: &OrderForm) -> Result<Model> {
        self.table.insert(form.active_model(None)?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn update(&self, id: i32, form: &OrderForm) -> Result<Model> {
        self.table.update(id, form.active_model(Some(id))?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i32) -> Result<()> {
        self.table.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeskError;

    fn order(id: i32, customer_id: i32) -> Model {
        Model {
            id,
            customer_id,
            employee_id: 1,
            total_amount: 1500,
        }
    }

    #[test]
    fn test_sort_keys() {
        let first = order(1, 9);
        let second = order(2, 3);
        assert_eq!(OrderSort::Unsorted.comparator()(&first, &second), Ordering::Less);
        assert_eq!(OrderSort::IdDesc.comparator()(&first, &second), Ordering::Greater);
        assert_eq!(OrderSort::CustomerAsc.comparator()(&first, &second), Ordering::Greater);
        assert_eq!(OrderSort::CustomerDesc.comparator()(&first, &second), Ordering::Less);
    }

    #[test]
    fn test_matches_numbers() {
        let o = order(17, 4);
        assert!(o.matches("17"));
        assert!(o.matches("150"));
        assert!(!o.matches("99"));
    }

    #[test]
    fn test_form_requires_integers() {
        let form = OrderForm {
            customer_id:  "1".into(),
            employee_id:  "2".into(),
            total_amount: "12.5".into(),
        };
        assert!(matches!(form.active_model(None), Err(DeskError::Validation(_))));

        let form = OrderForm {
            total_amount: " 1250 ".into(),
            ..form
        };
        let am = form.active_model(Some(5)).unwrap();
        assert_eq!(am.id, Unchanged(5));
        assert_eq!(am.total_amount, Set(1250));
    }
}
