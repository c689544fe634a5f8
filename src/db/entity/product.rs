use std::cmp::Ordering;

use async_trait::async_trait;
use garde::Validate;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::NotSet;
use sea_orm::ActiveValue::Set;
use sea_orm::ActiveValue::Unchanged;
use sea_orm::QueryOrder;
use sea_orm::QuerySelect;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::instrument;

use crate::db::table::Table;
use crate::store::integer;
use crate::store::not_blank;
use crate::store::number;
use crate::store::optional_integer;
use crate::store::parse_int;
use crate::store::parse_number;
use crate::store::parse_opt_int;
use crate::store::text_cmp;
use crate::store::trimmed;
use crate::store::Form;
use crate::store::Listed;
use crate::store::RecordStore;
use crate::store::SortKey;
use crate::types::Result;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:             i32,
    pub name:           String,
    pub price:          f64,
    pub stock_quantity: i32,
    /// Cleared when the category is deleted.
    pub category_id:    Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::EnumIter, strum::EnumString, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(usize)]
pub enum ProductSort {
    #[default]
    #[strum(serialize = "none")]
    Unsorted,
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    StockAsc,
    StockDesc,
}

fn by_name(a: &Model, b: &Model) -> Ordering {
    text_cmp(&a.name, &b.name)
}

fn by_name_desc(a: &Model, b: &Model) -> Ordering {
    text_cmp(&b.name, &a.name)
}

fn by_price(a: &Model, b: &Model) -> Ordering {
    a.price.total_cmp(&b.price)
}

fn by_price_desc(a: &Model, b: &Model) -> Ordering {
    b.price.total_cmp(&a.price)
}

fn by_stock(a: &Model, b: &Model) -> Ordering {
    a.stock_quantity.cmp(&b.stock_quantity)
}

fn by_stock_desc(a: &Model, b: &Model) -> Ordering {
    b.stock_quantity.cmp(&a.stock_quantity)
}

impl SortKey<Model> for ProductSort {
    fn comparator(self) -> fn(&Model, &Model) -> Ordering {
        match self {
            Self::Unsorted | Self::NameAsc => by_name,
            Self::NameDesc => by_name_desc,
            Self::PriceAsc => by_price,
            Self::PriceDesc => by_price_desc,
            Self::StockAsc => by_stock,
            Self::StockDesc => by_stock_desc,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::from_repr(index)
    }
}

impl Listed for Model {
    type Sort = ProductSort;

    const ENTITY: &'static str = "product";

    fn id(&self) -> i32 {
        self.id
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.name.clone()];
        if let Some(category_id) = self.category_id {
            fields.push(category_id.to_string());
        }
        fields
    }
}

/// An empty category ID leaves the product uncategorized.
#[derive(Clone, Debug, Default, Validate)]
pub struct ProductForm {
    #[garde(custom(not_blank))]
    pub name:           String,
    #[garde(custom(number))]
    pub price:          String,
    #[garde(custom(integer))]
    pub stock_quantity: String,
    #[garde(custom(optional_integer))]
    pub category_id:    String,
}

impl Form for ProductForm {}

impl ProductForm {
    fn active_model(&self, id: Option<i32>) -> Result<ActiveModel> {
        self.check()?;
        Ok(ActiveModel {
            id:             id.map_or(NotSet, Unchanged),
            name:           Set(trimmed(&self.name)),
            price:          Set(parse_number("price", &self.price)?),
            stock_quantity: Set(parse_int("stock_quantity", &self.stock_quantity)?),
            category_id:    Set(parse_opt_int("category_id", &self.category_id)?),
        })
    }
}

impl From<&Model> for ProductForm {
    fn from(m: &Model) -> Self {
        Self {
            name:           m.name.clone(),
            price:          m.price.to_string(),
            stock_quantity: m.stock_quantity.to_string(),
            category_id:    m.category_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

/// Product table manager.
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

    /// Product name and quantity in stock for every product, by name.
    #[instrument(level = "debug", skip(self))]
    pub async fn stock_levels(&self) -> Result<Vec<(String, i32)>> {
        let levels: Vec<(String, i32)> = Entity::find()
            .select_only()
            .column(Column::Name)
            .column(Column::StockQuantity)
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .into_tuple()
            .all(self.table.connection())
            .await?;
        debug!("Stock levels for {} product(s)", levels.len());
        Ok(levels)
    }
}

#[async_trait]
impl RecordStore for Manager {
    type Form = ProductForm;
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
    async fn insert(&self, form: &ProductForm) -> Result<Model> {
        self.table.insert(form.active_model(None)?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn update(&self, id: i32, form: &ProductForm) -> Result<Model> {
        self.table.update(id, form.active_model(Some(id))?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i32) -> Result<()> {
        self.table.delete(id).await
    }
}
