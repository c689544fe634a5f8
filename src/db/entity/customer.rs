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
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:         i32,
    pub first_name: String,
    pub last_name:  String,
    pub email:      String,
    pub phone:      String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::EnumIter, strum::EnumString, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(usize)]
pub enum CustomerSort {
    #[default]
    #[strum(serialize = "none")]
    Unsorted,
    LastNameAsc,
    LastNameDesc,
    FirstNameAsc,
    FirstNameDesc,
}

fn by_last_name(a: &Model, b: &Model) -> Ordering {
    text_cmp(&a.last_name, &b.last_name).then_with(|| text_cmp(&a.first_name, &b.first_name))
}

fn by_last_name_desc(a: &Model, b: &Model) -> Ordering {
    text_cmp(&b.last_name, &a.last_name).then_with(|| text_cmp(&a.first_name, &b.first_name))
}

fn by_first_name(a: &Model, b: &Model) -> Ordering {
    text_cmp(&a.first_name, &b.first_name).then_with(|| text_cmp(&a.last_name, &b.last_name))
}

fn by_first_name_desc(a: &Model, b: &Model) -> Ordering {
    text_cmp(&b.first_name, &a.first_name).then_with(|| text_cmp(&a.last_name, &b.last_name))
}

impl SortKey<Model> for CustomerSort {
    fn comparator(self) -> fn(&Model, &Model) -> Ordering {
        match self {
            Self::Unsorted | Self::LastNameAsc => by_last_name,
            Self::LastNameDesc => by_last_name_desc,
            Self::FirstNameAsc => by_first_name,
            Self::FirstNameDesc => by_first_name_desc,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::from_repr(index)
    }
}

impl Listed for Model {
    type Sort = CustomerSort;

    const ENTITY: &'static str = "customer";

    fn id(&self) -> i32 {
        self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.last_name.clone(),
            self.first_name.clone(),
            self.email.clone(),
            self.phone.clone(),
        ]
    }
}

#[derive(Clone, Debug, Default, Validate)]
pub struct CustomerForm {
    #[garde(custom(not_blank))]
    pub first_name: String,
    #[garde(custom(not_blank))]
    pub last_name:  String,
    #[garde(custom(not_blank))]
    pub email:      String,
    #[garde(custom(not_blank))]
    pub phone:      String,
}

impl Form for CustomerForm {}

impl CustomerForm {
    fn active_model(&self, id: Option<i32>) -> Result<ActiveModel> {
        self.check()?;
        Ok(ActiveModel {
            id:         id.map_or(NotSet, Unchanged),
            first_name: Set(trimmed(&self.first_name)),
            last_name:  Set(trimmed(&self.last_name)),
            email:      Set(trimmed(&self.email)),
            phone:      Set(trimmed(&self.phone)),
        })
    }
}

impl From<&Model> for CustomerForm {
    fn from(m: &Model) -> Self {
        Self {
            first_name: m.first_name.clone(),
            last_name:  m.last_name.clone(),
            email:      m.email.clone(),
            phone:      m.phone.clone(),
        }
    }
}

/// Customer table manager.
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
    type Form = CustomerForm;
    type Record = Model;

    #[instrument(level = "debug", skip(self))]
    async fn list_all(&self) -> Result<Vec<Model>> {
        Ok(Entity::find()
            .order_by_asc(Column::LastName)
            .order_by_asc(Column::FirstName)
            .all(self.table.connection())
            .await?)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Model>> {
        self.table.by_id(id).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn insert(&self, form: &CustomerForm) -> Result<Model> {
        self.table.insert(form.active_model(None)?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn update(&self, id: i32, form: &CustomerForm) -> Result<Model> {
        self.table.update(id, form.active_model(Some(id))?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i32) -> Result<()> {
        if has_dependents::<super::order::Entity, _>(self.table.connection(), super::order::Column::CustomerId, id).await?
        {
            warn!("Customer #{id} still has orders");
            return Err(DeskError::conflict(
                "The customer cannot be deleted because there are orders related to it",
            ));
        }
        self.table.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: i32, first: &str, last: &str) -> Model {
        Model {
            id,
            first_name: first.into(),
            last_name: last.into(),
            email: format!("{}@example.com", first.to_lowercase()),
            phone: format!("+7 900 000-00-{id:02}"),
        }
    }

    #[test]
    fn test_sort_keys() {
        let ivanov = customer(1, "Ivan", "Ivanov");
        let petrov = customer(2, "Petr", "Petrov");
        let anna = customer(3, "Anna", "Petrov");

        assert_eq!(CustomerSort::LastNameAsc.comparator()(&ivanov, &petrov), Ordering::Less);
        assert_eq!(CustomerSort::LastNameDesc.comparator()(&ivanov, &petrov), Ordering::Greater);
        // Same last name: the first name decides, ascending, in both directions.
        assert_eq!(CustomerSort::LastNameDesc.comparator()(&anna, &petrov), Ordering::Less);
        assert_eq!(CustomerSort::FirstNameAsc.comparator()(&anna, &ivanov), Ordering::Less);
        assert_eq!(CustomerSort::FirstNameDesc.comparator()(&anna, &ivanov), Ordering::Greater);
    }

    #[test]
    fn test_sort_key_names() {
        assert_eq!(CustomerSort::parse_or_default("last-name-desc"), CustomerSort::LastNameDesc);
        assert_eq!(CustomerSort::parse_or_default("LAST-NAME-DESC"), CustomerSort::LastNameDesc);
        assert_eq!(CustomerSort::parse_or_default("by-shoe-size"), CustomerSort::Unsorted);
        assert_eq!(CustomerSort::index_or_default(4), CustomerSort::FirstNameDesc);
        assert_eq!(CustomerSort::index_or_default(99), CustomerSort::Unsorted);
        assert_eq!(CustomerSort::Unsorted.to_string(), "none");
        assert_eq!(CustomerSort::options().len(), 5);
    }

    #[test]
    fn test_matches() {
        let c = customer(1, "Ivan", "Ivanov");
        assert!(c.matches(""));
        assert!(c.matches("vano"));
        assert!(c.matches("example.com"));
        assert!(!c.matches("petr"));
    }

    #[test]
    fn test_form_validation() {
        let mut form = CustomerForm::from(&customer(1, "Ivan", "Ivanov"));
        assert!(form.active_model(None).is_ok());
        form.phone = "   ".into();
        assert!(matches!(form.active_model(None), Err(DeskError::Validation(_))));
    }
}
