use std::cmp::Ordering;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use garde::Validate;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::ActiveValue::Set;
use sea_orm::ActiveValue::Unchanged;
use sea_orm::QueryFilter;
use sea_orm::QueryOrder;
use sea_orm::TransactionTrait;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::instrument;

use crate::db::table::Table;
use crate::store::not_blank;
use crate::store::text_cmp;
use crate::store::trimmed;
use crate::store::trimmed_opt;
use crate::store::Form;
use crate::store::Listed;
use crate::store::RecordStore;
use crate::store::SortKey;
use crate::types::Result;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:          i32,
    pub name:        String,
    pub description: Option<String>,
    /// Image location relative to the application's images base directory.
    pub image_path:  Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Resolve the category image against `base_dir`. Only existing files are returned.
    pub fn image_file(&self, base_dir: &Path) -> Option<PathBuf> {
        let rel = self.image_path.as_deref().map(str::trim).filter(|p| !p.is_empty())?;
        let full = base_dir.join(rel);
        full.is_file().then_some(full)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::EnumIter, strum::EnumString, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(usize)]
pub enum CategorySort {
    #[default]
    #[strum(serialize = "none")]
    Unsorted,
    NameAsc,
    NameDesc,
}

fn by_name(a: &Model, b: &Model) -> Ordering {
    text_cmp(&a.name, &b.name)
}

fn by_name_desc(a: &Model, b: &Model) -> Ordering {
    text_cmp(&b.name, &a.name)
}

impl SortKey<Model> for CategorySort {
    fn comparator(self) -> fn(&Model, &Model) -> Ordering {
        match self {
            Self::Unsorted | Self::NameAsc => by_name,
            Self::NameDesc => by_name_desc,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::from_repr(index)
    }
}

impl Listed for Model {
    type Sort = CategorySort;

    const ENTITY: &'static str = "category";

    fn id(&self) -> i32 {
        self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone()]
    }
}

/// Description and image path are optional; blank values are stored as NULL.
#[derive(Clone, Debug, Default, Validate)]
pub struct CategoryForm {
    #[garde(custom(not_blank))]
    pub name:        String,
    #[garde(skip)]
    pub description: String,
    #[garde(skip)]
    pub image_path:  String,
}

impl Form for CategoryForm {}

impl CategoryForm {
    fn active_model(&self, id: Option<i32>) -> Result<ActiveModel> {
        self.check()?;
        Ok(ActiveModel {
            id:          id.map_or(NotSet, Unchanged),
            name:        Set(trimmed(&self.name)),
            description: Set(trimmed_opt(&self.description)),
            image_path:  Set(trimmed_opt(&self.image_path)),
        })
    }
}

impl From<&Model> for CategoryForm {
    fn from(m: &Model) -> Self {
        Self {
            name:        m.name.clone(),
            description: m.description.clone().unwrap_or_default(),
            image_path:  m.image_path.clone().unwrap_or_default(),
        }
    }
}

/// Category table manager.
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
    type Form = CategoryForm;
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
    async fn insert(&self, form: &CategoryForm) -> Result<Model> {
        self.table.insert(form.active_model(None)?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn update(&self, id: i32, form: &CategoryForm) -> Result<Model> {
        self.table.update(id, form.active_model(Some(id))?).await
    }

    /// Products of the category lose their category reference first; both steps commit together.
    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i32) -> Result<()> {
        let transaction = self.table.connection().begin().await?;

        let detached = super::product::Entity::update_many()
            .col_expr(super::product::Column::CategoryId, Expr::value(Option::<i32>::None))
            .filter(super::product::Column::CategoryId.eq(id))
            .exec(&transaction)
            .await?;
        debug!("Detached {} product(s) from category #{id}", detached.rows_affected);

        self.table.delete_with(&transaction, id).await?;

        transaction.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(image_path: Option<&str>) -> Model {
        Model {
            id:          1,
            name:        "Beverages".into(),
            description: None,
            image_path:  image_path.map(String::from),
        }
    }

    #[test]
    fn test_image_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Images")).unwrap();
        std::fs::write(dir.path().join("Images").join("tea.png"), b"png").unwrap();

        let found = category(Some("Images/tea.png")).image_file(dir.path());
        assert_eq!(found, Some(dir.path().join("Images/tea.png")));

        assert_eq!(category(Some("Images/coffee.png")).image_file(dir.path()), None);
        assert_eq!(category(Some("  ")).image_file(dir.path()), None);
        assert_eq!(category(None).image_file(dir.path()), None);
    }

    #[test]
    fn test_blank_optionals_become_null() {
        let form = CategoryForm {
            name:        " Dairy ".into(),
            description: " ".into(),
            image_path:  String::new(),
        };
        let am = form.active_model(None).unwrap();
        assert_eq!(am.name, Set("Dairy".to_string()));
        assert_eq!(am.description, Set(None));
        assert_eq!(am.image_path, Set(None));
    }

    #[test]
    fn test_sort_fallback() {
        assert_eq!(CategorySort::parse_or_default("name-desc"), CategorySort::NameDesc);
        assert_eq!(CategorySort::index_or_default(3), CategorySort::Unsorted);
    }
}
