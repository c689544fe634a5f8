use std::cmp::Ordering;
use std::str::FromStr;

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

use crate::auth::hash_password;
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

/// What a user is allowed to open. Stored by name.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[default]
    #[sea_orm(string_value = "employee")]
    Employee,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        }
    }
}

impl FromStr for Role {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "employee" => Ok(Self::Employee),
            _ => Err(DeskError::validation(format!("role: unknown role '{s}'"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:            i32,
    #[sea_orm(unique)]
    pub username:      String,
    /// Uppercase hex SHA-1 of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name:    String,
    pub last_name:     String,
    pub role:          Role,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::EnumIter, strum::EnumString, strum::Display, strum::FromRepr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(usize)]
pub enum UserSort {
    #[default]
    #[strum(serialize = "none")]
    Unsorted,
    UsernameAsc,
    UsernameDesc,
    LastNameAsc,
    LastNameDesc,
}

fn by_username(a: &Model, b: &Model) -> Ordering {
    text_cmp(&a.username, &b.username)
}

fn by_username_desc(a: &Model, b: &Model) -> Ordering {
    text_cmp(&b.username, &a.username)
}

fn by_last_name(a: &Model, b: &Model) -> Ordering {
    text_cmp(&a.last_name, &b.last_name).then_with(|| text_cmp(&a.first_name, &b.first_name))
}

fn by_last_name_desc(a: &Model, b: &Model) -> Ordering {
    text_cmp(&b.last_name, &a.last_name).then_with(|| text_cmp(&a.first_name, &b.first_name))
}

impl SortKey<Model> for UserSort {
    fn comparator(self) -> fn(&Model, &Model) -> Ordering {
        match self {
            Self::Unsorted | Self::UsernameAsc => by_username,
            Self::UsernameDesc => by_username_desc,
            Self::LastNameAsc => by_last_name,
            Self::LastNameDesc => by_last_name_desc,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::from_repr(index)
    }
}

impl Listed for Model {
    type Sort = UserSort;

    const ENTITY: &'static str = "user";

    fn id(&self) -> i32 {
        self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.username.clone(), self.first_name.clone(), self.last_name.clone()]
    }
}

/// User account input. The password is plain text; it is hashed before it reaches the table.
///
/// On update a blank password keeps the current one. A blank role means [`Role::Employee`].
#[derive(Clone, Debug, Default, Validate)]
pub struct UserForm {
    #[garde(custom(not_blank))]
    pub username:   String,
    #[garde(custom(not_blank))]
    pub first_name: String,
    #[garde(custom(not_blank))]
    pub last_name:  String,
    #[garde(skip)]
    pub role:       String,
    #[garde(skip)]
    pub password:   String,
}

impl Form for UserForm {}

impl UserForm {
    pub fn role(&self) -> Result<Role> {
        let role = self.role.trim();
        if role.is_empty() {
            Ok(Role::default())
        }
        else {
            role.parse()
        }
    }

    fn active_model(&self, id: Option<i32>) -> Result<ActiveModel> {
        self.check()?;

        let password_hash = if self.password.is_empty() {
            if id.is_none() {
                return Err(DeskError::validation("password: must not be empty"));
            }
            NotSet
        }
        else {
            Set(hash_password(&self.password))
        };

        Ok(ActiveModel {
            id: id.map_or(NotSet, Unchanged),
            username: Set(trimmed(&self.username)),
            password_hash,
            first_name: Set(trimmed(&self.first_name)),
            last_name: Set(trimmed(&self.last_name)),
            role: Set(self.role()?),
        })
    }
}

impl From<&Model> for UserForm {
    fn from(m: &Model) -> Self {
        Self {
            username:   m.username.clone(),
            first_name: m.first_name.clone(),
            last_name:  m.last_name.clone(),
            role:       m.role.name().to_string(),
            password:   String::new(),
        }
    }
}

/// User table manager.
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

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Model>> {
        Ok(Entity::find()
            .filter(Column::Username.eq(username.trim()))
            .one(self.table.connection())
            .await?)
    }

    /// Look a user up by username and exact password hash. The username is trimmed the way it is when stored.
    #[instrument(level = "debug", skip(self, password_hash))]
    pub async fn get_by_credentials(&self, username: &str, password_hash: &str) -> Result<Option<Model>> {
        Ok(Entity::find()
            .filter(Column::Username.eq(username.trim()))
            .filter(Column::PasswordHash.eq(password_hash))
            .one(self.table.connection())
            .await?)
    }

    async fn ensure_username_free(&self, username: &str, id: Option<i32>) -> Result<()> {
        match self.get_by_username(username).await? {
            Some(user) if Some(user.id) != id => {
                warn!("Username '{}' is already taken", user.username);
                Err(DeskError::conflict(format!(
                    "A user with username '{}' already exists",
                    user.username
                )))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for Manager {
    type Form = UserForm;
    type Record = Model;

    #[instrument(level = "debug", skip(self))]
    async fn list_all(&self) -> Result<Vec<Model>> {
        Ok(Entity::find()
            .order_by_asc(Column::Username)
            .all(self.table.connection())
            .await?)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Model>> {
        self.table.by_id(id).await
    }

    #[instrument(level = "debug", skip(self, form), fields(username = %form.username))]
    async fn insert(&self, form: &UserForm) -> Result<Model> {
        let am = form.active_model(None)?;
        self.ensure_username_free(&form.username, None).await?;
        self.table.insert(am).await
    }

    #[instrument(level = "debug", skip(self, form), fields(username = %form.username))]
    async fn update(&self, id: i32, form: &UserForm) -> Result<Model> {
        let am = form.active_model(Some(id))?;
        self.ensure_username_free(&form.username, Some(id)).await?;
        self.table.update(id, am).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i32) -> Result<()> {
        if has_dependents::<super::employee::Entity, _>(self.table.connection(), super::employee::Column::UserId, id)
            .await?
        {
            warn!("User #{id} is still an employee");
            return Err(DeskError::conflict(
                "The user cannot be deleted because there is an employee related to it",
            ));
        }
        self.table.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(password: &str) -> UserForm {
        UserForm {
            username:   " jdoe ".into(),
            first_name: "John".into(),
            last_name:  "Doe".into(),
            role:       String::new(),
            password:   password.into(),
        }
    }

    #[test]
    fn test_role_names() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Employee.name(), "employee");
        assert_eq!(Role::default(), Role::Employee);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_form_hashes_password() {
        let am = form("abc").active_model(None).unwrap();
        assert_eq!(am.username, Set("jdoe".to_string()));
        assert_eq!(am.role, Set(Role::Employee));
        assert_eq!(
            am.password_hash,
            Set("A9993E364706816ABA3E25717850C26C9CD0D89D".to_string())
        );
    }

    #[test]
    fn test_blank_password() {
        assert!(matches!(form("").active_model(None), Err(DeskError::Validation(_))));
        // Editing keeps the stored hash.
        let am = form("").active_model(Some(3)).unwrap();
        assert_eq!(am.password_hash, NotSet);
    }

    #[test]
    fn test_unknown_role() {
        let mut f = form("abc");
        f.role = "owner".into();
        assert!(matches!(f.active_model(None), Err(DeskError::Validation(_))));
    }
}
