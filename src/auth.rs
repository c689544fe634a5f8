//! Login, registration and per-role screen access.
use garde::Validate;
use sea_orm::DatabaseConnection;
use sha1::Digest;
use sha1::Sha1;
use strum::IntoEnumIterator;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::db::entity::Role;
use crate::db::entity::User;
use crate::db::entity::UserForm;
use crate::db::entity::UserMgr;
use crate::store::not_blank;
use crate::store::Form;
use crate::store::RecordStore;
use crate::types::DeskError;
use crate::types::Result;

const MIN_PASSWORD_LEN: usize = 6;

/// Unsalted SHA-1 of the UTF-8 bytes, as 40 uppercase hex digits. This is the format of `users.password_hash`.
pub fn hash_password(password: &str) -> String {
    format!("{:X}", Sha1::digest(password.as_bytes()))
}

/// Application screens.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::EnumString, strum::Display)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Screen {
    Categories,
    Suppliers,
    Customers,
    Orders,
    Shipments,
    Products,
    Employees,
    Users,
    Stock,
}

impl Role {
    pub fn can_open(self, screen: Screen) -> bool {
        match self {
            Role::Admin => true,
            Role::Employee => matches!(screen, Screen::Orders | Screen::Customers),
        }
    }

    pub fn screens(self) -> Vec<Screen> {
        Screen::iter().filter(|s| self.can_open(*s)).collect()
    }
}

/// A logged in user.
#[derive(Clone, Debug)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn can_open(&self, screen: Screen) -> bool {
        self.user.role.can_open(screen)
    }

    /// Fails with [`DeskError::Validation`] when the role may not open the screen.
    pub fn require(&self, screen: Screen) -> Result<()> {
        if self.can_open(screen) {
            Ok(())
        }
        else {
            Err(DeskError::validation(format!(
                "Role '{}' has no access to {screen}",
                self.role().name()
            )))
        }
    }
}

/// Registration input as typed into the sign-up form.
#[derive(Clone, Debug, Default, Validate)]
pub struct RegistrationForm {
    #[garde(custom(not_blank))]
    pub first_name:      String,
    #[garde(custom(not_blank))]
    pub last_name:       String,
    #[garde(custom(not_blank))]
    pub username:        String,
    #[garde(custom(not_blank))]
    pub password:        String,
    #[garde(custom(not_blank))]
    pub repeat_password: String,
    #[garde(skip)]
    pub role:            Option<Role>,
}

impl Form for RegistrationForm {}

impl RegistrationForm {
    /// Checks run in order and the first failure is reported.
    pub fn verify(&self) -> Result<()> {
        self.check()
            .map_err(|_| DeskError::validation("All fields must be filled in"))?;

        if self.password != self.repeat_password {
            return Err(DeskError::validation("Passwords do not match"));
        }

        if !password_acceptable(&self.password) {
            return Err(DeskError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long and contain a digit, an uppercase and a \
                 lowercase letter"
            )));
        }

        Ok(())
    }

    fn user_form(&self) -> UserForm {
        UserForm {
            username:   self.username.clone(),
            first_name: self.first_name.clone(),
            last_name:  self.last_name.clone(),
            role:       self.role.unwrap_or_default().name().to_string(),
            password:   self.password.clone(),
        }
    }
}

fn password_acceptable(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_numeric)
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
}

/// Authentication against the users table.
#[derive(Clone, Debug)]
pub struct Auth {
    users: UserMgr,
}

impl Auth {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: UserMgr::new(db),
        }
    }

    #[instrument(level = "debug", skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(DeskError::validation("Enter username and password"));
        }

        match self
            .users
            .get_by_credentials(username, &hash_password(password))
            .await?
        {
            Some(user) => {
                info!("User '{}' logged in as {}", user.username, user.role.name());
                Ok(Session { user })
            }
            None => {
                warn!("Failed login attempt for '{username}'");
                Err(DeskError::InvalidCredentials)
            }
        }
    }

    /// Create a new account. The role defaults to [`Role::Employee`].
    #[instrument(level = "debug", skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<User> {
        form.verify().inspect_err(|e| warn!("Registration rejected: {e}"))?;
        let user = self.users.insert(&form.user_form()).await?;
        info!("Registered user '{}' (#{})", user.username, user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestDesk;

    fn registration(username: &str, password: &str) -> RegistrationForm {
        RegistrationForm {
            first_name:      "Anna".into(),
            last_name:       "Smirnova".into(),
            username:        username.into(),
            password:        password.into(),
            repeat_password: password.into(),
            role:            None,
        }
    }

    #[test]
    fn test_hash_password() {
        assert_eq!(hash_password("abc"), "A9993E364706816ABA3E25717850C26C9CD0D89D");
        assert_eq!(hash_password(""), "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709");
        assert_eq!(hash_password("Secret1").len(), 40);
    }

    #[test]
    fn test_screen_access() {
        assert!(Role::Admin.can_open(Screen::Products));
        assert!(Role::Admin.can_open(Screen::Users));
        assert!(Role::Employee.can_open(Screen::Orders));
        assert!(Role::Employee.can_open(Screen::Customers));
        assert!(!Role::Employee.can_open(Screen::Products));
        assert_eq!(Role::Employee.screens(), vec![Screen::Customers, Screen::Orders]);
        assert_eq!(Role::Admin.screens().len(), 9);
        assert_eq!("stock".parse::<Screen>().unwrap(), Screen::Stock);
    }

    #[test]
    fn test_registration_checks() {
        assert!(registration("anna", "Secret1").verify().is_ok());

        let mut form = registration("anna", "Secret1");
        form.last_name = " ".into();
        assert_eq!(form.verify().unwrap_err().to_string(), "All fields must be filled in");

        let mut form = registration("anna", "Secret1");
        form.repeat_password = "Secret2".into();
        assert_eq!(form.verify().unwrap_err().to_string(), "Passwords do not match");

        // Digits of any script count.
        assert!(registration("anna", "Secret\u{0663}").verify().is_ok());

        for weak in ["Sec1", "secret1", "SECRET1", "Secrets"] {
            assert!(
                matches!(registration("anna", weak).verify(), Err(DeskError::Validation(_))),
                "'{weak}' must be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let desk = TestDesk::new().await.unwrap();
        let auth = desk.auth();

        let user = auth.register(&registration("anna", "Secret1")).await.unwrap();
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.password_hash, hash_password("Secret1"));

        let session = auth.login("anna", "Secret1").await.unwrap();
        assert_eq!(session.user().id, user.id);
        assert!(session.can_open(Screen::Orders));
        assert!(session.require(Screen::Suppliers).is_err());

        assert!(matches!(
            auth.login("anna", "secret1").await,
            Err(DeskError::InvalidCredentials)
        ));
        assert!(matches!(auth.login("", "Secret1").await, Err(DeskError::Validation(_))));

        assert!(matches!(
            auth.register(&registration("anna", "Other22")).await,
            Err(DeskError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_login_with_padded_username() {
        let desk = TestDesk::new().await.unwrap();
        let auth = desk.auth();

        let user = auth.register(&registration("ivan ", "Qwerty1")).await.unwrap();
        assert_eq!(user.username, "ivan");

        assert_eq!(auth.login("ivan ", "Qwerty1").await.unwrap().user().id, user.id);
        assert_eq!(auth.login("  ivan", "Qwerty1").await.unwrap().user().id, user.id);
        assert_eq!(auth.login("ivan", "Qwerty1").await.unwrap().user().id, user.id);
        assert!(matches!(
            auth.login("Ivan", "Qwerty1").await,
            Err(DeskError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_admin() {
        let desk = TestDesk::new().await.unwrap();
        let mut form = registration("boss", "Admin99");
        form.role = Some(Role::Admin);
        desk.auth().register(&form).await.unwrap();

        let session = desk.auth().login("boss", "Admin99").await.unwrap();
        assert_eq!(session.role(), Role::Admin);
        assert!(session.can_open(Screen::Stock));
    }
}
