//! Command-line front end.
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::error::ErrorKind;
use clap::CommandFactory;
use clap::Parser;
use comfy_table::CellAlignment;
use fieldx::fxstruct;
use garde::Validate;
use tracing::debug;
use tracing::instrument;

use crate::auth::RegistrationForm;
use crate::auth::Screen;
use crate::auth::Session;
#[cfg(feature = "pg")]
use crate::db::driver::pg::Pg;
#[cfg(feature = "sqlite")]
use crate::db::driver::sqlite::Sqlite;
#[cfg(any(feature = "pg", feature = "sqlite"))]
use crate::db::driver::DatabaseDriver;
use crate::db::entity::*;
use crate::desk::Desk;
use crate::store::Listed;
use crate::store::RecordStore;
use crate::store::SortKey;

#[derive(Debug, Clone, clap::Parser, Validate)]
#[fxstruct(no_new, get(copy))]
#[clap(about, version, name = "inventory-desk")]
pub(crate) struct Cli {
    /// Use PostgreSQL instead of SQLite.
    #[clap(long, env = "DESK_PG", default_value_t = false)]
    #[garde(custom(Self::backend_available))]
    pg: bool,

    /// SQLite database file.
    #[clap(long, env = "DESK_SQLITE_PATH", default_value = "inventory.db")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    sqlite_path: PathBuf,

    #[clap(long, env = "DESK_PG_HOST", default_value = "localhost")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_host: String,

    #[clap(long, env = "DESK_PG_PORT", default_value_t = 5432)]
    #[garde(skip)]
    pg_port: u16,

    #[clap(long, env = "DESK_PG_USER", default_value = "desk")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_user: String,

    #[clap(long, env = "DESK_PG_PASSWORD", hide_env_values = true, default_value = "desk")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_password: String,

    #[clap(long, env = "DESK_PG_DATABASE", default_value = "inventory")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_database: String,

    /// Base directory category image paths are relative to.
    #[clap(long, env = "DESK_IMAGES_DIR", default_value = ".")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    images_dir: PathBuf,

    /// File to send log into
    #[clap(long, env = "DESK_LOG_FILE")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    log_file: Option<PathBuf>,

    #[clap(subcommand)]
    #[fieldx(get(clone))]
    #[garde(skip)]
    action: Command,
}

impl Cli {
    fn backend_available(value: &bool, _ctx: &()) -> garde::Result {
        let (feature, enabled) = if *value {
            ("pg", cfg!(feature = "pg"))
        }
        else {
            ("sqlite", cfg!(feature = "sqlite"))
        };

        if enabled {
            Ok(())
        }
        else {
            Err(garde::Error::new(format!("Build feature '{feature}' must be enabled.")))
        }
    }
}

/// Who runs a command. Every data command logs in first and checks the role's screen access.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct Credentials {
    #[clap(long, env = "DESK_USERNAME")]
    username: String,
    #[clap(long, env = "DESK_PASSWORD", hide_env_values = true)]
    password: String,
}

impl Credentials {
    async fn authorize(&self, desk: &Desk, screen: Screen) -> anyhow::Result<Session> {
        let session = desk.auth().login(&self.username, &self.password).await?;
        session.require(screen)?;
        debug!("'{}' may open {screen}", session.user().username);
        Ok(session)
    }
}

#[derive(Debug, Clone, clap::Subcommand)]
pub(crate) enum Command {
    /// Create or upgrade the database schema.
    Migrate,

    /// Register a new user.
    Register {
        #[clap(long)]
        username:        String,
        #[clap(long)]
        first_name:      String,
        #[clap(long)]
        last_name:       String,
        #[clap(long, env = "DESK_PASSWORD", hide_env_values = true)]
        password:        String,
        #[clap(long)]
        repeat_password: String,
        /// admin or employee
        #[clap(long)]
        role:            Option<Role>,
    },

    /// Check credentials and show the screens the user may open.
    Login {
        #[clap(flatten)]
        credentials: Credentials,
    },

    /// Print a screen's rows.
    List {
        #[clap(flatten)]
        credentials: Credentials,
        screen:      Screen,
        /// Case-insensitive text to look for.
        #[clap(long, short, default_value = "")]
        filter: String,
        /// Sort key name; unknown names fall back to the default order.
        #[clap(long, short, default_value = "none")]
        sort:        String,
    },

    /// Delete a row of a screen.
    Delete {
        #[clap(flatten)]
        credentials: Credentials,
        screen:      Screen,
        id:          i32,
    },

    /// Print stock level of every product.
    Stock {
        #[clap(flatten)]
        credentials: Credentials,
    },

    /// Print the resolved image file of a category.
    Image {
        #[clap(flatten)]
        credentials: Credentials,
        category_id: i32,
    },
}

/// How a record is printed as a table row.
trait Tabular {
    const HEADER: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl Tabular for Category {
    const HEADER: &'static [&'static str] = &["ID", "Name", "Description", "Image"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.description.clone().unwrap_or_default(),
            self.image_path.clone().unwrap_or_default(),
        ]
    }
}

impl Tabular for Supplier {
    const HEADER: &'static [&'static str] = &["ID", "Name", "Contact", "Phone", "Address"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.contact_name.clone(),
            self.phone.clone(),
            self.address.clone(),
        ]
    }
}

impl Tabular for Customer {
    const HEADER: &'static [&'static str] = &["ID", "Last name", "First name", "Email", "Phone"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.last_name.clone(),
            self.first_name.clone(),
            self.email.clone(),
            self.phone.clone(),
        ]
    }
}

impl Tabular for Order {
    const HEADER: &'static [&'static str] = &["ID", "Customer", "Employee", "Total"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.customer_id.to_string(),
            self.employee_id.to_string(),
            self.total_amount.to_string(),
        ]
    }
}

impl Tabular for Shipment {
    const HEADER: &'static [&'static str] = &["ID", "Supplier", "Employee", "Total cost"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.supplier_id.to_string(),
            self.employee_id.to_string(),
            format!("{:.2}", self.total_cost),
        ]
    }
}

impl Tabular for Product {
    const HEADER: &'static [&'static str] = &["ID", "Name", "Price", "In stock", "Category"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            format!("{:.2}", self.price),
            self.stock_quantity.to_string(),
            self.category_id.map(|id| id.to_string()).unwrap_or_default(),
        ]
    }
}

impl Tabular for Employee {
    const HEADER: &'static [&'static str] = &["ID", "User"];

    fn cells(&self) -> Vec<String> {
        vec![self.id.to_string(), self.user_id.to_string()]
    }
}

impl Tabular for User {
    const HEADER: &'static [&'static str] = &["ID", "Username", "First name", "Last name", "Role"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.username.clone(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.role.name().to_string(),
        ]
    }
}

fn new_table(header: &[&str]) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_FULL_CONDENSED)
        .set_header(header.to_vec());
    table
}

/// The application: parsed command line plus what it takes to run one command.
#[derive(Debug)]
pub struct DeskApp {
    cli: Cli,
}

impl DeskApp {
    /// Parse the process arguments. Exits on `--help` or invalid options the way clap does.
    pub fn from_env() -> Self {
        Self::from_cli(Cli::parse())
    }

    pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone, {
        Ok(Self::from_cli(Cli::try_parse_from(args)?))
    }

    fn from_cli(cli: Cli) -> Self {
        if let Err(err) = cli.validate() {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err).exit();
        }
        Self { cli }
    }

    pub fn setup_tracing(&self) -> anyhow::Result<()> {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let dest_writer = Mutex::new(if let Some(log_file) = self.cli.log_file() {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(log_file)?;
            Box::new(file) as Box<dyn io::Write + Send>
        }
        else {
            Box::new(io::stderr()) as Box<dyn io::Write + Send>
        });

        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_writer(dest_writer))
            .try_init()?;

        debug!("Tracing initialized");
        Ok(())
    }

    #[cfg(feature = "sqlite")]
    async fn connect_sqlite(&self) -> anyhow::Result<Desk> {
        use std::path::Path;

        let path = self.cli.sqlite_path();
        let db_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let db_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Bad SQLite database path: {}", path.display()))?;

        let driver = Sqlite::connect(db_dir, db_name).await?;
        driver.configure().await?;
        Ok(Desk::from_driver(&driver))
    }

    #[cfg(feature = "pg")]
    async fn connect_pg(&self) -> anyhow::Result<Desk> {
        let cli = &self.cli;
        let driver = Pg::builder()
            .host(cli.pg_host())
            .port(cli.pg_port())
            .user(cli.pg_user())
            .password(cli.pg_password())
            .database(cli.pg_database())
            .build()?;
        driver.connect().await?;
        driver.configure().await?;
        Ok(Desk::from_driver(&*driver))
    }

    #[instrument(level = "debug", skip(self))]
    async fn connect(&self) -> anyhow::Result<Desk> {
        #[cfg(feature = "pg")]
        if self.cli.pg() {
            return self.connect_pg().await;
        }

        #[cfg(feature = "sqlite")]
        if !self.cli.pg() {
            return self.connect_sqlite().await;
        }

        // Validation rejects a backend that is compiled out.
        Err(anyhow::anyhow!("No database backend available"))
    }

    async fn list<S>(&self, store: S, filter: &str, sort: &str) -> anyhow::Result<()>
    where
        S: RecordStore,
        S::Record: Tabular, {
        let mut lv = crate::view::ListView::open(store).await?;
        lv.refresh_by_name(filter, sort);

        let mut table = new_table(<S::Record as Tabular>::HEADER);
        for row in lv.view() {
            table.add_row(row.cells());
        }
        if let Some(column) = table.column_mut(0) {
            column.set_cell_alignment(CellAlignment::Right);
        }

        println!("{table}");
        println!(
            "{} of {} row(s), sorted by {}",
            lv.view().len(),
            lv.source().len(),
            lv.sort()
        );
        let options = <<S::Record as Listed>::Sort as SortKey<S::Record>>::options();
        debug!(
            "Sort options: {}",
            options.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
        Ok(())
    }

    async fn delete<S: RecordStore>(&self, store: S, id: i32) -> anyhow::Result<()> {
        let mut lv = crate::view::ListView::open(store).await?;
        lv.delete(id).await?;
        println!("Deleted {} #{id}", <S::Record as Listed>::ENTITY);
        Ok(())
    }

    async fn stock(&self, desk: &Desk) -> anyhow::Result<()> {
        let mut table = new_table(&["Product", "In stock"]);
        for (name, qty) in desk.products().stock_levels().await? {
            table.add_row(vec![name, qty.to_string()]);
        }
        if let Some(column) = table.column_mut(1) {
            column.set_cell_alignment(CellAlignment::Right);
        }
        println!("{table}");
        Ok(())
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let desk = self.connect().await?;

        match self.cli.action() {
            Command::Migrate => {
                desk.migrate().await?;
                println!("Schema is up to date.");
            }
            Command::Register {
                username,
                first_name,
                last_name,
                password,
                repeat_password,
                role,
            } => {
                let user = desk
                    .auth()
                    .register(&RegistrationForm {
                        first_name,
                        last_name,
                        username,
                        password,
                        repeat_password,
                        role,
                    })
                    .await?;
                println!("Registered '{}' as {}.", user.username, user.role.name());
            }
            Command::Login { credentials } => {
                let session = desk.auth().login(&credentials.username, &credentials.password).await?;
                println!("Welcome, {}!", session.user().first_name);
                let screens = session.role().screens();
                println!(
                    "Available screens: {}",
                    screens.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
                );
            }
            Command::List {
                credentials,
                screen,
                filter,
                sort,
            } => {
                credentials.authorize(&desk, screen).await?;
                match screen {
                    Screen::Categories => self.list(desk.categories(), &filter, &sort).await?,
                    Screen::Suppliers => self.list(desk.suppliers(), &filter, &sort).await?,
                    Screen::Customers => self.list(desk.customers(), &filter, &sort).await?,
                    Screen::Orders => self.list(desk.orders(), &filter, &sort).await?,
                    Screen::Shipments => self.list(desk.shipments(), &filter, &sort).await?,
                    Screen::Products => self.list(desk.products(), &filter, &sort).await?,
                    Screen::Employees => self.list(desk.employees(), &filter, &sort).await?,
                    Screen::Users => self.list(desk.users(), &filter, &sort).await?,
                    Screen::Stock => self.stock(&desk).await?,
                }
            }
            Command::Delete { credentials, screen, id } => {
                credentials.authorize(&desk, screen).await?;
                match screen {
                    Screen::Categories => self.delete(desk.categories(), id).await?,
                    Screen::Suppliers => self.delete(desk.suppliers(), id).await?,
                    Screen::Customers => self.delete(desk.customers(), id).await?,
                    Screen::Orders => self.delete(desk.orders(), id).await?,
                    Screen::Shipments => self.delete(desk.shipments(), id).await?,
                    Screen::Products => self.delete(desk.products(), id).await?,
                    Screen::Employees => self.delete(desk.employees(), id).await?,
                    Screen::Users => self.delete(desk.users(), id).await?,
                    Screen::Stock => anyhow::bail!("Nothing to delete on the stock screen"),
                }
            }
            Command::Stock { credentials } => {
                credentials.authorize(&desk, Screen::Stock).await?;
                self.stock(&desk).await?
            }
            Command::Image {
                credentials,
                category_id,
            } => {
                credentials.authorize(&desk, Screen::Categories).await?;
                let category = desk
                    .categories()
                    .get_by_id(category_id)
                    .await?
                    .ok_or_else(|| crate::types::DeskError::not_found(Category::ENTITY, category_id))?;
                match category.image_file(&self.cli.images_dir()) {
                    Some(path) => println!("{}", path.display()),
                    None => println!("Category '{}' has no image", category.name),
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = vec![
            "cmd",
            "--sqlite-path",
            "/tmp/shop.db",
            "list",
            "customers",
            "--username",
            "clerk",
            "--password",
            "Passw0rd",
            "--filter",
            "ivan",
            "-s",
            "last-name-desc",
        ];
        let cli = Cli::try_parse_from(args).expect("Failed to parse CLI arguments");
        assert_eq!(cli.sqlite_path(), PathBuf::from("/tmp/shop.db"));
        assert!(!cli.pg());
        match cli.action() {
            Command::List {
                credentials,
                screen,
                filter,
                sort,
            } => {
                assert_eq!(credentials.username, "clerk");
                assert_eq!(credentials.password, "Passw0rd");
                assert_eq!(screen, Screen::Customers);
                assert_eq!(filter, "ivan");
                assert_eq!(sort, "last-name-desc");
            }
            other => panic!("Unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_register_role() {
        let args = vec![
            "cmd",
            "register",
            "--username",
            "boss",
            "--first-name",
            "Big",
            "--last-name",
            "Boss",
            "--password",
            "Admin99",
            "--repeat-password",
            "Admin99",
            "--role",
            "admin",
        ];
        let cli = Cli::try_parse_from(args).expect("Failed to parse CLI arguments");
        assert!(matches!(cli.action(), Command::Register { role: Some(Role::Admin), .. }));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_rejects_unknown_screen() {
        assert!(Cli::try_parse_from(["cmd", "list", "warehouses", "--username", "a", "--password", "b"]).is_err());
    }

    #[tokio::test]
    async fn test_screen_authorization() {
        let desk = crate::test::TestDesk::new().await.unwrap();
        desk.add_user("clerk", Role::Employee).await.unwrap();
        desk.add_user("boss", Role::Admin).await.unwrap();

        let as_user = |username: &str, password: &str| Credentials {
            username: username.into(),
            password: password.into(),
        };

        let clerk = as_user("clerk", "Passw0rd");
        assert!(clerk.authorize(&desk, Screen::Customers).await.is_ok());
        assert!(clerk.authorize(&desk, Screen::Orders).await.is_ok());
        let err = clerk.authorize(&desk, Screen::Products).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::types::DeskError>(),
            Some(crate::types::DeskError::Validation(_))
        ));

        assert!(as_user("boss", "Passw0rd").authorize(&desk, Screen::Stock).await.is_ok());

        let err = as_user("clerk", "wrong").authorize(&desk, Screen::Customers).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::types::DeskError>(),
            Some(crate::types::DeskError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_tabular() {
        let c = Customer {
            id:         3,
            first_name: "Ivan".into(),
            last_name:  "Ivanov".into(),
            email:      "ivan@example.com".into(),
            phone:      "555".into(),
        };
        assert_eq!(c.cells().len(), Customer::HEADER.len());
        assert_eq!(c.cells()[1], "Ivanov");
    }
}
