//! Fixtures for tests: a migrated SQLite database in a temporary directory.
#![cfg(any(test, feature = "test"))]

use std::ops::Deref;

use tempfile::TempDir;

use crate::db::driver::sqlite::Sqlite;
use crate::db::driver::DatabaseDriver;
use crate::db::entity::*;
use crate::desk::Desk;
use crate::store::RecordStore;
use crate::types::Result;

pub struct TestDesk {
    desk: Desk,
    // Must be dropped after the connection.
    _dir: TempDir,
}

impl TestDesk {
    pub async fn new() -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new().prefix("inventory-desk").tempdir()?;
        let driver = Sqlite::connect(dir.path(), "test.db").await?;
        driver.configure().await?;
        let desk = Desk::from_driver(&driver);
        desk.migrate().await?;
        Ok(Self { desk, _dir: dir })
    }

    pub async fn add_user(&self, username: &str, role: Role) -> Result<User> {
        self.users()
            .insert(&UserForm {
                username:   username.into(),
                first_name: "Test".into(),
                last_name:  username.into(),
                role:       role.name().into(),
                password:   "Passw0rd".into(),
            })
            .await
    }

    /// A user with an employee record.
    pub async fn add_employee(&self, username: &str) -> Result<Employee> {
        let user = self.add_user(username, Role::Employee).await?;
        self.employees()
            .insert(&EmployeeForm {
                user_id: user.id.to_string(),
            })
            .await
    }

    pub async fn add_customer(&self, first_name: &str, last_name: &str) -> Result<Customer> {
        self.customers()
            .insert(&CustomerForm {
                first_name: first_name.into(),
                last_name:  last_name.into(),
                email:      format!("{}@example.com", first_name.to_lowercase()),
                phone:      "+1 555 0100".into(),
            })
            .await
    }

    pub async fn add_supplier(&self, name: &str) -> Result<Supplier> {
        self.suppliers()
            .insert(&SupplierForm {
                name:         name.into(),
                contact_name: format!("{name} Sales"),
                phone:        "+1 555 0199".into(),
                address:      "1 Warehouse Rd".into(),
            })
            .await
    }

    pub async fn add_category(&self, name: &str) -> Result<Category> {
        self.categories()
            .insert(&CategoryForm {
                name: name.into(),
                ..Default::default()
            })
            .await
    }

    pub async fn add_product(&self, name: &str, price: f64, stock: i32, category: Option<&Category>) -> Result<Product> {
        self.products()
            .insert(&ProductForm {
                name:           name.into(),
                price:          price.to_string(),
                stock_quantity: stock.to_string(),
                category_id:    category.map(|c| c.id.to_string()).unwrap_or_default(),
            })
            .await
    }

    pub async fn add_order(&self, customer: &Customer, employee: &Employee, total: i32) -> Result<Order> {
        self.orders()
            .insert(&OrderForm {
                customer_id:  customer.id.to_string(),
                employee_id:  employee.id.to_string(),
                total_amount: total.to_string(),
            })
            .await
    }

    pub async fn add_shipment(&self, supplier: &Supplier, employee: &Employee, cost: f64) -> Result<Shipment> {
        self.shipments()
            .insert(&ShipmentForm {
                supplier_id: supplier.id.to_string(),
                employee_id: employee.id.to_string(),
                total_cost:  cost.to_string(),
            })
            .await
    }
}

impl Deref for TestDesk {
    type Target = Desk;

    fn deref(&self) -> &Self::Target {
        &self.desk
    }
}
