//! Schema creation. Tables are created so that every foreign key points to a table that already exists.
pub mod category;
pub mod customer;
pub mod employee;
pub mod order;
pub mod product;
pub mod shipment;
pub mod supplier;
pub mod user;

use sea_orm_migration::prelude::*;

pub struct Migrator;

impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(user::Migration),
            Box::new(employee::Migration),
            Box::new(category::Migration),
            Box::new(supplier::Migration),
            Box::new(customer::Migration),
            Box::new(product::Migration),
            Box::new(order::Migration),
            Box::new(shipment::Migration),
        ]
    }
}
