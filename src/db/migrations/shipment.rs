use sea_orm_migration::prelude::*;

use super::employee::Employees;
use super::supplier::Suppliers;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m0008_shipments"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shipments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Shipments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Shipments::SupplierId).integer().not_null())
                    .col(ColumnDef::new(Shipments::EmployeeId).integer().not_null())
                    .col(ColumnDef::new(Shipments::TotalCost).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shipments-supplier_id")
                            .from(Shipments::Table, Shipments::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shipments-employee_id")
                            .from(Shipments::Table, Shipments::EmployeeId)
                            .to(Employees::Table, Employees::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Shipments::Table).to_owned()).await
    }
}

#[derive(Iden)]
pub enum Shipments {
    Table,
    Id,
    SupplierId,
    EmployeeId,
    TotalCost,
}
