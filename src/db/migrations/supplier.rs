use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m0004_suppliers"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Suppliers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Suppliers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Suppliers::Name).string().not_null())
                    .col(ColumnDef::new(Suppliers::ContactName).string().not_null())
                    .col(ColumnDef::new(Suppliers::Phone).string().not_null())
                    .col(ColumnDef::new(Suppliers::Address).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Suppliers::Table).to_owned()).await
    }
}

#[derive(Iden)]
pub enum Suppliers {
    Table,
    Id,
    Name,
    ContactName,
    Phone,
    Address,
}
