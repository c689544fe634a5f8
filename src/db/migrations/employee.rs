use sea_orm_migration::prelude::*;

use super::user::Users;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m0002_employees"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employees::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employees::UserId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-employees-user_id")
                            .from(Employees::Table, Employees::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Employees::Table).to_owned()).await
    }
}

#[derive(Iden)]
pub enum Employees {
    Table,
    Id,
    UserId,
}
