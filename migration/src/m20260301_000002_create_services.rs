use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Services::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Services::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Services::ProviderId).big_integer().not_null())
          .col(ColumnDef::new(Services::Title).string().not_null())
          .col(ColumnDef::new(Services::Category).string().not_null())
          .col(ColumnDef::new(Services::BasePrice).big_integer().not_null())
          .col(
            ColumnDef::new(Services::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Services::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_services_provider")
              .from(Services::Table, Services::ProviderId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_services_provider")
          .table(Services::Table)
          .col(Services::ProviderId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Services::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Services {
  Table,
  Id,
  ProviderId,
  Title,
  Category,
  BasePrice,
  IsActive,
  CreatedAt,
}
