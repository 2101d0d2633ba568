use sea_orm_migration::prelude::*;

use super::{
  m20260301_000001_create_users::Users,
  m20260301_000002_create_services::Services,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Bookings::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Bookings::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Bookings::ProviderId).big_integer().not_null())
          .col(ColumnDef::new(Bookings::CustomerId).big_integer().not_null())
          .col(ColumnDef::new(Bookings::ServiceId).integer().not_null())
          .col(
            ColumnDef::new(Bookings::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(
            ColumnDef::new(Bookings::ProposedPrice).big_integer().not_null(),
          )
          .col(ColumnDef::new(Bookings::FinalPrice).big_integer().null())
          .col(ColumnDef::new(Bookings::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Bookings::CompletedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_bookings_provider")
              .from(Bookings::Table, Bookings::ProviderId)
              .to(Users::Table, Users::Id),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_bookings_customer")
              .from(Bookings::Table, Bookings::CustomerId)
              .to(Users::Table, Users::Id),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_bookings_service")
              .from(Bookings::Table, Bookings::ServiceId)
              .to(Services::Table, Services::Id),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_bookings_provider_status")
          .table(Bookings::Table)
          .col(Bookings::ProviderId)
          .col(Bookings::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Bookings::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Bookings {
  Table,
  Id,
  ProviderId,
  CustomerId,
  ServiceId,
  Status,
  ProposedPrice,
  FinalPrice,
  CreatedAt,
  CompletedAt,
}
