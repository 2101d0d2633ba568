use sea_orm_migration::prelude::*;

use super::m20260301_000003_create_bookings::Bookings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    // SQLite only supports one column per ALTER TABLE
    manager
      .alter_table(
        Table::alter()
          .table(Bookings::Table)
          .add_column(ColumnDef::new(Reviews::Rating).small_integer().null())
          .to_owned(),
      )
      .await?;

    manager
      .alter_table(
        Table::alter()
          .table(Bookings::Table)
          .add_column(ColumnDef::new(Reviews::Review).string().null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .alter_table(
        Table::alter()
          .table(Bookings::Table)
          .drop_column(Reviews::Review)
          .to_owned(),
      )
      .await?;

    manager
      .alter_table(
        Table::alter()
          .table(Bookings::Table)
          .drop_column(Reviews::Rating)
          .to_owned(),
      )
      .await
  }
}

#[derive(DeriveIden)]
enum Reviews {
  Rating,
  Review,
}
