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
          .table(CommissionPayments::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(CommissionPayments::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(CommissionPayments::ProviderId)
              .big_integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(CommissionPayments::Amount).big_integer().not_null(),
          )
          .col(
            ColumnDef::new(CommissionPayments::PaymentMethod)
              .string()
              .not_null(),
          )
          .col(
            ColumnDef::new(CommissionPayments::ScreenshotUrl)
              .string()
              .not_null(),
          )
          .col(
            ColumnDef::new(CommissionPayments::BookingCount)
              .integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(CommissionPayments::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(
            ColumnDef::new(CommissionPayments::SubmittedAt)
              .date_time()
              .not_null(),
          )
          .col(ColumnDef::new(CommissionPayments::ReviewedAt).date_time().null())
          .col(
            ColumnDef::new(CommissionPayments::RejectionReason).string().null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_commission_payments_provider")
              .from(CommissionPayments::Table, CommissionPayments::ProviderId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    // One pending payment per provider.
    manager
      .get_connection()
      .execute_unprepared(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_commission_payments_one_pending \
         ON commission_payments (provider_id) WHERE status = 'pending'",
      )
      .await?;

    Ok(())
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(CommissionPayments::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum CommissionPayments {
  Table,
  Id,
  ProviderId,
  Amount,
  PaymentMethod,
  ScreenshotUrl,
  BookingCount,
  Status,
  SubmittedAt,
  ReviewedAt,
  RejectionReason,
}
