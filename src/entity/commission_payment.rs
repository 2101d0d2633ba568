use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "approved")]
  Approved,
  #[sea_orm(string_value = "rejected")]
  Rejected,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commission_payments")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub provider_id: i64,
  pub amount: i64,
  pub payment_method: String,
  pub screenshot_url: String,
  /// Completed bookings this payment settles commission for.
  pub booking_count: i32,
  pub status: PaymentStatus,
  pub submitted_at: DateTime,
  pub reviewed_at: Option<DateTime>,
  pub rejection_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::ProviderId",
    to = "user::Column::Id"
  )]
  Provider,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Provider.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
