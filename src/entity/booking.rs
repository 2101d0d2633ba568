use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{service, user};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "confirmed")]
  Confirmed,
  #[sea_orm(string_value = "coming")]
  Coming,
  #[sea_orm(string_value = "in_progress")]
  InProgress,
  #[sea_orm(string_value = "completed")]
  Completed,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
  #[sea_orm(string_value = "rejected")]
  Rejected,
}

impl BookingStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Cancelled | Self::Rejected)
  }

  /// Whether `self -> next` is an allowed ledger move.
  pub fn can_move_to(self, next: Self) -> bool {
    use BookingStatus::*;

    matches!(
      (self, next),
      (Pending, Confirmed | Rejected | Cancelled)
        | (Confirmed, Coming | InProgress | Cancelled)
        | (Coming, InProgress | Cancelled)
        | (InProgress, Completed)
    )
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub provider_id: i64,
  pub customer_id: i64,
  pub service_id: i32,
  pub status: BookingStatus,
  pub proposed_price: i64,
  pub final_price: Option<i64>,
  pub created_at: DateTime,
  pub completed_at: Option<DateTime>,
  pub rating: Option<i16>,
  pub review: Option<String>,
}

impl Model {
  /// Amount the provider earned: the final price when agreed, otherwise the
  /// proposed one.
  pub fn earnings(&self) -> i64 {
    self.final_price.unwrap_or(self.proposed_price)
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::ProviderId",
    to = "user::Column::Id"
  )]
  Provider,
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::CustomerId",
    to = "user::Column::Id"
  )]
  Customer,
  #[sea_orm(
    belongs_to = "service::Entity",
    from = "Column::ServiceId",
    to = "service::Column::Id"
  )]
  Service,
}

impl Related<service::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Service.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
