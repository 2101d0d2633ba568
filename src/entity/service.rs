use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

/// A provider listing. `is_active` mirrors the activation gate. Rows are
/// inserted inactive and only `sv::gate::reconcile` flips the flag.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub provider_id: i64,
  pub title: String,
  pub category: String,
  pub base_price: i64,
  pub is_active: bool,
  pub created_at: DateTime,
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
