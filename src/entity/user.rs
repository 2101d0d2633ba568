use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{commission_payment, service};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
  #[sea_orm(string_value = "customer")]
  #[default]
  Customer,
  #[sea_orm(string_value = "provider")]
  Provider,
  #[sea_orm(string_value = "admin")]
  Admin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: i64,
  pub role: UserRole,
  pub name: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "service::Entity")]
  Services,
  #[sea_orm(has_many = "commission_payment::Entity")]
  CommissionPayments,
}

impl Related<service::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Services.def()
  }
}

impl Related<commission_payment::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::CommissionPayments.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
