use sea_orm::ActiveValue::NotSet;

use super::{gate, user::User};
use crate::{
  entity::{UserRole, service},
  prelude::*,
};

pub struct Service<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Service<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// New listings start in whatever state the gate derives, settled by the
  /// same reconciliation that guards every other service row.
  pub async fn create(
    &self,
    provider_id: i64,
    title: &str,
    category: &str,
    base_price: i64,
  ) -> Result<service::Model> {
    let (title, category) = (title.trim(), category.trim());
    if title.is_empty() || category.is_empty() {
      return Err(Error::InvalidArgs("Title and category are required".into()));
    }
    if base_price <= 0 {
      return Err(Error::InvalidArgs("Base price must be positive".into()));
    }

    User::new(self.db).get_or_create(provider_id, UserRole::Provider).await?;

    let txn = self.db.begin().await?;

    let service = service::ActiveModel {
      id: NotSet,
      provider_id: Set(provider_id),
      title: Set(title.to_string()),
      category: Set(category.to_string()),
      base_price: Set(base_price),
      is_active: Set(false),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await?;

    gate::reconcile(&txn, provider_id).await?;

    let service = service::Entity::find_by_id(service.id)
      .one(&txn)
      .await?
      .ok_or(Error::ServiceNotFound)?;

    txn.commit().await?;

    Ok(service)
  }

  pub async fn by_provider(
    &self,
    provider_id: i64,
  ) -> Result<Vec<service::Model>> {
    Ok(
      service::Entity::find()
        .filter(service::Column::ProviderId.eq(provider_id))
        .order_by_asc(service::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  /// Listings customers can book right now, optionally in one category.
  pub async fn bookable(
    &self,
    category: Option<&str>,
  ) -> Result<Vec<service::Model>> {
    let mut query =
      service::Entity::find().filter(service::Column::IsActive.eq(true));

    if let Some(category) = category {
      query = query.filter(service::Column::Category.eq(category));
    }

    Ok(query.order_by_desc(service::Column::CreatedAt).all(self.db).await?)
  }
}
