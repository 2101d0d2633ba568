use crate::{
  entity::{user, user::UserRole},
  prelude::*,
};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Returns the user, creating it with `role` on first sight. An existing
  /// customer asking for a provider role is promoted.
  pub async fn get_or_create(
    &self,
    id: i64,
    role: UserRole,
  ) -> Result<user::Model> {
    if let Some(user) = user::Entity::find_by_id(id).one(self.db).await? {
      if user.role == UserRole::Customer && role == UserRole::Provider {
        return self.set_role(id, role).await;
      }
      return Ok(user);
    }

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      id: Set(id),
      role: Set(role),
      name: Set(None),
      created_at: Set(now),
    };

    Ok(user.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: i64) -> Result<Option<user::Model>> {
    let user = user::Entity::find_by_id(id).one(self.db).await?;
    Ok(user)
  }

  pub async fn set_role(&self, id: i64, role: UserRole) -> Result<user::Model> {
    let user = user::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::UserNotFound)?;

    Ok(user::ActiveModel { role: Set(role), ..user.into() }.update(self.db).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn test_get_or_create_promotes_customer() {
    let db = test_db::setup().await;
    let users = User::new(&db);

    let user = users.get_or_create(5, UserRole::Customer).await.unwrap();
    assert_eq!(user.role, UserRole::Customer);

    let user = users.get_or_create(5, UserRole::Provider).await.unwrap();
    assert_eq!(user.role, UserRole::Provider);

    // Never demoted
    let user = users.get_or_create(5, UserRole::Customer).await.unwrap();
    assert_eq!(user.role, UserRole::Provider);
  }

  #[tokio::test]
  async fn test_set_role_unknown_user() {
    let db = test_db::setup().await;
    let result = User::new(&db).set_role(1, UserRole::Admin).await;
    assert!(matches!(result, Err(Error::UserNotFound)));
  }
}
