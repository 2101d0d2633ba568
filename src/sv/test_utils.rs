//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema};

  use crate::entity::*;

  /// Creates an in-memory SQLite database with all required tables
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(user::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(service::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(booking::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(commission_payment::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }

  pub mod seed {
    use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set};

    use super::*;
    use crate::prelude::{TimeDelta, Utc};

    pub const CUSTOMER: i64 = 9000;

    pub async fn ensure_user(db: &DatabaseConnection, id: i64, role: UserRole) {
      if user::Entity::find_by_id(id).one(db).await.unwrap().is_some() {
        return;
      }
      user::ActiveModel {
        id: Set(id),
        role: Set(role),
        name: Set(None),
        created_at: Set(Utc::now().naive_utc()),
      }
      .insert(db)
      .await
      .unwrap();
    }

    /// Provider `id` with one active listing.
    pub async fn provider_with_service(
      db: &DatabaseConnection,
      id: i64,
    ) -> (i64, i32) {
      ensure_user(db, id, UserRole::Provider).await;
      ensure_user(db, CUSTOMER, UserRole::Customer).await;

      let service = service::ActiveModel {
        id: NotSet,
        provider_id: Set(id),
        title: Set("Deep cleaning".into()),
        category: Set("cleaning".into()),
        base_price: Set(1000),
        is_active: Set(true),
        created_at: Set(Utc::now().naive_utc()),
      }
      .insert(db)
      .await
      .unwrap();

      (id, service.id)
    }

    pub async fn completed_bookings(
      db: &DatabaseConnection,
      provider: i64,
      service: i32,
      count: usize,
      price: i64,
    ) {
      let now = Utc::now().naive_utc();
      for i in 0..count {
        booking::ActiveModel {
          id: NotSet,
          provider_id: Set(provider),
          customer_id: Set(CUSTOMER),
          service_id: Set(service),
          status: Set(BookingStatus::Completed),
          proposed_price: Set(price),
          final_price: Set(Some(price)),
          created_at: Set(now - TimeDelta::days(2)),
          completed_at: Set(Some(
            now - TimeDelta::minutes(count as i64 - i as i64),
          )),
          rating: Set(None),
          review: Set(None),
        }
        .insert(db)
        .await
        .unwrap();
      }
    }
  }
}
