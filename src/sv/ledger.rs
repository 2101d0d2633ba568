use sea_orm::ActiveValue::NotSet;

use super::gate::{self, Reconciled};
use crate::{
  entity::{BookingStatus, booking, service},
  prelude::*,
};

/// Which side of a booking is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
  Provider(i64),
  Customer(i64),
}

impl Actor {
  fn may_move(self, booking: &booking::Model, next: BookingStatus) -> bool {
    match self {
      Actor::Provider(id) => {
        id == booking.provider_id && next != BookingStatus::Cancelled
      }
      Actor::Customer(id) => {
        id == booking.customer_id && next == BookingStatus::Cancelled
      }
    }
  }
}

#[derive(Debug)]
pub struct Transition {
  pub booking: booking::Model,
  /// Present when the move completed the booking.
  pub reconciled: Option<Reconciled>,
}

pub struct Ledger<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Ledger<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    customer_id: i64,
    service_id: i32,
    proposed_price: i64,
  ) -> Result<booking::Model> {
    if proposed_price <= 0 {
      return Err(Error::InvalidArgs("Proposed price must be positive".into()));
    }

    let txn = self.db.begin().await?;

    let service = service::Entity::find_by_id(service_id)
      .one(&txn)
      .await?
      .ok_or(Error::ServiceNotFound)?;

    if service.provider_id == customer_id {
      return Err(Error::InvalidArgs("Cannot book your own service".into()));
    }

    // Derived from the ledger, the stored mirror may lag behind
    if !gate::derive(&txn, service.provider_id).await?.services_active {
      return Err(Error::CommissionDue);
    }

    let booking = booking::ActiveModel {
      id: NotSet,
      provider_id: Set(service.provider_id),
      customer_id: Set(customer_id),
      service_id: Set(service.id),
      status: Set(BookingStatus::Pending),
      proposed_price: Set(proposed_price),
      final_price: Set(None),
      created_at: Set(Utc::now().naive_utc()),
      completed_at: Set(None),
      rating: Set(None),
      review: Set(None),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    debug!(
      "Booking #{} created for provider {}",
      booking.id, booking.provider_id
    );
    Ok(booking)
  }

  pub async fn by_id(&self, booking_id: i32) -> Result<booking::Model> {
    booking::Entity::find_by_id(booking_id)
      .one(self.db)
      .await?
      .ok_or(Error::BookingNotFound)
  }

  /// Moves a booking along the lifecycle. Completion stamps `completed_at`,
  /// optionally fixes the final price and reconciles the provider's gate in
  /// the same transaction.
  pub async fn transition(
    &self,
    booking_id: i32,
    actor: Actor,
    next: BookingStatus,
    final_price: Option<i64>,
  ) -> Result<Transition> {
    if let Some(price) = final_price {
      if next != BookingStatus::Completed {
        return Err(Error::InvalidArgs(
          "Final price can only be set on completion".into(),
        ));
      }
      if price <= 0 {
        return Err(Error::InvalidArgs("Final price must be positive".into()));
      }
    }

    let txn = self.db.begin().await?;

    let booking = booking::Entity::find_by_id(booking_id)
      .one(&txn)
      .await?
      .ok_or(Error::BookingNotFound)?;

    if !actor.may_move(&booking, next) {
      return Err(Error::Forbidden);
    }

    if !booking.status.can_move_to(next) {
      return Err(Error::InvalidTransition { from: booking.status, to: next });
    }

    let provider_id = booking.provider_id;
    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(next);
    if next == BookingStatus::Completed {
      active.completed_at = Set(Some(Utc::now().naive_utc()));
      if final_price.is_some() {
        active.final_price = Set(final_price);
      }
    }
    let booking = active.update(&txn).await?;

    let reconciled = if next == BookingStatus::Completed {
      Some(gate::reconcile(&txn, provider_id).await?)
    } else {
      None
    };

    txn.commit().await?;

    info!("Booking #{} -> {:?}", booking.id, booking.status);
    Ok(Transition { booking, reconciled })
  }

  /// Reviews are the only change a completed booking accepts.
  pub async fn attach_review(
    &self,
    booking_id: i32,
    customer_id: i64,
    rating: i16,
    comment: Option<String>,
  ) -> Result<booking::Model> {
    if !(1..=5).contains(&rating) {
      return Err(Error::InvalidArgs("Rating must be between 1 and 5".into()));
    }

    let booking = self.by_id(booking_id).await?;

    if booking.customer_id != customer_id {
      return Err(Error::Forbidden);
    }
    if booking.status != BookingStatus::Completed {
      return Err(Error::InvalidArgs(
        "Only completed bookings can be reviewed".into(),
      ));
    }
    if booking.rating.is_some() {
      return Err(Error::InvalidArgs("Booking already reviewed".into()));
    }

    let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

    Ok(
      booking::ActiveModel {
        rating: Set(Some(rating)),
        review: Set(comment),
        ..booking.into()
      }
      .update(self.db)
      .await?,
    )
  }

  pub async fn by_provider(
    &self,
    provider_id: i64,
  ) -> Result<Vec<booking::Model>> {
    Ok(
      booking::Entity::find()
        .filter(booking::Column::ProviderId.eq(provider_id))
        .order_by_desc(booking::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  pub async fn by_customer(
    &self,
    customer_id: i64,
  ) -> Result<Vec<booking::Model>> {
    Ok(
      booking::Entity::find()
        .filter(booking::Column::CustomerId.eq(customer_id))
        .order_by_desc(booking::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db::{
    self,
    seed::{self, CUSTOMER},
  };

  async fn walk_to_completion(
    ledger: &Ledger<'_>,
    id: i32,
    provider: i64,
    final_price: Option<i64>,
  ) -> Transition {
    let actor = Actor::Provider(provider);
    for next in [BookingStatus::Confirmed, BookingStatus::InProgress] {
      ledger.transition(id, actor, next, None).await.unwrap();
    }
    ledger
      .transition(id, actor, BookingStatus::Completed, final_price)
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn test_create_booking() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;

    let booking = Ledger::new(&db).create(CUSTOMER, service, 1500).await.unwrap();

    assert_eq!(booking.provider_id, provider);
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.final_price, None);
  }

  #[tokio::test]
  async fn test_create_rejects_bad_input() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    let ledger = Ledger::new(&db);

    assert!(matches!(
      ledger.create(CUSTOMER, service, 0).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      ledger.create(CUSTOMER, 404, 100).await,
      Err(Error::ServiceNotFound)
    ));
    assert!(matches!(
      ledger.create(provider, service, 100).await,
      Err(Error::InvalidArgs(_))
    ));
  }

  #[tokio::test]
  async fn test_fifth_completion_blocks_new_bookings() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    seed::completed_bookings(&db, provider, service, 4, 1000).await;
    let ledger = Ledger::new(&db);

    let booking = ledger.create(CUSTOMER, service, 900).await.unwrap();
    let done = walk_to_completion(&ledger, booking.id, provider, Some(1000)).await;

    assert_eq!(done.booking.status, BookingStatus::Completed);
    assert_eq!(done.booking.final_price, Some(1000));
    assert!(done.booking.completed_at.is_some());

    let reconciled = done.reconciled.unwrap();
    assert!(reconciled.status.cycle.commission_due);
    assert!(!reconciled.status.services_active);

    let row = service::Entity::find_by_id(service).one(&db).await.unwrap();
    assert!(!row.unwrap().is_active);

    assert!(matches!(
      ledger.create(CUSTOMER, service, 900).await,
      Err(Error::CommissionDue)
    ));
  }

  #[tokio::test]
  async fn test_invalid_transitions() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    let ledger = Ledger::new(&db);
    let booking = ledger.create(CUSTOMER, service, 900).await.unwrap();

    let skip = ledger
      .transition(booking.id, Actor::Provider(provider), BookingStatus::Completed, None)
      .await;
    assert!(matches!(
      skip,
      Err(Error::InvalidTransition {
        from: BookingStatus::Pending,
        to: BookingStatus::Completed
      })
    ));

    // Customers may only cancel, providers may not cancel
    let confirm = ledger
      .transition(booking.id, Actor::Customer(CUSTOMER), BookingStatus::Confirmed, None)
      .await;
    assert!(matches!(confirm, Err(Error::Forbidden)));
    let cancel = ledger
      .transition(booking.id, Actor::Provider(provider), BookingStatus::Cancelled, None)
      .await;
    assert!(matches!(cancel, Err(Error::Forbidden)));

    let cancelled = ledger
      .transition(booking.id, Actor::Customer(CUSTOMER), BookingStatus::Cancelled, None)
      .await
      .unwrap();
    assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
    assert!(cancelled.reconciled.is_none());

    let revive = ledger
      .transition(booking.id, Actor::Provider(provider), BookingStatus::Confirmed, None)
      .await;
    assert!(matches!(revive, Err(Error::InvalidTransition { .. })));
  }

  #[tokio::test]
  async fn test_review_only_once_after_completion() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    let ledger = Ledger::new(&db);
    let booking = ledger.create(CUSTOMER, service, 900).await.unwrap();

    let early = ledger.attach_review(booking.id, CUSTOMER, 5, None).await;
    assert!(matches!(early, Err(Error::InvalidArgs(_))));

    walk_to_completion(&ledger, booking.id, provider, None).await;

    let reviewed = ledger
      .attach_review(booking.id, CUSTOMER, 4, Some(" Great job ".into()))
      .await
      .unwrap();
    assert_eq!(reviewed.rating, Some(4));
    assert_eq!(reviewed.review.as_deref(), Some("Great job"));
    assert_eq!(reviewed.earnings(), 900);

    let again = ledger.attach_review(booking.id, CUSTOMER, 3, None).await;
    assert!(matches!(again, Err(Error::InvalidArgs(_))));
    let stranger = ledger.attach_review(booking.id, provider, 3, None).await;
    assert!(matches!(stranger, Err(Error::Forbidden)));
  }

  #[test]
  fn test_transition_table() {
    use BookingStatus::*;

    assert!(Pending.can_move_to(Confirmed));
    assert!(Confirmed.can_move_to(Coming));
    assert!(Coming.can_move_to(InProgress));
    assert!(InProgress.can_move_to(Completed));
    assert!(!Pending.can_move_to(InProgress));
    assert!(!InProgress.can_move_to(Cancelled));
    for terminal in [Completed, Cancelled, Rejected] {
      assert!(terminal.is_terminal());
      assert!(!terminal.can_move_to(Pending));
    }
  }
}
