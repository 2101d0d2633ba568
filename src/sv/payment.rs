use sea_orm::ActiveValue::NotSet;
use serde::Deserialize;

use super::{
  commission::{self, covered_jobs, uncovered},
  gate::{self, Reconciled},
};
use crate::{
  entity::{PaymentStatus, commission_payment},
  prelude::*,
  utils::{format_amount, format_date},
};

/// Evidence a provider attaches when paying commission. Nothing is written
/// unless every piece is present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentProof {
  pub amount: i64,
  pub payment_method: String,
  pub screenshot_url: String,
  /// Always every completed booking not yet covered. A supplied value must
  /// match it.
  pub booking_count: Option<i32>,
}

impl PaymentProof {
  fn validate(&self) -> Result<()> {
    if self.payment_method.trim().is_empty() {
      return Err(Error::MissingEvidence("payment method"));
    }
    if self.amount <= 0 {
      return Err(Error::MissingEvidence("amount"));
    }
    if self.screenshot_url.trim().is_empty() {
      return Err(Error::MissingEvidence("screenshot"));
    }
    if self.booking_count.is_some_and(|n| n <= 0) {
      return Err(Error::MissingEvidence("booking count"));
    }
    Ok(())
  }
}

#[derive(Debug)]
pub struct Review {
  pub payment: commission_payment::Model,
  /// Set on approval only, rejection leaves services untouched.
  pub reconciled: Option<Reconciled>,
}

pub struct Payment<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Payment<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn submit(
    &self,
    provider_id: i64,
    proof: PaymentProof,
  ) -> Result<commission_payment::Model> {
    proof.validate()?;

    let txn = self.db.begin().await?;

    let pending = commission_payment::Entity::find()
      .filter(commission_payment::Column::ProviderId.eq(provider_id))
      .filter(commission_payment::Column::Status.eq(PaymentStatus::Pending))
      .one(&txn)
      .await?;
    if pending.is_some() {
      return Err(Error::PendingPaymentExists);
    }

    let bookings = commission::completed_bookings(&txn, provider_id).await?;
    let payments = commission::payments_of(&txn, provider_id).await?;
    let open = uncovered(&bookings, covered_jobs(&payments)).len() as i32;
    if open == 0 {
      return Err(Error::MissingEvidence("booking count"));
    }
    if proof.booking_count.is_some_and(|count| count != open) {
      return Err(Error::InvalidArgs(format!(
        "Booking count must match the {open} uncovered bookings"
      )));
    }

    let payment = commission_payment::ActiveModel {
      id: NotSet,
      provider_id: Set(provider_id),
      amount: Set(proof.amount),
      payment_method: Set(proof.payment_method.trim().to_string()),
      screenshot_url: Set(proof.screenshot_url.trim().to_string()),
      booking_count: Set(open),
      status: Set(PaymentStatus::Pending),
      submitted_at: Set(Utc::now().naive_utc()),
      reviewed_at: Set(None),
      rejection_reason: Set(None),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
      "Provider {} submitted commission payment #{} of {} via {} at {}",
      provider_id,
      payment.id,
      format_amount(payment.amount),
      payment.payment_method,
      format_date(payment.submitted_at),
    );
    Ok(payment)
  }

  /// Approval marks the cycle paid and reactivates services atomically.
  pub async fn approve(&self, payment_id: i32) -> Result<Review> {
    let txn = self.db.begin().await?;

    let payment = commission_payment::Entity::find_by_id(payment_id)
      .one(&txn)
      .await?
      .ok_or(Error::PaymentNotFound)?;

    if payment.status != PaymentStatus::Pending {
      return Err(Error::PaymentReviewed(payment.status));
    }

    let payment = commission_payment::ActiveModel {
      status: Set(PaymentStatus::Approved),
      reviewed_at: Set(Some(Utc::now().naive_utc())),
      ..payment.into()
    }
    .update(&txn)
    .await?;

    let reconciled = gate::reconcile(&txn, payment.provider_id).await?;

    txn.commit().await?;

    info!(
      "Commission payment #{} approved, provider {} services active: {}",
      payment.id, payment.provider_id, reconciled.status.services_active
    );
    Ok(Review { payment, reconciled: Some(reconciled) })
  }

  pub async fn reject(&self, payment_id: i32, reason: &str) -> Result<Review> {
    let reason = reason.trim();
    if reason.is_empty() {
      return Err(Error::RejectionReasonRequired);
    }

    let txn = self.db.begin().await?;

    let payment = commission_payment::Entity::find_by_id(payment_id)
      .one(&txn)
      .await?
      .ok_or(Error::PaymentNotFound)?;

    if payment.status != PaymentStatus::Pending {
      return Err(Error::PaymentReviewed(payment.status));
    }

    let payment = commission_payment::ActiveModel {
      status: Set(PaymentStatus::Rejected),
      reviewed_at: Set(Some(Utc::now().naive_utc())),
      rejection_reason: Set(Some(reason.to_string())),
      ..payment.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;

    info!("Commission payment #{} rejected: {}", payment.id, reason);
    Ok(Review { payment, reconciled: None })
  }

  /// Newest first.
  pub async fn by_provider(
    &self,
    provider_id: i64,
  ) -> Result<Vec<commission_payment::Model>> {
    commission::payments_of(self.db, provider_id).await
  }

  /// Admin review queue, oldest first.
  pub async fn all_pending(&self) -> Result<Vec<commission_payment::Model>> {
    Ok(
      commission_payment::Entity::find()
        .filter(commission_payment::Column::Status.eq(PaymentStatus::Pending))
        .order_by_asc(commission_payment::Column::SubmittedAt)
        .all(self.db)
        .await?,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{BookingStatus, service},
    sv::{
      Gate, Ledger,
      ledger::Actor,
      test_utils::test_db::{self, seed},
    },
  };

  fn proof() -> PaymentProof {
    PaymentProof {
      amount: 250,
      payment_method: "bank_transfer".into(),
      screenshot_url: "https://cdn.example/proof.png".into(),
      booking_count: None,
    }
  }

  #[tokio::test]
  async fn test_submit_then_second_submission_blocked() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    seed::completed_bookings(&db, provider, service, 5, 1000).await;

    let payments = Payment::new(&db);
    let payment = payments.submit(provider, proof()).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount, 250);
    assert_eq!(payment.booking_count, 5);

    let second = payments.submit(provider, proof()).await;
    assert!(matches!(second, Err(Error::PendingPaymentExists)));
    assert_eq!(payments.by_provider(provider).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_missing_evidence_creates_nothing() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    seed::completed_bookings(&db, provider, service, 5, 1000).await;
    let payments = Payment::new(&db);

    let cases = [
      PaymentProof { payment_method: " ".into(), ..proof() },
      PaymentProof { amount: 0, ..proof() },
      PaymentProof { screenshot_url: String::new(), ..proof() },
      PaymentProof { booking_count: Some(0), ..proof() },
    ];
    for case in cases {
      let result = payments.submit(provider, case).await;
      assert!(matches!(result, Err(Error::MissingEvidence(_))));
    }

    assert!(payments.by_provider(provider).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_nothing_to_cover() {
    let db = test_db::setup().await;
    let (provider, _) = seed::provider_with_service(&db, 1).await;

    let result = Payment::new(&db).submit(provider, proof()).await;
    assert!(matches!(result, Err(Error::MissingEvidence("booking count"))));
  }

  #[tokio::test]
  async fn test_approve_reactivates_services() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    seed::completed_bookings(&db, provider, service, 5, 1000).await;
    Gate::new(&db).reconcile(provider).await.unwrap();

    let payments = Payment::new(&db);
    let payment = payments.submit(provider, proof()).await.unwrap();
    let review = payments.approve(payment.id).await.unwrap();

    assert_eq!(review.payment.status, PaymentStatus::Approved);
    assert!(review.payment.reviewed_at.is_some());
    let reconciled = review.reconciled.unwrap();
    assert!(reconciled.status.services_active);
    assert_eq!(reconciled.changed, 1);

    let row = service::Entity::find_by_id(service).one(&db).await.unwrap();
    assert!(row.unwrap().is_active);
    assert!(payments.all_pending().await.unwrap().is_empty());

    // Terminal
    let again = payments.approve(payment.id).await;
    assert!(matches!(again, Err(Error::PaymentReviewed(PaymentStatus::Approved))));
    let flip = payments.reject(payment.id, "oops").await;
    assert!(matches!(flip, Err(Error::PaymentReviewed(_))));
  }

  #[tokio::test]
  async fn test_reject_requires_reason_and_keeps_services_off() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    seed::completed_bookings(&db, provider, service, 5, 1000).await;
    Gate::new(&db).reconcile(provider).await.unwrap();

    let payments = Payment::new(&db);
    let payment = payments.submit(provider, proof()).await.unwrap();

    let blank = payments.reject(payment.id, "  ").await;
    assert!(matches!(blank, Err(Error::RejectionReasonRequired)));

    let review = payments.reject(payment.id, "Screenshot unreadable").await.unwrap();
    assert_eq!(review.payment.status, PaymentStatus::Rejected);
    assert_eq!(
      review.payment.rejection_reason.as_deref(),
      Some("Screenshot unreadable")
    );
    assert!(review.reconciled.is_none());

    let row = service::Entity::find_by_id(service).one(&db).await.unwrap();
    assert!(!row.unwrap().is_active);

    // Rejection frees the slot for a new submission
    let retry = payments.submit(provider, proof()).await.unwrap();
    assert_eq!(retry.status, PaymentStatus::Pending);
    assert_eq!(payments.all_pending().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_booking_count_must_match_uncovered() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    seed::completed_bookings(&db, provider, service, 5, 1000).await;
    let payments = Payment::new(&db);

    for count in [1, 4, 6, 1000] {
      let result = payments
        .submit(provider, PaymentProof { booking_count: Some(count), ..proof() })
        .await;
      assert!(matches!(result, Err(Error::InvalidArgs(_))));
    }
    assert!(payments.by_provider(provider).await.unwrap().is_empty());

    let exact = payments
      .submit(provider, PaymentProof { booking_count: Some(5), ..proof() })
      .await
      .unwrap();
    assert_eq!(exact.booking_count, 5);
  }

  #[tokio::test]
  async fn test_approval_settles_only_the_submitted_cycle() {
    let db = test_db::setup().await;
    let (provider, service) = seed::provider_with_service(&db, 1).await;
    seed::completed_bookings(&db, provider, service, 5, 1000).await;
    Gate::new(&db).reconcile(provider).await.unwrap();

    let payments = Payment::new(&db);
    let payment = payments.submit(provider, proof()).await.unwrap();
    let review = payments.approve(payment.id).await.unwrap();
    assert!(review.reconciled.unwrap().status.services_active);

    // The next five completions open a fresh cycle
    let ledger = Ledger::new(&db);
    let actor = Actor::Provider(provider);
    for _ in 0..5 {
      let booking = ledger.create(seed::CUSTOMER, service, 1000).await.unwrap();
      for next in [
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
      ] {
        ledger.transition(booking.id, actor, next, None).await.unwrap();
      }
    }

    let status = Gate::new(&db).status(provider).await.unwrap();
    assert_eq!(status.cycle.completed_jobs, 10);
    assert!(status.cycle.commission_due);
    assert!(!status.services_active);
    assert!(matches!(
      ledger.create(seed::CUSTOMER, service, 1000).await,
      Err(Error::CommissionDue)
    ));

    let second = payments.submit(provider, proof()).await.unwrap();
    assert_eq!(second.booking_count, 5);
  }

  #[tokio::test]
  async fn test_unknown_payment() {
    let db = test_db::setup().await;
    let payments = Payment::new(&db);

    assert!(matches!(payments.approve(42).await, Err(Error::PaymentNotFound)));
    assert!(matches!(
      payments.reject(42, "nope").await,
      Err(Error::PaymentNotFound)
    ));
  }
}
