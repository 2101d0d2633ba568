use serde::{Deserialize, Serialize};

use crate::{
  entity::{BookingStatus, PaymentStatus, booking, commission_payment},
  prelude::*,
};

/// Platform cut of every completed booking, in percent.
pub const COMMISSION_PERCENT: i64 = 5;
/// Completed bookings per commission cycle.
pub const CYCLE_JOBS: u64 = 5;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
  Week,
  Month,
  #[default]
  AllTime,
}

impl Window {
  pub fn days(self) -> Option<i64> {
    match self {
      Window::Week => Some(7),
      Window::Month => Some(30),
      Window::AllTime => None,
    }
  }

  /// Completions without a timestamp only count towards all-time figures.
  pub fn contains(self, completed_at: Option<DateTime>, now: DateTime) -> bool {
    let Some(days) = self.days() else {
      return true;
    };
    completed_at
      .is_some_and(|at| at <= now && at >= now - TimeDelta::days(days))
  }
}

pub fn commission_of(earnings: i64) -> i64 {
  earnings * COMMISSION_PERCENT / 100
}

fn is_completed(booking: &booking::Model) -> bool {
  booking.status == BookingStatus::Completed
}

pub fn total_earnings(
  bookings: &[booking::Model],
  window: Window,
  now: DateTime,
) -> i64 {
  bookings
    .iter()
    .filter(|b| is_completed(b) && window.contains(b.completed_at, now))
    .map(booking::Model::earnings)
    .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EarningsSummary {
  pub window: Window,
  pub bookings: u64,
  pub earnings: i64,
  pub commission: i64,
}

pub fn summarize(
  bookings: &[booking::Model],
  window: Window,
  now: DateTime,
) -> EarningsSummary {
  let in_window = bookings
    .iter()
    .filter(|b| is_completed(b) && window.contains(b.completed_at, now))
    .count() as u64;
  let earnings = total_earnings(bookings, window, now);

  EarningsSummary {
    window,
    bookings: in_window,
    earnings,
    commission: commission_of(earnings),
  }
}

/// Where a provider stands in the 5-job commission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleStatus {
  pub completed_jobs: u64,
  pub jobs_since_last_commission: u64,
  pub cycles_completed: u64,
  pub cycles_paid: u64,
  pub commission_due: bool,
}

impl CycleStatus {
  /// `covered_jobs` is the number of completed bookings settled by approved
  /// payments.
  pub fn derive(completed_jobs: u64, covered_jobs: u64) -> Self {
    let cycles_completed = completed_jobs / CYCLE_JOBS;
    let cycles_paid = covered_jobs / CYCLE_JOBS;

    Self {
      completed_jobs,
      jobs_since_last_commission: completed_jobs % CYCLE_JOBS,
      cycles_completed,
      cycles_paid,
      commission_due: cycles_completed > cycles_paid,
    }
  }
}

/// Approved coverage in bookings.
pub fn covered_jobs(payments: &[commission_payment::Model]) -> u64 {
  payments
    .iter()
    .filter(|p| p.status == PaymentStatus::Approved)
    .map(|p| p.booking_count.max(0) as u64)
    .sum()
}

/// Completed bookings not yet settled by an approved payment, oldest first.
pub fn uncovered<'b>(
  bookings: &'b [booking::Model],
  covered_jobs: u64,
) -> Vec<&'b booking::Model> {
  let mut completed: Vec<_> =
    bookings.iter().filter(|b| is_completed(b)).collect();
  completed.sort_by_key(|b| (b.completed_at, b.id));
  completed.into_iter().skip(covered_jobs as usize).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderOverview {
  pub provider_id: i64,
  pub weekly: EarningsSummary,
  pub monthly: EarningsSummary,
  pub all_time: EarningsSummary,
  pub cycle: CycleStatus,
  pub uncovered_jobs: u64,
  /// Commission owed on the uncovered bookings.
  pub outstanding: i64,
  pub services_active: bool,
}

impl ProviderOverview {
  pub fn build(
    provider_id: i64,
    bookings: &[booking::Model],
    payments: &[commission_payment::Model],
    now: DateTime,
  ) -> Self {
    let covered = covered_jobs(payments);
    let completed = bookings.iter().filter(|b| is_completed(b)).count() as u64;
    let cycle = CycleStatus::derive(completed, covered);
    let open = uncovered(bookings, covered);

    Self {
      provider_id,
      weekly: summarize(bookings, Window::Week, now),
      monthly: summarize(bookings, Window::Month, now),
      all_time: summarize(bookings, Window::AllTime, now),
      cycle,
      uncovered_jobs: open.len() as u64,
      outstanding: commission_of(open.iter().map(|b| b.earnings()).sum()),
      services_active: super::gate::services_active(&cycle),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSummary {
  pub window: Window,
  pub providers: u64,
  pub providers_due: u64,
  pub completed_bookings: u64,
  pub earnings: i64,
  pub commission: i64,
  pub collected: i64,
  pub awaiting_review: i64,
  pub rejected_payments: u64,
}

impl PlatformSummary {
  pub fn build(
    bookings: &[booking::Model],
    payments: &[commission_payment::Model],
    window: Window,
    now: DateTime,
  ) -> Self {
    let mut ledgers: HashMap<i64, Vec<booking::Model>> = HashMap::new();
    for booking in bookings.iter().filter(|b| is_completed(b)) {
      ledgers.entry(booking.provider_id).or_default().push(booking.clone());
    }

    let mut history: HashMap<i64, Vec<commission_payment::Model>> =
      HashMap::new();
    for payment in payments {
      history.entry(payment.provider_id).or_default().push(payment.clone());
    }

    let providers_due = ledgers
      .iter()
      .filter(|(provider, ledger)| {
        let covered = history
          .get(provider)
          .map(|payments| covered_jobs(payments))
          .unwrap_or(0);
        CycleStatus::derive(ledger.len() as u64, covered).commission_due
      })
      .count() as u64;

    let sum_with = |status: PaymentStatus| -> i64 {
      payments
        .iter()
        .filter(|p| p.status == status)
        .filter(|p| window.contains(Some(p.submitted_at), now))
        .map(|p| p.amount)
        .sum()
    };

    let totals = summarize(bookings, window, now);

    Self {
      window,
      providers: ledgers.len() as u64,
      providers_due,
      completed_bookings: totals.bookings,
      earnings: totals.earnings,
      commission: totals.commission,
      collected: sum_with(PaymentStatus::Approved),
      awaiting_review: sum_with(PaymentStatus::Pending),
      rejected_payments: payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Rejected)
        .filter(|p| window.contains(Some(p.submitted_at), now))
        .count() as u64,
    }
  }
}

pub(crate) async fn completed_bookings<C: ConnectionTrait>(
  conn: &C,
  provider_id: i64,
) -> Result<Vec<booking::Model>> {
  Ok(
    booking::Entity::find()
      .filter(booking::Column::ProviderId.eq(provider_id))
      .filter(booking::Column::Status.eq(BookingStatus::Completed))
      .order_by_asc(booking::Column::CompletedAt)
      .all(conn)
      .await?,
  )
}

pub(crate) async fn payments_of<C: ConnectionTrait>(
  conn: &C,
  provider_id: i64,
) -> Result<Vec<commission_payment::Model>> {
  Ok(
    commission_payment::Entity::find()
      .filter(commission_payment::Column::ProviderId.eq(provider_id))
      .order_by_desc(commission_payment::Column::SubmittedAt)
      .all(conn)
      .await?,
  )
}

/// Derives the cycle from the current database state, never from a cache.
pub(crate) async fn cycle_of<C: ConnectionTrait>(
  conn: &C,
  provider_id: i64,
) -> Result<CycleStatus> {
  let completed = completed_bookings(conn, provider_id).await?;
  let payments = payments_of(conn, provider_id).await?;
  Ok(CycleStatus::derive(completed.len() as u64, covered_jobs(&payments)))
}

pub struct Commission<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Commission<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn overview(&self, provider_id: i64) -> Result<ProviderOverview> {
    let bookings = completed_bookings(self.db, provider_id).await?;
    let payments = payments_of(self.db, provider_id).await?;
    let now = Utc::now().naive_utc();

    Ok(ProviderOverview::build(provider_id, &bookings, &payments, now))
  }

  pub async fn platform_summary(
    &self,
    window: Window,
  ) -> Result<PlatformSummary> {
    let bookings = booking::Entity::find()
      .filter(booking::Column::Status.eq(BookingStatus::Completed))
      .all(self.db)
      .await?;
    let payments = commission_payment::Entity::find().all(self.db).await?;

    Ok(PlatformSummary::build(
      &bookings,
      &payments,
      window,
      Utc::now().naive_utc(),
    ))
  }
}
