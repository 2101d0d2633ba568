//! Service activation gate.
//!
//! Whether a provider can be booked is derived from the ledger and payment
//! history. The `is_active` column on services is only a mirror of that value
//! and [`reconcile`] is the single place allowed to write it.

use sea_orm::sea_query::Expr;
use serde::Serialize;

use super::commission::{self, CycleStatus};
use crate::{entity::service, prelude::*};

/// Commission due blocks bookings until an approved payment covers the
/// cycle. `CycleStatus::commission_due` already accounts for approved
/// coverage.
pub fn services_active(cycle: &CycleStatus) -> bool {
  !cycle.commission_due
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateStatus {
  pub provider_id: i64,
  pub cycle: CycleStatus,
  pub services_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
  pub status: GateStatus,
  /// Service rows whose mirror flag was flipped.
  pub changed: u64,
}

/// Derives the gate on `conn`, so a transaction sees its own writes.
pub async fn derive<C: ConnectionTrait>(
  conn: &C,
  provider_id: i64,
) -> Result<GateStatus> {
  let cycle = commission::cycle_of(conn, provider_id).await?;
  Ok(GateStatus {
    provider_id,
    cycle,
    services_active: services_active(&cycle),
  })
}

/// Re-derives the gate for `provider_id` and brings every service row in
/// line with it. Runs inside the caller's transaction when given one.
pub async fn reconcile<C: ConnectionTrait>(
  conn: &C,
  provider_id: i64,
) -> Result<Reconciled> {
  let status = derive(conn, provider_id).await?;
  let active = status.services_active;

  let result = service::Entity::update_many()
    .col_expr(service::Column::IsActive, Expr::value(active))
    .filter(service::Column::ProviderId.eq(provider_id))
    .filter(service::Column::IsActive.ne(active))
    .exec(conn)
    .await?;

  if result.rows_affected > 0 {
    info!(
      "Provider {provider_id}: {} service(s) {}",
      result.rows_affected,
      if active { "reactivated" } else { "deactivated" }
    );
  }

  Ok(Reconciled { status, changed: result.rows_affected })
}

pub struct Gate<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Gate<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Read-only derivation, the stored flag is never consulted.
  pub async fn status(&self, provider_id: i64) -> Result<GateStatus> {
    derive(self.db, provider_id).await
  }

  pub async fn is_bookable(&self, provider_id: i64) -> Result<bool> {
    Ok(self.status(provider_id).await?.services_active)
  }

  pub async fn reconcile(&self, provider_id: i64) -> Result<Reconciled> {
    let txn = self.db.begin().await?;
    let reconciled = reconcile(&txn, provider_id).await?;
    txn.commit().await?;
    Ok(reconciled)
  }

  /// Sweeps every provider that has services listed. Returns the
  /// reconciliations that flipped at least one row.
  pub async fn reconcile_all(&self) -> Result<Vec<Reconciled>> {
    use sea_orm::QuerySelect;

    let providers: Vec<i64> = service::Entity::find()
      .select_only()
      .column(service::Column::ProviderId)
      .distinct()
      .into_tuple()
      .all(self.db)
      .await?;

    let mut changed = Vec::new();
    for provider_id in providers {
      let reconciled = self.reconcile(provider_id).await?;
      if reconciled.changed > 0 {
        changed.push(reconciled);
      }
    }

    Ok(changed)
  }
}
