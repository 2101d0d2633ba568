use std::sync::Arc;

use async_trait::async_trait;
use tokio::time;

use crate::{
  plugins::Plugin, prelude::*, state::AppState, sv, sv::feed::ChangeEvent,
};

/// Periodic sweep that re-derives every provider's activation gate and
/// repairs service rows that drifted from it.
pub struct Reconcile;

#[async_trait]
impl Plugin for Reconcile {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let every = app.config.reconcile_every;
    if every.is_zero() {
      info!("Reconciliation sweep disabled via config");
      return Ok(());
    }

    info!(
      "Reconciliation sweep started (every {})",
      humantime::format_duration(every)
    );
    let mut interval = time::interval(every);

    loop {
      interval.tick().await;

      match sv::Gate::new(&app.db).reconcile_all().await {
        Ok(changed) => {
          for reconciled in &changed {
            let status = reconciled.status;
            app.feed.publish(
              &[status.provider_id],
              ChangeEvent::Services {
                provider_id: status.provider_id,
                active: status.services_active,
              },
            );
          }
          if !changed.is_empty() {
            warn!("Reconciliation repaired {} provider(s)", changed.len());
          } else {
            debug!("Reconciliation found no drift");
          }
        }
        Err(err) => error!("Reconciliation sweep failed: {}", err),
      }
    }
  }
}

pub struct FeedGc;

#[async_trait]
impl Plugin for FeedGc {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = time::interval(Duration::from_secs(60));
    loop {
      interval.tick().await;
      app.feed.gc();
    }
  }
}
