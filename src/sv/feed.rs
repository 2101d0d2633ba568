//! In-process change feed pushed to dashboards over SSE.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::{
  entity::{BookingStatus, PaymentStatus},
  prelude::*,
};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
  Booking { booking_id: i32, provider_id: i64, status: BookingStatus },
  Payment { payment_id: i32, provider_id: i64, status: PaymentStatus },
  Services { provider_id: i64, active: bool },
}

/// Fan-out of change events. Each user gets a lazily created channel, admins
/// listen on a single firehose.
pub struct Feed {
  users: DashMap<i64, broadcast::Sender<ChangeEvent>>,
  admin: broadcast::Sender<ChangeEvent>,
}

impl Default for Feed {
  fn default() -> Self {
    let (admin, _) = broadcast::channel(CHANNEL_CAPACITY);
    Self { users: DashMap::new(), admin }
  }
}

impl Feed {
  pub fn subscribe(&self, user_id: i64) -> broadcast::Receiver<ChangeEvent> {
    self
      .users
      .entry(user_id)
      .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
      .subscribe()
  }

  pub fn subscribe_admin(&self) -> broadcast::Receiver<ChangeEvent> {
    self.admin.subscribe()
  }

  /// Sends `event` to every listed user and to the admin firehose.
  pub fn publish(&self, recipients: &[i64], event: ChangeEvent) {
    for user_id in recipients {
      if let Some(tx) = self.users.get(user_id) {
        // No receivers is fine, the dashboard is simply closed
        let _ = tx.send(event.clone());
      }
    }
    let _ = self.admin.send(event);
  }

  /// Drops channels nobody listens to anymore.
  pub fn gc(&self) {
    self.users.retain(|_, tx| tx.receiver_count() > 0);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_publish_reaches_user_and_admin() {
    let feed = Feed::default();
    let mut provider = feed.subscribe(7);
    let mut other = feed.subscribe(8);
    let mut admin = feed.subscribe_admin();

    let event = ChangeEvent::Services { provider_id: 7, active: true };
    feed.publish(&[7], event.clone());

    assert_eq!(provider.recv().await.unwrap(), event);
    assert_eq!(admin.recv().await.unwrap(), event);
    assert!(other.try_recv().is_err());
  }

  #[test]
  fn test_gc_drops_closed_channels() {
    let feed = Feed::default();
    let rx = feed.subscribe(1);
    let _kept = feed.subscribe(2);
    drop(rx);

    feed.gc();

    assert!(!feed.users.contains_key(&1));
    assert!(feed.users.contains_key(&2));
  }
}
