use std::env;

use anyhow::Context;
use migration::{Migrator, MigratorTrait};

use crate::{prelude::*, sv::feed::Feed};

#[derive(Debug, Clone)]
pub struct Config {
  pub db_url: String,
  pub port: u16,
  pub admins: HashSet<i64>,
  /// How often the background sweep re-derives every provider's gate.
  pub reconcile_every: Duration,
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let db_url = env::var("DATABASE_URL")
      .unwrap_or_else(|_| "sqlite:marketplace.db?mode=rwc".into());

    let port =
      env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);

    let admins = match env::var("ADMIN_IDS") {
      Ok(ids) => parse_ids(&ids)?,
      Err(_) => HashSet::new(),
    };

    let reconcile_every = match env::var("RECONCILE_EVERY") {
      Ok(raw) => humantime::parse_duration(&raw)
        .with_context(|| format!("Invalid RECONCILE_EVERY `{raw}`"))?,
      Err(_) => Duration::from_secs(10 * 60),
    };

    Ok(Self { db_url, port, admins, reconcile_every })
  }
}

fn parse_ids(raw: &str) -> anyhow::Result<HashSet<i64>> {
  raw
    .split(',')
    .filter(|s| !s.trim().is_empty())
    .map(|id| {
      id.trim()
        .parse()
        .with_context(|| format!("Invalid admin id `{}`", id.trim()))
    })
    .collect()
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub admins: HashSet<i64>,
  pub feed: Feed,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = Database::connect(&config.db_url)
      .await
      .context("Failed to connect to database")?;

    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    Ok(Self::with_db(db, config))
  }

  pub fn with_db(db: DatabaseConnection, config: Config) -> Self {
    let admins = config.admins.clone();
    Self { db, config, admins, feed: Feed::default() }
  }

  pub fn is_admin(&self, user_id: i64) -> bool {
    self.admins.contains(&user_id)
  }
}
