mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{App, cron, server},
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "marketplace=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting Marketplace Server v{}", env!("CARGO_PKG_VERSION"));
  if config.admins.is_empty() {
    warn!("No admins configured, payment review only via admin role");
  }

  let app = Arc::new(AppState::new(config).await?);

  let tasks = App::new()
    .register(server::Plugin)
    .register(cron::Reconcile)
    .register(cron::FeedGc)
    .run(app);

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");

  for task in tasks {
    task.abort();
  }

  Ok(())
}
