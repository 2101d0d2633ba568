pub mod cron;
pub mod server;

use std::sync::Arc;

use crate::state::AppState;

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Box<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new() }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  /// Starts every plugin on its own task. Long-running plugins loop inside
  /// `start`, so none of them may hold up the others.
  pub fn run(self, app: Arc<AppState>) -> Vec<tokio::task::JoinHandle<()>> {
    self
      .plugins
      .into_iter()
      .map(|plugin| {
        let app = app.clone();
        tokio::spawn(async move {
          let name = plugin.name();
          tracing::info!("init `{}`", name);

          if let Err(err) = plugin.start(app).await {
            tracing::error!("failed `{}`: {err:#}", name);
          }
        })
      })
      .collect()
  }
}
