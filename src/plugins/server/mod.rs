mod handlers;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use axum::{
  Router,
  routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

pub fn routes(app: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route(
      "/api/services",
      get(handlers::bookable_services).post(handlers::create_service),
    )
    .route("/api/providers/{id}/services", get(handlers::provider_services))
    .route("/api/providers/{id}/bookings", get(handlers::provider_bookings))
    .route("/api/customers/{id}/bookings", get(handlers::customer_bookings))
    .route("/api/providers/{id}/commission", get(handlers::provider_commission))
    .route("/api/providers/{id}/payments", get(handlers::provider_payments))
    .route("/api/bookings", post(handlers::create_booking))
    .route("/api/bookings/{id}/status", post(handlers::booking_status))
    .route("/api/bookings/{id}/review", post(handlers::booking_review))
    .route("/api/payments", post(handlers::submit_payment))
    .route("/api/users/{id}/events", get(handlers::user_events))
    .route("/api/admin/payments", get(handlers::pending_payments))
    .route("/api/admin/payments/{id}/approve", post(handlers::approve_payment))
    .route("/api/admin/payments/{id}/reject", post(handlers::reject_payment))
    .route("/api/admin/analytics", get(handlers::analytics))
    .route("/api/admin/events", get(handlers::admin_events))
    .with_state(app)
}

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        governor_limiter.retain_recent();
      }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));

    let router = routes(app)
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP Server listening on {addr}");

    tokio::spawn(async move {
      if let Err(err) = axum::serve(listener, router).await {
        error!("HTTP server stopped: {err}");
      }
    });

    Ok(())
  }
}
