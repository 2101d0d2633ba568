use axum::{
  Json,
  extract::{FromRequestParts, Path, Query, State},
  http::{StatusCode, request::Parts},
  response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, stream};
use serde::Deserialize;
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::{
  entity::{BookingStatus, UserRole, booking, commission_payment, service},
  prelude::*,
  state::AppState,
  sv::{
    self,
    commission::{PlatformSummary, ProviderOverview, Window},
    feed::ChangeEvent,
    gate::Reconciled,
    ledger::Actor,
    payment::PaymentProof,
  },
};

type App = State<Arc<AppState>>;

const CALLER_HEADER: &str = "x-user-id";

/// Identity forwarded by the session layer in front of this service.
pub struct Caller(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    _: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .headers
      .get(CALLER_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.trim().parse().ok())
      .map(Caller)
      .ok_or(Error::Unauthorized)
  }
}

/// Admins are listed in `ADMIN_IDS` or carry the admin role.
async fn is_admin(app: &AppState, user_id: i64) -> Result<bool> {
  if app.is_admin(user_id) {
    return Ok(true);
  }
  let user = sv::User::new(&app.db).by_id(user_id).await?;
  Ok(user.is_some_and(|user| user.role == UserRole::Admin))
}

pub struct Admin(pub i64);

impl FromRequestParts<Arc<AppState>> for Admin {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self, Self::Rejection> {
    let Caller(id) = Caller::from_request_parts(parts, app).await?;

    if is_admin(app, id).await? {
      Ok(Admin(id))
    } else {
      Err(Error::Forbidden)
    }
  }
}

async fn ensure_self_or_admin(
  app: &AppState,
  caller: i64,
  owner: i64,
) -> Result<()> {
  if caller == owner || is_admin(app, caller).await? {
    Ok(())
  } else {
    Err(Error::Forbidden)
  }
}

fn publish_reconciled(app: &AppState, reconciled: &Reconciled) {
  if reconciled.changed == 0 {
    return;
  }
  let provider_id = reconciled.status.provider_id;
  app.feed.publish(
    &[provider_id],
    ChangeEvent::Services {
      provider_id,
      active: reconciled.status.services_active,
    },
  );
}

pub async fn health() -> &'static str {
  "ok"
}

#[derive(Debug, Deserialize)]
pub struct CreateService {
  pub title: String,
  pub category: String,
  pub base_price: i64,
}

pub async fn create_service(
  State(app): App,
  Caller(provider_id): Caller,
  Json(req): Json<CreateService>,
) -> Result<(StatusCode, Json<service::Model>)> {
  let service = sv::Service::new(&app.db)
    .create(provider_id, &req.title, &req.category, req.base_price)
    .await?;
  Ok((StatusCode::CREATED, Json(service)))
}

pub async fn provider_services(
  State(app): App,
  Path(provider_id): Path<i64>,
) -> Result<Json<Vec<service::Model>>> {
  Ok(Json(sv::Service::new(&app.db).by_provider(provider_id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceQuery {
  pub category: Option<String>,
}

pub async fn bookable_services(
  State(app): App,
  Query(query): Query<ServiceQuery>,
) -> Result<Json<Vec<service::Model>>> {
  let services = sv::Service::new(&app.db)
    .bookable(query.category.as_deref())
    .await?;
  Ok(Json(services))
}

pub async fn provider_bookings(
  State(app): App,
  Caller(caller): Caller,
  Path(provider_id): Path<i64>,
) -> Result<Json<Vec<booking::Model>>> {
  ensure_self_or_admin(&app, caller, provider_id).await?;
  Ok(Json(sv::Ledger::new(&app.db).by_provider(provider_id).await?))
}

pub async fn customer_bookings(
  State(app): App,
  Caller(caller): Caller,
  Path(customer_id): Path<i64>,
) -> Result<Json<Vec<booking::Model>>> {
  ensure_self_or_admin(&app, caller, customer_id).await?;
  Ok(Json(sv::Ledger::new(&app.db).by_customer(customer_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBooking {
  pub service_id: i32,
  pub proposed_price: i64,
}

pub async fn create_booking(
  State(app): App,
  Caller(customer_id): Caller,
  Json(req): Json<CreateBooking>,
) -> Result<(StatusCode, Json<booking::Model>)> {
  sv::User::new(&app.db).get_or_create(customer_id, UserRole::Customer).await?;

  let booking = sv::Ledger::new(&app.db)
    .create(customer_id, req.service_id, req.proposed_price)
    .await?;

  app.feed.publish(
    &[booking.provider_id, booking.customer_id],
    ChangeEvent::Booking {
      booking_id: booking.id,
      provider_id: booking.provider_id,
      status: booking.status,
    },
  );

  Ok((StatusCode::CREATED, Json(booking)))
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatus {
  pub status: BookingStatus,
  #[serde(default)]
  pub final_price: Option<i64>,
}

pub async fn booking_status(
  State(app): App,
  Caller(caller): Caller,
  Path(booking_id): Path<i32>,
  Json(req): Json<ChangeStatus>,
) -> Result<Json<booking::Model>> {
  let ledger = sv::Ledger::new(&app.db);
  let booking = ledger.by_id(booking_id).await?;

  let actor = if caller == booking.provider_id {
    Actor::Provider(caller)
  } else if caller == booking.customer_id {
    Actor::Customer(caller)
  } else {
    return Err(Error::Forbidden);
  };

  let transition =
    ledger.transition(booking_id, actor, req.status, req.final_price).await?;
  let booking = transition.booking;

  app.feed.publish(
    &[booking.provider_id, booking.customer_id],
    ChangeEvent::Booking {
      booking_id: booking.id,
      provider_id: booking.provider_id,
      status: booking.status,
    },
  );
  if let Some(reconciled) = &transition.reconciled {
    publish_reconciled(&app, reconciled);
  }

  Ok(Json(booking))
}

#[derive(Debug, Deserialize)]
pub struct AttachReview {
  pub rating: i16,
  #[serde(default)]
  pub comment: Option<String>,
}

pub async fn booking_review(
  State(app): App,
  Caller(customer_id): Caller,
  Path(booking_id): Path<i32>,
  Json(req): Json<AttachReview>,
) -> Result<Json<booking::Model>> {
  let booking = sv::Ledger::new(&app.db)
    .attach_review(booking_id, customer_id, req.rating, req.comment)
    .await?;
  Ok(Json(booking))
}

pub async fn provider_commission(
  State(app): App,
  Caller(caller): Caller,
  Path(provider_id): Path<i64>,
) -> Result<Json<ProviderOverview>> {
  ensure_self_or_admin(&app, caller, provider_id).await?;
  Ok(Json(sv::Commission::new(&app.db).overview(provider_id).await?))
}

pub async fn submit_payment(
  State(app): App,
  Caller(provider_id): Caller,
  Json(proof): Json<PaymentProof>,
) -> Result<(StatusCode, Json<commission_payment::Model>)> {
  let payment = sv::Payment::new(&app.db).submit(provider_id, proof).await?;

  app.feed.publish(
    &[provider_id],
    ChangeEvent::Payment {
      payment_id: payment.id,
      provider_id,
      status: payment.status,
    },
  );

  Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn provider_payments(
  State(app): App,
  Caller(caller): Caller,
  Path(provider_id): Path<i64>,
) -> Result<Json<Vec<commission_payment::Model>>> {
  ensure_self_or_admin(&app, caller, provider_id).await?;
  Ok(Json(sv::Payment::new(&app.db).by_provider(provider_id).await?))
}

pub async fn pending_payments(
  State(app): App,
  _: Admin,
) -> Result<Json<Vec<commission_payment::Model>>> {
  Ok(Json(sv::Payment::new(&app.db).all_pending().await?))
}

pub async fn approve_payment(
  State(app): App,
  Admin(admin): Admin,
  Path(payment_id): Path<i32>,
) -> Result<Json<commission_payment::Model>> {
  let review = sv::Payment::new(&app.db).approve(payment_id).await?;
  let payment = review.payment;
  debug!("Admin {admin} approved payment #{payment_id}");

  app.feed.publish(
    &[payment.provider_id],
    ChangeEvent::Payment {
      payment_id: payment.id,
      provider_id: payment.provider_id,
      status: payment.status,
    },
  );
  if let Some(reconciled) = &review.reconciled {
    publish_reconciled(&app, reconciled);
  }

  Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
pub struct RejectPayment {
  #[serde(default)]
  pub reason: String,
}

pub async fn reject_payment(
  State(app): App,
  Admin(admin): Admin,
  Path(payment_id): Path<i32>,
  Json(req): Json<RejectPayment>,
) -> Result<Json<commission_payment::Model>> {
  let review =
    sv::Payment::new(&app.db).reject(payment_id, &req.reason).await?;
  let payment = review.payment;
  debug!("Admin {admin} rejected payment #{payment_id}");

  app.feed.publish(
    &[payment.provider_id],
    ChangeEvent::Payment {
      payment_id: payment.id,
      provider_id: payment.provider_id,
      status: payment.status,
    },
  );

  Ok(Json(payment))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
  #[serde(default)]
  pub window: Window,
}

pub async fn analytics(
  State(app): App,
  _: Admin,
  Query(query): Query<AnalyticsQuery>,
) -> Result<Json<PlatformSummary>> {
  Ok(Json(sv::Commission::new(&app.db).platform_summary(query.window).await?))
}

fn event_stream(
  rx: Receiver<ChangeEvent>,
) -> impl Stream<Item = Result<Event, axum::Error>> {
  stream::unfold(rx, |mut rx| async move {
    let event = match rx.recv().await {
      Ok(change) => Event::default().event("change").json_data(&change),
      // Subscriber must re-fetch whatever it missed
      Err(RecvError::Lagged(missed)) => {
        Ok(Event::default().event("lagged").data(missed.to_string()))
      }
      Err(RecvError::Closed) => return None,
    };
    Some((event, rx))
  })
}

pub async fn user_events(
  State(app): App,
  Caller(caller): Caller,
  Path(user_id): Path<i64>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
  ensure_self_or_admin(&app, caller, user_id).await?;
  let rx = app.feed.subscribe(user_id);
  Ok(Sse::new(event_stream(rx)).keep_alive(KeepAlive::default()))
}

pub async fn admin_events(
  State(app): App,
  _: Admin,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
  Sse::new(event_stream(app.feed.subscribe_admin()))
    .keep_alive(KeepAlive::default())
}
