use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

use crate::entity::{BookingStatus, PaymentStatus};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(DbErr),

  #[error("user not found")]
  UserNotFound,
  #[error("service not found")]
  ServiceNotFound,
  #[error("booking not found")]
  BookingNotFound,
  #[error("payment not found")]
  PaymentNotFound,

  #[error("{0}")]
  InvalidArgs(String),
  #[error("missing payment evidence: {0}")]
  MissingEvidence(&'static str),
  #[error("pending payment exists")]
  PendingPaymentExists,
  #[error("payment already {0:?}")]
  PaymentReviewed(PaymentStatus),
  #[error("rejection reason is required")]
  RejectionReasonRequired,
  #[error("cannot move booking from {from:?} to {to:?}")]
  InvalidTransition { from: BookingStatus, to: BookingStatus },
  #[error("commission payment is due, provider is not accepting bookings")]
  CommissionDue,
  #[error("missing or malformed caller identity")]
  Unauthorized,
  #[error("not allowed")]
  Forbidden,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<DbErr> for Error {
  fn from(err: DbErr) -> Self {
    // The partial unique index on pending payments races ahead of the
    // transactional check under concurrent submissions.
    if let Some(SqlErr::UniqueConstraintViolation(msg)) = err.sql_err()
      && msg.contains("commission_payments")
    {
      return Error::PendingPaymentExists;
    }
    Error::Db(err)
  }
}

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::UserNotFound
      | Error::ServiceNotFound
      | Error::BookingNotFound
      | Error::PaymentNotFound => StatusCode::NOT_FOUND,
      Error::InvalidArgs(_)
      | Error::MissingEvidence(_)
      | Error::RejectionReasonRequired => StatusCode::BAD_REQUEST,
      Error::PendingPaymentExists
      | Error::PaymentReviewed(_)
      | Error::InvalidTransition { .. }
      | Error::CommissionDue => StatusCode::CONFLICT,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
      Error::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

#[derive(Serialize)]
struct Status {
  success: bool,
  msg: String,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    let msg = if status.is_server_error() {
      tracing::error!("request failed: {self}");
      "Something went wrong, please try again".to_string()
    } else {
      self.to_string()
    };

    (status, Json(Status { success: false, msg })).into_response()
  }
}
