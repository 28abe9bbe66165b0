use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rust_decimal::Decimal;

/// Why a coupon cannot be applied. Shown to the customer as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Reject {
  /// Unknown, deactivated, not yet started or expired
  #[error("Coupon not found or expired")]
  NotFoundOrExpired,
  #[error("Coupon usage limit reached")]
  UsageLimitReached,
  #[error("Coupon is not valid for this course")]
  CourseMismatch,
  #[error("Minimum purchase of {minimum} required for this coupon")]
  BelowMinimumPurchase { minimum: Decimal },
}

impl Reject {
  pub fn kind(&self) -> &'static str {
    match self {
      Reject::NotFoundOrExpired => "not_found_or_expired",
      Reject::UsageLimitReached => "usage_limit_reached",
      Reject::CourseMismatch => "course_mismatch",
      Reject::BelowMinimumPurchase { .. } => "below_minimum_purchase",
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Reject::NotFoundOrExpired => StatusCode::NOT_FOUND,
      Reject::UsageLimitReached => StatusCode::CONFLICT,
      Reject::CourseMismatch | Reject::BelowMinimumPurchase { .. } => {
        StatusCode::UNPROCESSABLE_ENTITY
      }
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("Coupon lookup failed: {0}")]
  LookupFailed(String),

  #[error(transparent)]
  Coupon(#[from] Reject),

  #[error("Invalid amount: {0}")]
  InvalidAmount(String),

  #[error("Invalid input: {0}")]
  Invalid(String),

  #[error("Unauthorized")]
  Unauthorized,

  #[error("Coupon not found")]
  CouponNotFound,

  #[error("Coupon code already exists")]
  DuplicateCode,

  #[error("Internal error: {0}")]
  Internal(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Error::Database(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
      }
      Error::LookupFailed(_) => {
        (StatusCode::BAD_GATEWAY, "Coupon lookup failed".to_string())
      }
      Error::Coupon(reject) => (reject.status(), reject.to_string()),
      Error::InvalidAmount(_) | Error::Invalid(_) => {
        (StatusCode::BAD_REQUEST, self.to_string())
      }
      Error::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      Error::CouponNotFound => (StatusCode::NOT_FOUND, self.to_string()),
      Error::DuplicateCode => (StatusCode::CONFLICT, self.to_string()),
      Error::Internal(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
      }
    };

    if status.is_server_error() {
      tracing::error!("{self}");
    }

    let mut body = json::json!({
      "success": false,
      "error": message,
    });
    if let Error::Coupon(reject) = &self {
      body["kind"] = reject.kind().into();
    }

    (status, axum::Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
