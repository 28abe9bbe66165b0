use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{
  coupon::{Quote, RawAmount},
  entity::discount_coupon,
  prelude::*,
  state::AppState,
  sv::checkout::Receipt,
};

#[derive(Debug, Deserialize)]
pub struct ValidateReq {
  pub code: String,
  pub course_id: Option<Uuid>,
  pub purchase_amount: Option<RawAmount>,
}

#[derive(Debug, Serialize)]
pub struct ValidateRes {
  pub valid: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub coupon: Option<discount_coupon::Model>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub quote: Option<Quote>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kind: Option<&'static str>,
}

impl ValidateRes {
  pub fn valid(coupon: discount_coupon::Model, quote: Option<Quote>) -> Self {
    Self {
      valid: true,
      coupon: Some(coupon),
      quote,
      error: None,
      kind: None,
    }
  }

  pub fn rejected(reject: &Reject) -> Self {
    Self {
      valid: false,
      coupon: None,
      quote: None,
      error: Some(reject.to_string()),
      kind: Some(reject.kind()),
    }
  }
}

/// Rule failures are an answer, not an error: the form shows the message.
pub async fn validate(
  State(app): State<Arc<AppState>>,
  Json(req): Json<ValidateReq>,
) -> Result<Json<ValidateRes>> {
  let amount = RawAmount::parse_opt(req.purchase_amount.as_ref())?;

  match app.validator.validate(&req.code, req.course_id, amount).await {
    Ok(coupon) => {
      let quote =
        amount.map(|amount| Quote::new(&coupon, amount)).transpose()?;
      Ok(Json(ValidateRes::valid(coupon, quote)))
    }
    Err(Error::Coupon(reject)) => Ok(Json(ValidateRes::rejected(&reject))),
    Err(err) => Err(err),
  }
}

#[derive(Debug, Deserialize)]
pub struct RedeemReq {
  pub code: String,
  pub course_id: Option<Uuid>,
  pub purchase_amount: RawAmount,
  pub customer: String,
}

pub async fn redeem(
  State(app): State<Arc<AppState>>,
  Json(req): Json<RedeemReq>,
) -> Result<Json<Receipt>> {
  let amount = req.purchase_amount.parse()?;

  let receipt = app
    .sv()
    .checkout
    .redeem(&req.code, req.course_id, amount, &req.customer)
    .await?;

  Ok(Json(receipt))
}

pub async fn health() -> &'static str {
  "OK"
}
