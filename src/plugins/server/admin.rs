//! Coupon administration. Every route requires the admin bearer token.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Request, State},
  http::header,
  middleware::Next,
  response::Response,
};
use serde::{Deserialize, Deserializer};

use crate::{
  coupon::RawAmount,
  entity::{DiscountType, coupon_redemption, discount_coupon},
  prelude::*,
  state::AppState,
  sv::coupon::{CouponDraft, CouponPatch},
};

pub async fn require_admin(
  State(app): State<Arc<AppState>>,
  req: Request,
  next: Next,
) -> Result<Response> {
  let authorized = req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.strip_prefix("Bearer "))
    .is_some_and(|token| {
      !app.config.admin_token.is_empty() && token == app.config.admin_token
    });

  if !authorized {
    warn!("Rejected admin request to {}", req.uri().path());
    return Err(Error::Unauthorized);
  }

  Ok(next.run(req).await)
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn nullable<'de, D, T>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateReq {
  pub code: String,
  pub discount_type: DiscountType,
  pub discount_value: RawAmount,
  pub max_uses: Option<RawAmount>,
  pub valid_from: Option<DateTime<Utc>>,
  pub valid_until: Option<DateTime<Utc>>,
  #[serde(default = "active_by_default")]
  pub is_active: bool,
  pub course_id: Option<Uuid>,
  pub minimum_purchase: Option<RawAmount>,
  pub description: Option<String>,
}

fn active_by_default() -> bool {
  true
}

impl CreateReq {
  fn into_draft(self) -> Result<CouponDraft> {
    Ok(CouponDraft {
      code: self.code,
      discount_type: self.discount_type,
      discount_value: self.discount_value.parse()?,
      max_uses: self.max_uses.as_ref().map(RawAmount::parse_count).transpose()?,
      valid_from: self.valid_from,
      valid_until: self.valid_until,
      is_active: self.is_active,
      course_id: self.course_id,
      minimum_purchase: RawAmount::parse_opt(self.minimum_purchase.as_ref())?,
      description: self.description.filter(|d| !d.trim().is_empty()),
    })
  }
}

#[derive(Debug, Deserialize)]
pub struct UpdateReq {
  pub code: Option<String>,
  pub discount_type: Option<DiscountType>,
  pub discount_value: Option<RawAmount>,
  #[serde(default, deserialize_with = "nullable")]
  pub max_uses: Option<Option<RawAmount>>,
  pub valid_from: Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "nullable")]
  pub valid_until: Option<Option<DateTime<Utc>>>,
  #[serde(default, deserialize_with = "nullable")]
  pub course_id: Option<Option<Uuid>>,
  #[serde(default, deserialize_with = "nullable")]
  pub minimum_purchase: Option<Option<RawAmount>>,
  #[serde(default, deserialize_with = "nullable")]
  pub description: Option<Option<String>>,
}

impl UpdateReq {
  fn into_patch(self) -> Result<CouponPatch> {
    let max_uses = match self.max_uses {
      Some(raw) => Some(raw.as_ref().map(RawAmount::parse_count).transpose()?),
      None => None,
    };
    let minimum_purchase = match self.minimum_purchase {
      Some(raw) => Some(RawAmount::parse_opt(raw.as_ref())?),
      None => None,
    };

    Ok(CouponPatch {
      code: self.code,
      discount_type: self.discount_type,
      discount_value: self
        .discount_value
        .as_ref()
        .map(RawAmount::parse)
        .transpose()?,
      max_uses,
      valid_from: self.valid_from,
      valid_until: self.valid_until,
      course_id: self.course_id,
      minimum_purchase,
      description: self.description,
    })
  }
}

pub async fn list(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Vec<discount_coupon::Model>>> {
  Ok(Json(app.sv().coupon.all().await?))
}

pub async fn create(
  State(app): State<Arc<AppState>>,
  Json(req): Json<CreateReq>,
) -> Result<Json<discount_coupon::Model>> {
  let draft = req.into_draft()?;
  Ok(Json(app.sv().coupon.create(draft).await?))
}

pub async fn get(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<discount_coupon::Model>> {
  let coupon = app.sv().coupon.by_id(id).await?.ok_or(Error::CouponNotFound)?;
  Ok(Json(coupon))
}

pub async fn update(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<UpdateReq>,
) -> Result<Json<discount_coupon::Model>> {
  let patch = req.into_patch()?;
  Ok(Json(app.sv().coupon.update(id, patch).await?))
}

pub async fn activate(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<discount_coupon::Model>> {
  Ok(Json(app.sv().coupon.set_active(id, true).await?))
}

pub async fn deactivate(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<discount_coupon::Model>> {
  Ok(Json(app.sv().coupon.set_active(id, false).await?))
}

pub async fn redemptions(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<coupon_redemption::Model>>> {
  let sv = app.sv();
  sv.coupon.by_id(id).await?.ok_or(Error::CouponNotFound)?;
  Ok(Json(sv.redemption.by_coupon(id).await?))
}
