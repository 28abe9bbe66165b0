use serde::Serialize;

use crate::{
  coupon::{Clock, CouponLookup, CouponValidator, Quote},
  entity::discount_coupon,
  prelude::*,
  sv,
};

const CUSTOMER_MAX_LEN: usize = 254;

/// Outcome of a successful redemption.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
  pub redemption_id: Uuid,
  pub coupon_id: Uuid,
  pub code: String,
  #[serde(flatten)]
  pub quote: Quote,
}

pub struct Checkout<'a, L, C> {
  db: &'a DatabaseConnection,
  validator: &'a CouponValidator<L, C>,
}

impl<'a, L: CouponLookup, C: Clock> Checkout<'a, L, C> {
  pub fn new(
    db: &'a DatabaseConnection,
    validator: &'a CouponValidator<L, C>,
  ) -> Self {
    Self { db, validator }
  }

  /// Validates the code and prices the purchase. Read-only.
  pub async fn quote(
    &self,
    code: &str,
    course_id: Option<Uuid>,
    amount: Decimal,
  ) -> Result<(discount_coupon::Model, Quote)> {
    let coupon = self.validator.validate(code, course_id, Some(amount)).await?;
    let quote = Quote::new(&coupon, amount)?;
    Ok((coupon, quote))
  }

  /// Validates the code, takes one use and logs the redemption, all or
  /// nothing.
  pub async fn redeem(
    &self,
    code: &str,
    course_id: Option<Uuid>,
    amount: Decimal,
    customer: &str,
  ) -> Result<Receipt> {
    let customer = customer.trim();
    if customer.is_empty() || customer.len() > CUSTOMER_MAX_LEN {
      return Err(Error::Invalid("Customer reference is required".into()));
    }

    let now = self.validator.now();
    let coupon = self
      .validator
      .validate_at(code, now, course_id, Some(amount))
      .await?;
    let quote = Quote::new(&coupon, amount)?;

    // the lookup may be stale, the claim re-checks against the row
    let txn = self.db.begin().await?;
    sv::Coupon::claim_use(&txn, coupon.id, now).await?;
    let redemption =
      sv::Redemption::record(&txn, coupon.id, course_id, customer, &quote)
        .await?;
    txn.commit().await?;

    info!(
      code = %coupon.code,
      customer,
      discount = %quote.discount,
      "Coupon redeemed"
    );

    Ok(Receipt {
      redemption_id: redemption.id,
      coupon_id: coupon.id,
      code: coupon.code,
      quote,
    })
  }
}
