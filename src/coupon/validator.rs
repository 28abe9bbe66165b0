use crate::{
  coupon::{CouponLookup, rules},
  entity::discount_coupon,
  prelude::*,
};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Always reports the same instant.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}

/// Decides whether a coupon code applies to a purchase.
pub struct CouponValidator<L, C = SystemClock> {
  lookup: L,
  clock: C,
}

impl<L: CouponLookup, C: Clock> CouponValidator<L, C> {
  pub fn new(lookup: L, clock: C) -> Self {
    Self { lookup, clock }
  }

  pub fn now(&self) -> DateTime<Utc> {
    self.clock.now()
  }

  /// Validates against the injected clock.
  pub async fn validate(
    &self,
    code: &str,
    course_id: Option<Uuid>,
    amount: Option<Decimal>,
  ) -> Result<discount_coupon::Model> {
    self.validate_at(code, self.now(), course_id, amount).await
  }

  pub async fn validate_at(
    &self,
    code: &str,
    now: DateTime<Utc>,
    course_id: Option<Uuid>,
    amount: Option<Decimal>,
  ) -> Result<discount_coupon::Model> {
    let found = self.lookup.by_code(code).await?;

    match rules::check(found, now, course_id, amount) {
      Ok(coupon) => {
        debug!(code, coupon_id = %coupon.id, "coupon accepted");
        Ok(coupon)
      }
      Err(reject) => {
        debug!(code, reason = reject.kind(), "coupon rejected");
        Err(reject.into())
      }
    }
  }
}
