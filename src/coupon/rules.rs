use crate::{entity::discount_coupon, prelude::*};

/// Applies the coupon rules to a lookup result, in order, stopping at
/// the first failure. `course_id` and `amount` are only checked when the
/// caller supplies them.
pub fn check(
  coupon: Option<discount_coupon::Model>,
  now: DateTime<Utc>,
  course_id: Option<Uuid>,
  amount: Option<Decimal>,
) -> Result<discount_coupon::Model, Reject> {
  let coupon =
    coupon.filter(|c| c.is_active).ok_or(Reject::NotFoundOrExpired)?;

  // not started yet reads the same as unknown
  if coupon.valid_from > now {
    return Err(Reject::NotFoundOrExpired);
  }

  if let Some(until) = coupon.valid_until
    && until < now
  {
    return Err(Reject::NotFoundOrExpired);
  }

  if let Some(max_uses) = coupon.max_uses
    && coupon.current_uses >= max_uses
  {
    return Err(Reject::UsageLimitReached);
  }

  if let (Some(required), Some(course)) = (coupon.course_id, course_id)
    && required != course
  {
    return Err(Reject::CourseMismatch);
  }

  if let (Some(minimum), Some(amount)) = (coupon.minimum_purchase, amount)
    && amount < minimum
  {
    return Err(Reject::BelowMinimumPurchase { minimum });
  }

  Ok(coupon)
}
