use rust_decimal::RoundingStrategy;
use serde::Serialize;

use crate::{
  entity::{DiscountType, discount_coupon},
  prelude::*,
};

/// Rounds to the currency minor unit, half away from zero. The result
/// always carries two decimal places.
pub fn round_money(value: Decimal) -> Decimal {
  let mut rounded =
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
  rounded.rescale(2);
  rounded
}

/// Discount for `amount`, never more than `amount` rounded to money.
pub fn discount_for(
  ty: DiscountType,
  value: Decimal,
  amount: Decimal,
) -> Result<Decimal> {
  let amount = round_money(amount);
  let raw = match ty {
    DiscountType::Percentage => amount
      .checked_mul(value)
      .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
      .ok_or_else(|| {
        Error::InvalidAmount(format!("`{amount}` is too large to discount"))
      })?,
    DiscountType::FixedAmount => value,
  };

  Ok(round_money(raw.max(Decimal::ZERO)).min(amount))
}

/// Price breakdown shown at checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
  pub purchase_amount: Decimal,
  pub discount: Decimal,
  pub total: Decimal,
}

impl Quote {
  /// The purchase amount is rounded to money first, the discount is
  /// capped against that figure.
  pub fn new(coupon: &discount_coupon::Model, amount: Decimal) -> Result<Self> {
    let amount = round_money(amount);
    let discount =
      discount_for(coupon.discount_type, coupon.discount_value, amount)?;
    let total = round_money((amount - discount).max(Decimal::ZERO));

    Ok(Self { purchase_amount: amount, discount, total })
  }
}
