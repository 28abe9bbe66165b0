//! Coupon rules: lookup, validation and discount math.
//!
//! The validator never mutates a coupon. Incrementing `current_uses` is
//! the job of [`crate::sv::Checkout::redeem`].

mod amount;
mod discount;
mod lookup;
mod rest;
pub mod rules;
mod validator;

pub use amount::RawAmount;
pub use discount::Quote;
pub use lookup::{CouponLookup, MemoryLookup};
pub use rest::RestLookup;
#[cfg(test)]
pub use validator::FixedClock;
pub use validator::{Clock, CouponValidator, SystemClock};
