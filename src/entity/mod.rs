pub mod coupon_redemption;
pub mod discount_coupon;

pub use discount_coupon::DiscountType;
