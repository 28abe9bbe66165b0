pub mod checkout;
pub mod coupon;
pub mod redemption;

pub use checkout::Checkout;
pub use coupon::Coupon;
pub use redemption::Redemption;
