use dashmap::DashMap;

use crate::{entity::discount_coupon, prelude::*, sv};

/// Source of coupon records. Implementations return only active coupons
/// whose code matches exactly, and report a broken channel as
/// [`Error::LookupFailed`].
#[async_trait]
pub trait CouponLookup: Send + Sync {
  async fn by_code(&self, code: &str) -> Result<Option<discount_coupon::Model>>;
}

#[async_trait]
impl<T: CouponLookup + ?Sized> CouponLookup for Arc<T> {
  async fn by_code(&self, code: &str) -> Result<Option<discount_coupon::Model>> {
    (**self).by_code(code).await
  }
}

#[async_trait]
impl CouponLookup for DatabaseConnection {
  async fn by_code(&self, code: &str) -> Result<Option<discount_coupon::Model>> {
    sv::Coupon::new(self).active_by_code(code).await.map_err(|err| match err {
      Error::Database(err) => Error::LookupFailed(err.to_string()),
      other => other,
    })
  }
}

/// Coupons held in process, keyed by code.
#[derive(Debug, Default)]
pub struct MemoryLookup {
  coupons: DashMap<String, discount_coupon::Model>,
}

impl MemoryLookup {
  pub fn new() -> Self {
    Self::default()
  }

  /// Loads a JSON array of coupon records.
  pub fn from_json(input: &str) -> Result<Self> {
    let coupons: Vec<discount_coupon::Model> = json::from_str(input)
      .map_err(|err| Error::Internal(format!("Invalid coupon seed: {err}")))?;

    let lookup = Self::new();
    for coupon in coupons {
      lookup.insert(coupon);
    }
    Ok(lookup)
  }

  pub fn insert(&self, coupon: discount_coupon::Model) {
    self.coupons.insert(coupon.code.clone(), coupon);
  }

  pub fn len(&self) -> usize {
    self.coupons.len()
  }
}

#[async_trait]
impl CouponLookup for MemoryLookup {
  async fn by_code(&self, code: &str) -> Result<Option<discount_coupon::Model>> {
    Ok(
      self
        .coupons
        .get(code)
        .filter(|coupon| coupon.is_active)
        .map(|coupon| coupon.value().clone()),
    )
  }
}
