//! Shared fixtures for unit tests.

use chrono::TimeZone;
use sea_orm::{DbBackend, Schema};

use crate::{
  entity::{DiscountType, coupon_redemption, discount_coupon},
  prelude::*,
};

/// Reference instant all fixtures are relative to.
pub fn now() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
}

/// Active 10% coupon valid since yesterday, no limits.
pub fn coupon(code: &str) -> discount_coupon::Model {
  discount_coupon::Model {
    id: Uuid::new_v4(),
    code: code.to_string(),
    discount_type: DiscountType::Percentage,
    discount_value: Decimal::from(10),
    max_uses: None,
    current_uses: 0,
    valid_from: now() - TimeDelta::days(1),
    valid_until: None,
    is_active: true,
    course_id: None,
    minimum_purchase: None,
    description: None,
    created_at: now() - TimeDelta::days(1),
    updated_at: now() - TimeDelta::days(1),
  }
}

pub async fn setup_test_db() -> DatabaseConnection {
  let db = Database::connect("sqlite::memory:").await.unwrap();

  let schema = Schema::new(DbBackend::Sqlite);

  let stmt = schema.create_table_from_entity(discount_coupon::Entity);
  db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

  let stmt = schema.create_table_from_entity(coupon_redemption::Entity);
  db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

  db
}

pub async fn insert(
  db: &DatabaseConnection,
  coupon: discount_coupon::Model,
) -> discount_coupon::Model {
  discount_coupon::ActiveModel {
    id: Set(coupon.id),
    code: Set(coupon.code),
    discount_type: Set(coupon.discount_type),
    discount_value: Set(coupon.discount_value),
    max_uses: Set(coupon.max_uses),
    current_uses: Set(coupon.current_uses),
    valid_from: Set(coupon.valid_from),
    valid_until: Set(coupon.valid_until),
    is_active: Set(coupon.is_active),
    course_id: Set(coupon.course_id),
    minimum_purchase: Set(coupon.minimum_purchase),
    description: Set(coupon.description),
    created_at: Set(coupon.created_at),
    updated_at: Set(coupon.updated_at),
  }
  .insert(db)
  .await
  .unwrap()
}
