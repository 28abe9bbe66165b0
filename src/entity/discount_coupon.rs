//! Discount coupons redeemable at checkout

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How `discount_value` is interpreted
#[derive(
  Clone,
  Copy,
  Debug,
  PartialEq,
  Eq,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
  /// Percentage points of the purchase amount
  #[sea_orm(string_value = "percentage")]
  Percentage,
  /// Flat currency amount
  #[sea_orm(string_value = "fixed_amount")]
  FixedAmount,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "discount_coupons")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  /// Matched case-sensitively
  #[sea_orm(unique)]
  pub code: String,
  pub discount_type: DiscountType,
  pub discount_value: Decimal,
  /// `None` means unlimited
  pub max_uses: Option<i32>,
  pub current_uses: i32,
  pub valid_from: DateTimeUtc,
  /// `None` means open-ended
  pub valid_until: Option<DateTimeUtc>,
  pub is_active: bool,
  /// Restricts the coupon to a single course
  pub course_id: Option<Uuid>,
  pub minimum_purchase: Option<Decimal>,
  pub description: Option<String>,
  pub created_at: DateTimeUtc,
  pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::coupon_redemption::Entity")]
  Redemptions,
}

impl Related<super::coupon_redemption::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Redemptions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
