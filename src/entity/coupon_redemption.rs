//! Redemption log - one row per coupon applied to a purchase

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupon_redemptions")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub coupon_id: Uuid,
  pub course_id: Option<Uuid>,
  /// Opaque customer reference (email or user id)
  pub customer: String,
  pub purchase_amount: Decimal,
  pub discount_amount: Decimal,
  pub redeemed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::discount_coupon::Entity",
    from = "Column::CouponId",
    to = "super::discount_coupon::Column::Id"
  )]
  Coupon,
}

impl Related<super::discount_coupon::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Coupon.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
