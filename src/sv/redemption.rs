use crate::{coupon::Quote, entity::coupon_redemption, prelude::*};

pub struct Redemption<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Redemption<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn record<C: ConnectionTrait>(
    conn: &C,
    coupon_id: Uuid,
    course_id: Option<Uuid>,
    customer: &str,
    quote: &Quote,
  ) -> Result<coupon_redemption::Model> {
    let redemption = coupon_redemption::ActiveModel {
      id: Set(Uuid::new_v4()),
      coupon_id: Set(coupon_id),
      course_id: Set(course_id),
      customer: Set(customer.to_string()),
      purchase_amount: Set(quote.purchase_amount),
      discount_amount: Set(quote.discount),
      redeemed_at: Set(Utc::now()),
    };

    Ok(redemption.insert(conn).await?)
  }

  /// Most recent first.
  pub async fn by_coupon(
    &self,
    coupon_id: Uuid,
  ) -> Result<Vec<coupon_redemption::Model>> {
    let redemptions = coupon_redemption::Entity::find()
      .filter(coupon_redemption::Column::CouponId.eq(coupon_id))
      .order_by_desc(coupon_redemption::Column::RedeemedAt)
      .all(self.db)
      .await?;
    Ok(redemptions)
  }
}
