use sea_orm::{Condition, DbErr, SqlErr, sea_query::Expr};

use crate::{
  coupon::rules,
  entity::{DiscountType, discount_coupon},
  prelude::*,
};

const CODE_LEN: std::ops::RangeInclusive<usize> = 3..=50;

/// Admin input for a new coupon.
#[derive(Debug, Clone)]
pub struct CouponDraft {
  pub code: String,
  pub discount_type: DiscountType,
  pub discount_value: Decimal,
  pub max_uses: Option<i32>,
  /// Defaults to now
  pub valid_from: Option<DateTime<Utc>>,
  pub valid_until: Option<DateTime<Utc>>,
  pub is_active: bool,
  pub course_id: Option<Uuid>,
  pub minimum_purchase: Option<Decimal>,
  pub description: Option<String>,
}

/// Partial edit. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct CouponPatch {
  pub code: Option<String>,
  pub discount_type: Option<DiscountType>,
  pub discount_value: Option<Decimal>,
  pub max_uses: Option<Option<i32>>,
  pub valid_from: Option<DateTime<Utc>>,
  pub valid_until: Option<Option<DateTime<Utc>>>,
  pub course_id: Option<Option<Uuid>>,
  pub minimum_purchase: Option<Option<Decimal>>,
  pub description: Option<Option<String>>,
}

fn normalize_code(code: &str) -> Result<String> {
  let code = code.trim();

  if !CODE_LEN.contains(&code.chars().count()) {
    return Err(Error::Invalid(format!(
      "Coupon code must be {}-{} characters",
      CODE_LEN.start(),
      CODE_LEN.end()
    )));
  }
  if code.chars().any(char::is_whitespace) {
    return Err(Error::Invalid("Coupon code must not contain spaces".into()));
  }

  Ok(code.to_string())
}

fn check_terms(coupon: &discount_coupon::Model) -> Result<()> {
  if coupon.discount_value <= Decimal::ZERO {
    return Err(Error::Invalid("Discount value must be positive".into()));
  }
  if coupon.discount_type == DiscountType::Percentage
    && coupon.discount_value > Decimal::ONE_HUNDRED
  {
    return Err(Error::Invalid("Percentage cannot exceed 100".into()));
  }
  if let Some(max_uses) = coupon.max_uses
    && max_uses <= 0
  {
    return Err(Error::Invalid("Usage limit must be positive".into()));
  }
  if let Some(max_uses) = coupon.max_uses
    && max_uses < coupon.current_uses
  {
    return Err(Error::Invalid(format!(
      "Usage limit cannot be below the {} uses already taken",
      coupon.current_uses
    )));
  }
  if let Some(minimum) = coupon.minimum_purchase
    && minimum < Decimal::ZERO
  {
    return Err(Error::Invalid("Minimum purchase cannot be negative".into()));
  }
  if let Some(until) = coupon.valid_until
    && until < coupon.valid_from
  {
    return Err(Error::Invalid("Validity window ends before it starts".into()));
  }
  Ok(())
}

/// A racing writer can pass `ensure_unique` and still lose at the index.
fn duplicate_or(err: DbErr) -> Error {
  match err.sql_err() {
    Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateCode,
    _ => err.into(),
  }
}

pub struct Coupon<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Coupon<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    draft: CouponDraft,
  ) -> Result<discount_coupon::Model> {
    let now = Utc::now();

    let coupon = discount_coupon::Model {
      id: Uuid::new_v4(),
      code: normalize_code(&draft.code)?,
      discount_type: draft.discount_type,
      discount_value: draft.discount_value,
      max_uses: draft.max_uses,
      current_uses: 0,
      valid_from: draft.valid_from.unwrap_or(now),
      valid_until: draft.valid_until,
      is_active: draft.is_active,
      course_id: draft.course_id,
      minimum_purchase: draft.minimum_purchase,
      description: draft.description,
      created_at: now,
      updated_at: now,
    };
    check_terms(&coupon)?;
    self.ensure_unique(&coupon.code, None).await?;

    let coupon = self.insert(coupon).await?;

    info!(code = %coupon.code, id = %coupon.id, "Coupon created");
    Ok(coupon)
  }

  async fn insert(
    &self,
    coupon: discount_coupon::Model,
  ) -> Result<discount_coupon::Model> {
    let coupon = discount_coupon::ActiveModel {
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
    .insert(self.db)
    .await
    .map_err(duplicate_or)?;

    Ok(coupon)
  }

  pub async fn update(
    &self,
    id: Uuid,
    patch: CouponPatch,
  ) -> Result<discount_coupon::Model> {
    let current = self.by_id(id).await?.ok_or(Error::CouponNotFound)?;

    let mut next = current.clone();
    if let Some(code) = patch.code {
      next.code = normalize_code(&code)?;
    }
    if let Some(ty) = patch.discount_type {
      next.discount_type = ty;
    }
    if let Some(value) = patch.discount_value {
      next.discount_value = value;
    }
    if let Some(max_uses) = patch.max_uses {
      next.max_uses = max_uses;
    }
    if let Some(valid_from) = patch.valid_from {
      next.valid_from = valid_from;
    }
    if let Some(valid_until) = patch.valid_until {
      next.valid_until = valid_until;
    }
    if let Some(course_id) = patch.course_id {
      next.course_id = course_id;
    }
    if let Some(minimum) = patch.minimum_purchase {
      next.minimum_purchase = minimum;
    }
    if let Some(description) = patch.description {
      next.description = description;
    }
    check_terms(&next)?;

    if next.code != current.code {
      self.ensure_unique(&next.code, Some(id)).await?;
    }

    let coupon = discount_coupon::ActiveModel {
      code: Set(next.code),
      discount_type: Set(next.discount_type),
      discount_value: Set(next.discount_value),
      max_uses: Set(next.max_uses),
      valid_from: Set(next.valid_from),
      valid_until: Set(next.valid_until),
      course_id: Set(next.course_id),
      minimum_purchase: Set(next.minimum_purchase),
      description: Set(next.description),
      updated_at: Set(Utc::now()),
      ..current.into()
    }
    .update(self.db)
    .await
    .map_err(duplicate_or)?;

    info!(code = %coupon.code, id = %coupon.id, "Coupon updated");
    Ok(coupon)
  }

  /// Coupons are never deleted, only switched off.
  pub async fn set_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> Result<discount_coupon::Model> {
    let coupon = self.by_id(id).await?.ok_or(Error::CouponNotFound)?;

    let coupon = discount_coupon::ActiveModel {
      is_active: Set(active),
      updated_at: Set(Utc::now()),
      ..coupon.into()
    }
    .update(self.db)
    .await?;

    info!(code = %coupon.code, active, "Coupon toggled");
    Ok(coupon)
  }

  pub async fn by_id(&self, id: Uuid) -> Result<Option<discount_coupon::Model>> {
    Ok(discount_coupon::Entity::find_by_id(id).one(self.db).await?)
  }

  /// Exact, case-sensitive code match among active coupons.
  pub async fn active_by_code(
    &self,
    code: &str,
  ) -> Result<Option<discount_coupon::Model>> {
    let coupon = discount_coupon::Entity::find()
      .filter(discount_coupon::Column::Code.eq(code))
      .filter(discount_coupon::Column::IsActive.eq(true))
      .one(self.db)
      .await?;
    Ok(coupon)
  }

  pub async fn all(&self) -> Result<Vec<discount_coupon::Model>> {
    let coupons = discount_coupon::Entity::find()
      .order_by_desc(discount_coupon::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(coupons)
  }

  async fn ensure_unique(&self, code: &str, except: Option<Uuid>) -> Result<()> {
    let mut query = discount_coupon::Entity::find()
      .filter(discount_coupon::Column::Code.eq(code));

    if let Some(id) = except {
      query = query.filter(discount_coupon::Column::Id.ne(id));
    }

    match query.one(self.db).await? {
      Some(_) => Err(Error::DuplicateCode),
      None => Ok(()),
    }
  }

  /// Takes one use of the coupon if it is still active, inside its window
  /// at `now` and under its cap. The check and the increment are a single
  /// conditional update, so concurrent redemptions cannot push
  /// `current_uses` past `max_uses`.
  pub async fn claim_use<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<()> {
    use discount_coupon::Column;

    let result = discount_coupon::Entity::update_many()
      .col_expr(Column::CurrentUses, Expr::col(Column::CurrentUses).add(1))
      .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
      .filter(Column::Id.eq(id))
      .filter(Column::IsActive.eq(true))
      .filter(Column::ValidFrom.lte(now))
      .filter(
        Condition::any()
          .add(Column::ValidUntil.is_null())
          .add(Column::ValidUntil.gte(now)),
      )
      .filter(
        Condition::any()
          .add(Column::MaxUses.is_null())
          .add(Expr::col(Column::CurrentUses).lt(Expr::col(Column::MaxUses))),
      )
      .exec(conn)
      .await?;

    if result.rows_affected == 0 {
      // changed since validation, report why
      let coupon = discount_coupon::Entity::find_by_id(id).one(conn).await?;
      rules::check(coupon, now, None, None)?;
      return Err(Reject::UsageLimitReached.into());
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use tokio_test::assert_err;

  use super::*;
  use crate::testing;

  fn draft(code: &str) -> CouponDraft {
    CouponDraft {
      code: code.to_string(),
      discount_type: DiscountType::Percentage,
      discount_value: Decimal::from(15),
      max_uses: Some(10),
      valid_from: None,
      valid_until: None,
      is_active: true,
      course_id: None,
      minimum_purchase: None,
      description: Some("Spring workshop promo".into()),
    }
  }

  #[tokio::test]
  async fn test_create_coupon() {
    let db = testing::setup_test_db().await;

    let coupon = Coupon::new(&db).create(draft("  SPRING15 ")).await.unwrap();

    assert_eq!(coupon.code, "SPRING15");
    assert_eq!(coupon.current_uses, 0);
    assert!(coupon.is_active);
  }

  #[tokio::test]
  async fn test_duplicate_code() {
    let db = testing::setup_test_db().await;
    let sv = Coupon::new(&db);

    sv.create(draft("SPRING15")).await.unwrap();

    let err = assert_err!(sv.create(draft("SPRING15")).await);
    assert!(matches!(err, Error::DuplicateCode));

    // codes are case-sensitive
    assert!(sv.create(draft("spring15")).await.is_ok());
  }

  #[tokio::test]
  async fn test_invalid_terms() {
    let db = testing::setup_test_db().await;
    let sv = Coupon::new(&db);

    let cases = [
      CouponDraft { discount_value: Decimal::from(101), ..draft("PCT101") },
      CouponDraft { discount_value: Decimal::ZERO, ..draft("ZERO") },
      CouponDraft { max_uses: Some(0), ..draft("NOUSE") },
      CouponDraft {
        minimum_purchase: Some(Decimal::from(-1)),
        ..draft("NEGMIN")
      },
      CouponDraft {
        valid_from: Some(testing::now()),
        valid_until: Some(testing::now() - TimeDelta::days(1)),
        ..draft("BACKWARDS")
      },
      draft("AB"),
      draft("TWO WORDS"),
    ];

    for case in cases {
      let code = case.code.clone();
      let err = assert_err!(sv.create(case).await);
      assert!(matches!(err, Error::Invalid(_)), "{code}: {err}");
    }

    // fixed amounts may exceed 100
    let fixed = CouponDraft {
      discount_type: DiscountType::FixedAmount,
      discount_value: Decimal::from(250),
      ..draft("FLAT250")
    };
    assert!(sv.create(fixed).await.is_ok());
  }

  #[tokio::test]
  async fn test_update_coupon() {
    let db = testing::setup_test_db().await;
    let sv = Coupon::new(&db);

    let coupon = sv.create(draft("SPRING15")).await.unwrap();
    let course = Uuid::new_v4();

    let updated = sv
      .update(coupon.id, CouponPatch {
        discount_value: Some(Decimal::from(20)),
        max_uses: Some(None),
        course_id: Some(Some(course)),
        ..Default::default()
      })
      .await
      .unwrap();

    assert_eq!(updated.code, "SPRING15");
    assert_eq!(updated.discount_value, Decimal::from(20));
    assert_eq!(updated.max_uses, None);
    assert_eq!(updated.course_id, Some(course));
    assert_eq!(updated.description, coupon.description);
  }

  #[tokio::test]
  async fn test_update_rename_conflict() {
    let db = testing::setup_test_db().await;
    let sv = Coupon::new(&db);

    sv.create(draft("TAKEN")).await.unwrap();
    let coupon = sv.create(draft("OTHER")).await.unwrap();

    let rename =
      CouponPatch { code: Some("TAKEN".into()), ..Default::default() };
    assert!(matches!(
      sv.update(coupon.id, rename).await,
      Err(Error::DuplicateCode)
    ));

    // keeping its own code is not a conflict
    let same = CouponPatch { code: Some("OTHER".into()), ..Default::default() };
    assert!(sv.update(coupon.id, same).await.is_ok());

    assert!(matches!(
      sv.update(Uuid::new_v4(), CouponPatch::default()).await,
      Err(Error::CouponNotFound)
    ));
  }

  #[tokio::test]
  async fn test_deactivate_hides_from_lookup() {
    let db = testing::setup_test_db().await;
    let sv = Coupon::new(&db);

    let coupon = sv.create(draft("SPRING15")).await.unwrap();
    assert!(sv.active_by_code("SPRING15").await.unwrap().is_some());

    sv.set_active(coupon.id, false).await.unwrap();
    assert!(sv.active_by_code("SPRING15").await.unwrap().is_none());
    assert!(sv.by_id(coupon.id).await.unwrap().is_some());

    sv.set_active(coupon.id, true).await.unwrap();
    assert!(sv.active_by_code("SPRING15").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn test_claim_use_respects_cap() {
    let db = testing::setup_test_db().await;
    let coupon = testing::insert(
      &db,
      discount_coupon::Model {
        max_uses: Some(2),
        current_uses: 1,
        ..testing::coupon("LASTONE")
      },
    )
    .await;

    Coupon::claim_use(&db, coupon.id, testing::now()).await.unwrap();

    let err = assert_err!(Coupon::claim_use(&db, coupon.id, testing::now()).await);
    assert!(matches!(err, Error::Coupon(Reject::UsageLimitReached)));

    let stored = Coupon::new(&db).by_id(coupon.id).await.unwrap().unwrap();
    assert_eq!(stored.current_uses, 2);
  }

  #[tokio::test]
  async fn test_claim_use_unlimited() {
    let db = testing::setup_test_db().await;
    let coupon = testing::insert(&db, testing::coupon("OPEN")).await;

    for _ in 0..3 {
      Coupon::claim_use(&db, coupon.id, testing::now()).await.unwrap();
    }

    let stored = Coupon::new(&db).by_id(coupon.id).await.unwrap().unwrap();
    assert_eq!(stored.current_uses, 3);
  }

  #[tokio::test]
  async fn test_update_keeps_cap_above_uses() {
    let db = testing::setup_test_db().await;
    let sv = Coupon::new(&db);
    let coupon = testing::insert(
      &db,
      discount_coupon::Model {
        max_uses: Some(10),
        current_uses: 5,
        ..testing::coupon("HALFWAY")
      },
    )
    .await;

    let lower =
      CouponPatch { max_uses: Some(Some(2)), ..Default::default() };
    let err = assert_err!(sv.update(coupon.id, lower).await);
    assert!(matches!(err, Error::Invalid(_)));

    let stored = sv.by_id(coupon.id).await.unwrap().unwrap();
    assert_eq!(stored.max_uses, Some(10));

    // closing it at exactly the uses taken is allowed
    let exact =
      CouponPatch { max_uses: Some(Some(5)), ..Default::default() };
    let updated = sv.update(coupon.id, exact).await.unwrap();
    assert_eq!(updated.max_uses, Some(5));
    assert_eq!(updated.current_uses, 5);
  }

  #[tokio::test]
  async fn test_claim_use_rechecks_state() {
    let db = testing::setup_test_db().await;
    let sv = Coupon::new(&db);
    let coupon = testing::insert(
      &db,
      discount_coupon::Model {
        valid_until: Some(testing::now() + TimeDelta::days(1)),
        ..testing::coupon("WINDOW")
      },
    )
    .await;

    let later = testing::now() + TimeDelta::days(2);
    let err = assert_err!(Coupon::claim_use(&db, coupon.id, later).await);
    assert!(matches!(err, Error::Coupon(Reject::NotFoundOrExpired)));

    let earlier = testing::now() - TimeDelta::days(2);
    let err = assert_err!(Coupon::claim_use(&db, coupon.id, earlier).await);
    assert!(matches!(err, Error::Coupon(Reject::NotFoundOrExpired)));

    sv.set_active(coupon.id, false).await.unwrap();
    let err =
      assert_err!(Coupon::claim_use(&db, coupon.id, testing::now()).await);
    assert!(matches!(err, Error::Coupon(Reject::NotFoundOrExpired)));

    let stored = sv.by_id(coupon.id).await.unwrap().unwrap();
    assert_eq!(stored.current_uses, 0);
  }

  #[tokio::test]
  async fn test_unique_index_reports_duplicate() {
    let db = testing::setup_test_db().await;
    let sv = Coupon::new(&db);

    // two writers that both passed the uniqueness check
    sv.insert(testing::coupon("RACE")).await.unwrap();
    let err = assert_err!(sv.insert(testing::coupon("RACE")).await);
    assert!(matches!(err, Error::DuplicateCode));
  }
}
