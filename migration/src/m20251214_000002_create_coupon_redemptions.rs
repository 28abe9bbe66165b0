use sea_orm_migration::prelude::*;

use super::m20251214_000001_create_discount_coupons::DiscountCoupons;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(CouponRedemptions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(CouponRedemptions::Id).uuid().not_null().primary_key(),
          )
          .col(ColumnDef::new(CouponRedemptions::CouponId).uuid().not_null())
          .col(ColumnDef::new(CouponRedemptions::CourseId).uuid().null())
          .col(ColumnDef::new(CouponRedemptions::Customer).string().not_null())
          .col(
            ColumnDef::new(CouponRedemptions::PurchaseAmount)
              .decimal_len(12, 2)
              .not_null(),
          )
          .col(
            ColumnDef::new(CouponRedemptions::DiscountAmount)
              .decimal_len(12, 2)
              .not_null(),
          )
          .col(
            ColumnDef::new(CouponRedemptions::RedeemedAt)
              .timestamp_with_time_zone()
              .not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_coupon_redemptions_coupon")
              .from(CouponRedemptions::Table, CouponRedemptions::CouponId)
              .to(DiscountCoupons::Table, DiscountCoupons::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_coupon_redemptions_coupon")
          .table(CouponRedemptions::Table)
          .col(CouponRedemptions::CouponId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(CouponRedemptions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum CouponRedemptions {
  Table,
  Id,
  CouponId,
  CourseId,
  Customer,
  PurchaseAmount,
  DiscountAmount,
  RedeemedAt,
}
