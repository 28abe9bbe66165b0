use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(DiscountCoupons::Table)
          .if_not_exists()
          .col(ColumnDef::new(DiscountCoupons::Id).uuid().not_null().primary_key())
          .col(
            ColumnDef::new(DiscountCoupons::Code)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(DiscountCoupons::DiscountType).string().not_null())
          .col(
            ColumnDef::new(DiscountCoupons::DiscountValue)
              .decimal_len(12, 2)
              .not_null(),
          )
          .col(ColumnDef::new(DiscountCoupons::MaxUses).integer().null())
          .col(
            ColumnDef::new(DiscountCoupons::CurrentUses)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(DiscountCoupons::ValidFrom)
              .timestamp_with_time_zone()
              .not_null(),
          )
          .col(
            ColumnDef::new(DiscountCoupons::ValidUntil)
              .timestamp_with_time_zone()
              .null(),
          )
          .col(
            ColumnDef::new(DiscountCoupons::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(DiscountCoupons::CourseId).uuid().null())
          .col(
            ColumnDef::new(DiscountCoupons::MinimumPurchase)
              .decimal_len(12, 2)
              .null(),
          )
          .col(ColumnDef::new(DiscountCoupons::Description).string().null())
          .col(
            ColumnDef::new(DiscountCoupons::CreatedAt)
              .timestamp_with_time_zone()
              .not_null(),
          )
          .col(
            ColumnDef::new(DiscountCoupons::UpdatedAt)
              .timestamp_with_time_zone()
              .not_null(),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_discount_coupons_course")
          .table(DiscountCoupons::Table)
          .col(DiscountCoupons::CourseId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(DiscountCoupons::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum DiscountCoupons {
  Table,
  Id,
  Code,
  DiscountType,
  DiscountValue,
  MaxUses,
  CurrentUses,
  ValidFrom,
  ValidUntil,
  IsActive,
  CourseId,
  MinimumPurchase,
  Description,
  CreatedAt,
  UpdatedAt,
}
