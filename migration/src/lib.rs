pub use sea_orm_migration::prelude::*;

mod m20251214_000001_create_discount_coupons;
mod m20251214_000002_create_coupon_redemptions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20251214_000001_create_discount_coupons::Migration),
      Box::new(m20251214_000002_create_coupon_redemptions::Migration),
    ]
  }
}
