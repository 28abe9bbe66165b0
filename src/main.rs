//! Coupon service for the photography-school checkout
//!
//! - Validates discount coupons against the course and purchase amount
//! - Prices the purchase and redeems coupons atomically
//! - Admin API to create, edit and deactivate coupons
//!
//! Coupons are read from the local database (SeaORM), a hosted REST
//! backend, or a JSON seed file.

mod coupon;
mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;
#[cfg(test)]
mod testing;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::Supervisor,
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "coupons=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting coupon service v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(config).await?);

  let plugins = Supervisor::new(Duration::from_secs(5))
    .register(plugins::server::Plugin)
    .spawn(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
  info!("Shutting down...");

  for plugin in plugins {
    plugin.abort();
  }

  Ok(())
}
