use std::{env, path::PathBuf};

use migration::{Migrator, MigratorTrait};

use crate::{
  coupon::{CouponLookup, CouponValidator, MemoryLookup, RestLookup, SystemClock},
  prelude::*,
  sv,
};

/// Where coupon lookups are served from.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
  /// Local database, also the only backend that accepts redemptions and
  /// admin edits
  Database,
  /// Hosted PostgREST-style backend
  Rest { url: String, key: String },
  /// JSON seed file loaded at startup
  Memory { seed: PathBuf },
}

impl Backend {
  pub fn is_database(&self) -> bool {
    matches!(self, Backend::Database)
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub admin_token: String,
  pub backend: Backend,
  pub rate_per_second: u64,
  pub rate_burst: u32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:coupons.db?mode=rwc"),
      port: 3000,
      admin_token: String::new(),
      backend: Backend::Database,
      rate_per_second: 2,
      rate_burst: 100,
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let mut config = Self::default();

    if let Ok(url) = env::var("DATABASE_URL") {
      config.database_url = url;
    }
    if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse().ok()) {
      config.port = port;
    }
    config.admin_token =
      env::var("ADMIN_TOKEN").context("ADMIN_TOKEN not set")?;
    anyhow::ensure!(!config.admin_token.trim().is_empty(), "ADMIN_TOKEN is empty");

    config.backend =
      match env::var("COUPON_BACKEND").as_deref().unwrap_or("db") {
        "db" | "database" => Backend::Database,
        "rest" => Backend::Rest {
          url: env::var("REST_URL").context("REST_URL not set")?,
          key: env::var("REST_KEY").context("REST_KEY not set")?,
        },
        "memory" => Backend::Memory {
          seed: env::var("COUPON_SEED_FILE")
            .context("COUPON_SEED_FILE not set")?
            .into(),
        },
        other => anyhow::bail!("Unknown COUPON_BACKEND `{other}`"),
      };

    Ok(config)
  }
}

pub struct Services<'a> {
  pub coupon: sv::Coupon<'a>,
  pub redemption: sv::Redemption<'a>,
  pub checkout: sv::Checkout<'a, Arc<dyn CouponLookup>, SystemClock>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub validator: CouponValidator<Arc<dyn CouponLookup>, SystemClock>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    let lookup: Arc<dyn CouponLookup> = match &config.backend {
      Backend::Database => Arc::new(db.clone()),
      Backend::Rest { url, key } => {
        info!("Coupon lookups served by {url}");
        Arc::new(RestLookup::new(url, key.clone())?)
      }
      Backend::Memory { seed } => {
        let input = tokio::fs::read_to_string(seed)
          .await
          .with_context(|| format!("Failed to read {}", seed.display()))?;
        let lookup = MemoryLookup::from_json(&input)?;
        info!("Loaded {} coupons from {}", lookup.len(), seed.display());
        Arc::new(lookup)
      }
    };

    Ok(Self::with_lookup(db, config, lookup))
  }

  pub fn with_lookup(
    db: DatabaseConnection,
    config: Config,
    lookup: Arc<dyn CouponLookup>,
  ) -> Self {
    Self { db, config, validator: CouponValidator::new(lookup, SystemClock) }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      coupon: sv::Coupon::new(&self.db),
      redemption: sv::Redemption::new(&self.db),
      checkout: sv::Checkout::new(&self.db, &self.validator),
    }
  }
}
