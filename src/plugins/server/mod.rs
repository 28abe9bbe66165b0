mod admin;
mod handlers;

use std::{net::SocketAddr, sync::Arc};

use axum::{
  Router, middleware,
  routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

/// Checkout and admin routes. Redemption and the admin surface need the
/// local database, so they are only mounted for that backend.
pub fn routes(app: Arc<AppState>) -> Router {
  let mut router = Router::new()
    .route("/health", get(handlers::health))
    .route("/api/coupons/validate", post(handlers::validate));

  if app.config.backend.is_database() {
    let admin = Router::new()
      .route("/coupons", get(admin::list).post(admin::create))
      .route("/coupons/{id}", get(admin::get).patch(admin::update))
      .route("/coupons/{id}/activate", post(admin::activate))
      .route("/coupons/{id}/deactivate", post(admin::deactivate))
      .route("/coupons/{id}/redemptions", get(admin::redemptions))
      .route_layer(middleware::from_fn_with_state(
        app.clone(),
        admin::require_admin,
      ));

    router = router
      .route("/api/coupons/redeem", post(handlers::redeem))
      .nest("/api/admin", admin);
  }

  router
    .layer(
      ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
          .allow_origin(Any)
          .allow_methods(Any)
          .allow_headers(Any),
      ),
    )
    .with_state(app)
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(app.config.rate_per_second)
        .burst_size(app.config.rate_burst)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();
    let port = app.config.port;

    let router = routes(app)
      .layer(GovernorLayer::new(governor_conf))
      .into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {addr}");

    let limiter = async {
      loop {
        time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
          Ok(_) => info!("Server stopped gracefully"),
          Err(err) => error!("Server stopped with error: {err}"),
        }
        result
      }
      _ = limiter => {
        error!("Rate limiter cleaner stopped unexpectedly!");
        Ok(())
      }
    }
  }
}
