pub mod server;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{prelude::*, state::AppState};

/// Long-running part of the service (HTTP server, background jobs).
#[async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

/// Supervises plugins: each runs in its own task and is started again
/// after `restart_delay` whenever it returns or panics.
pub struct Supervisor {
  plugins: Vec<Arc<dyn Plugin>>,
  restart_delay: Duration,
}

impl Supervisor {
  pub fn new(restart_delay: Duration) -> Self {
    Self { plugins: Vec::new(), restart_delay }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  /// Aborting a returned handle stops that plugin for good.
  pub fn spawn(self, app: Arc<AppState>) -> Vec<JoinHandle<()>> {
    let delay = self.restart_delay;

    self
      .plugins
      .into_iter()
      .map(|plugin| {
        let app = app.clone();
        tokio::spawn(supervise(plugin, app, delay))
      })
      .collect()
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>, delay: Duration) {
  let name = plugin.name();
  info!(plugin = name, "Plugin started");

  loop {
    let run = tokio::spawn({
      let plugin = plugin.clone();
      let app = app.clone();
      async move { plugin.start(app).await }
    });

    match run.await {
      Ok(Ok(())) => warn!(plugin = name, "Plugin returned, restarting"),
      Ok(Err(err)) => error!(plugin = name, "Plugin failed: {err:#}"),
      Err(err) if err.is_cancelled() => {
        info!(plugin = name, "Plugin cancelled");
        return;
      }
      Err(_) => error!(plugin = name, "Plugin panicked"),
    }

    time::sleep(delay).await;
  }
}
