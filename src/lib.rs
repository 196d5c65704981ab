//! Small HTTP backend: greetings, a database diagnostics probe and an instant-answer proxy.

use std::{future::Future, sync::Arc};

use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::Config,
    database::DatabaseHandle,
    http::{Deps, HttpServer},
    lookup::LookupClient,
    types::Result,
};

pub mod config;
pub mod database;
pub mod http;
pub mod lookup;
pub mod probe;
pub mod types;
pub mod utils;

pub async fn start() -> Result<()> {
    let config = Config::new();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let tracker = TaskTracker::new();
    let token = CancellationToken::new();
    tracker.spawn_shutdown_listener(token.clone());

    let lookup = LookupClient::new(&config.lookup_url).map_err(|e| {
        tracing::error!("🚫 Invalid instant-answer url \"{}\": {e}", config.lookup_url);
        e
    })?;
    let database = DatabaseHandle::acquire(&config).await;
    let deps = Deps::new(Arc::new(database), Arc::new(lookup));
    tracker.spawn_http_server(token, config.http_port, deps);

    tracker.close();
    tracker.wait().await;
    Ok(())
}

/// Spawns a critical task. If the task fails, the given token is cancelled.
async fn critical_task<F>(name: &str, token: CancellationToken, task: F) -> Result<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    task.await.map_err(|e| {
        tracing::error!("🚫 Critical task \"{name}\" failed: {e}");
        token.cancel();
        e
    })
}

trait TaskTrackerEx {
    fn spawn_http_server(&self, token: CancellationToken, port: u16, deps: Deps);

    fn spawn_shutdown_listener(&self, token: CancellationToken);
}

impl TaskTrackerEx for TaskTracker {
    fn spawn_http_server(&self, token: CancellationToken, port: u16, deps: Deps) {
        let http = HttpServer::new(port, deps);
        self.spawn(critical_task(
            "http_server",
            token.clone(),
            async move { http.serve(token).await },
        ));
    }

    fn spawn_shutdown_listener(&self, token: CancellationToken) {
        async fn shutdown_signal(token: CancellationToken) {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    tracing::error!("🚫 Failed to listen for Ctrl+C: {e}");
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    },
                    Err(e) => {
                        tracing::error!("🚫 Failed to listen for SIGTERM: {e}");
                        std::future::pending::<()>().await;
                    },
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    tracing::info!("🚫 Received shutdown signal");
                    token.cancel();
                },
                _ = terminate => {
                    tracing::info!("🚫 Received termination signal");
                    token.cancel();
                },
                _ = token.cancelled() => {},
            }
        }

        self.spawn(shutdown_signal(token));
    }
}
