//! Portfolio API gateway.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ client identity ─▶ rate limiter
//!                                                          │
//!                                                          ▼
//!                                  JSON reader/validator (bounded, strict)
//!                                                          │
//!                                                          ▼
//!     Client Response                     chat / contact / recommend
//!     ◀────────────── JSON envelope ◀───────── collaborators
//! ```
//!
//! Configuration comes from the TOML file named by `GATEWAY_CONFIG`; the
//! built-in defaults apply when it is unset. Route policies in that file are
//! reloaded while running.

use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use portfolio_gateway::config::loader::load_from_env;
use portfolio_gateway::config::watcher::ConfigWatcher;
use portfolio_gateway::lifecycle::{wait_for_signal, Shutdown};
use portfolio_gateway::observability::{logging, metrics};
use portfolio_gateway::{Backends, HttpServer};

const CONFIG_ENV: &str = "GATEWAY_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_env(CONFIG_ENV)?;
    logging::init_logging(&config.observability);

    tracing::info!("portfolio-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        chat_limit = config.routes.chat.max_requests,
        contact_limit = config.routes.contact.max_requests,
        recommend_limit = config.routes.recommend.max_requests,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match std::env::var_os(CONFIG_ENV).map(PathBuf::from) {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();

    let server = HttpServer::new(config, Backends::disabled());
    let serving = tokio::spawn(server.run(listener, config_updates, signal));

    wait_for_signal().await;
    shutdown.trigger();

    serving.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
