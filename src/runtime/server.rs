//! HTTP server

use std::time::Duration;

use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::configure;
use crate::config::get_config;
use crate::runtime::{shutdown, startup};

/// Run the server until it stops or Ctrl+C arrives, then flush visits.
///
/// Logging must be initialized first.
pub async fn run_server() -> Result<()> {
    let startup = startup::prepare_server_startup().await?;
    let config = get_config();

    let link_service = web::Data::new(startup.link_service.clone());
    let fallback_page = web::Data::new(startup.fallback_page.clone());

    let workers = config.server.cpu_count.clamp(1, 32);
    let bind_address = config.server.bind_address();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(RequestIdMiddleware)
            .app_data(link_service.clone())
            .app_data(fallback_page.clone())
            .app_data(web::PayloadConfig::new(64 * 1024))
            .configure(configure)
    })
    .keep_alive(Duration::from_secs(30))
    .workers(workers)
    .disable_signals()
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    info!(
        "Listening on http://{} ({} workers), public URL {}",
        bind_address,
        workers,
        config.server.public_base_url()
    );

    let handle = server.handle();
    tokio::select! {
        res = server => {
            res.context("HTTP server error")?;
        }
        _ = shutdown::wait_for_signal() => {
            warn!("Stopping HTTP server");
            handle.stop(true).await;
        }
    }

    shutdown::flush_visits(&startup.visit_recorder).await;
    info!("Shutdown complete");
    Ok(())
}
