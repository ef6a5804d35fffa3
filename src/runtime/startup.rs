use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::services::FallbackPage;
use crate::config::get_config;
use crate::services::{CapacityGuard, LinkService};
use crate::storage::{LinkStore, SeaOrmStorage, StorageFactory};
use crate::visits::VisitRecorder;

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub link_service: Arc<LinkService>,
    pub visit_recorder: VisitRecorder,
    pub fallback_page: FallbackPage,
}

/// Connect storage, build the services and spawn their background tasks
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let started = std::time::Instant::now();
    let config = get_config();

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());
    let store: Arc<dyn LinkStore> = storage.clone();

    let visit_recorder = VisitRecorder::from_config(storage.as_visit_sink(), &config.visits);
    let background = visit_recorder.clone();
    tokio::spawn(async move { background.start_background_task().await });
    info!(
        "Visits flushed every {}s or every {} visits",
        config.visits.flush_interval_secs, config.visits.max_visits_before_flush
    );

    let capacity = Arc::new(CapacityGuard::from_config(&config.links));
    if config.links.sweep_interval_secs > 0 {
        let guard = Arc::clone(&capacity);
        let store = Arc::clone(&store);
        let interval = Duration::from_secs(config.links.sweep_interval_secs);
        tokio::spawn(guard.start_background_task(store, interval));
    }

    let link_service = Arc::new(LinkService::new(
        store,
        capacity,
        visit_recorder.clone(),
    ));
    let fallback_page = FallbackPage::from_config(&config.server);

    debug!("Startup completed in {:?}", started.elapsed());
    Ok(StartupContext {
        storage,
        link_service,
        visit_recorder,
        fallback_page,
    })
}
