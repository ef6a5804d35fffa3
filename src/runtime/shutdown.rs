use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::visits::VisitRecorder;

/// Upper bound for the final visit flush
const FLUSH_TIMEOUT_SECS: u64 = 10;

pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!("Failed to listen for Ctrl+C: {}; shutting down", e),
    }
}

/// Write buffered visits before the process exits
pub async fn flush_visits(recorder: &VisitRecorder) {
    let pending = recorder.buffered();
    match timeout(Duration::from_secs(FLUSH_TIMEOUT_SECS), recorder.flush()).await {
        Ok(()) if recorder.buffered() == 0 => {
            info!("Flushed {} buffered visits", pending)
        }
        Ok(()) => warn!(
            "{} visits could not be written and are lost",
            recorder.buffered()
        ),
        Err(_) => error!(
            "Visit flush timed out after {}s, {} visits lost",
            FLUSH_TIMEOUT_SECS, pending
        ),
    }
}
