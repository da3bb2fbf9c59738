use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;

/// Periodically moves confirmed bookings whose session has started to completed.
pub async fn start_background_worker(state: Arc<AppState>) {
    let every = Duration::from_secs(state.config.completion_sweep_secs.max(1));
    info!("Starting booking completion worker (every {:?})...", every);

    loop {
        let span = info_span!("completion_sweep");
        async {
            match state.booking_service.complete_past_bookings().await {
                Ok(0) => {}
                Ok(completed) => info!("Marked {} bookings as completed", completed),
                Err(e) => error!("Completion sweep failed: {:?}", e),
            }
        }
            .instrument(span)
            .await;

        sleep(every).await;
    }
}
