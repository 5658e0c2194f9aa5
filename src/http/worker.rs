use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::template::RequestTemplate;
use super::transport::Transport;
use crate::metrics::StatusHistogram;
use crate::shutdown::StopSignal;

/// Shared handles each worker task receives.
#[derive(Clone)]
pub(super) struct WorkerContext {
    pub(super) transport: Arc<dyn Transport>,
    pub(super) template: Arc<RequestTemplate>,
    pub(super) histogram: Arc<StatusHistogram>,
    pub(super) stop: StopSignal,
    pub(super) transport_errors: Arc<AtomicU64>,
}

/// Runs up to `quota` request attempts, returning how many were started.
///
/// The stop flag is checked before each attempt only; an attempt that has
/// started always finishes. Failed attempts are logged and skipped.
pub(super) async fn run_worker(worker_id: usize, context: WorkerContext, quota: u64) -> u64 {
    let mut attempts: u64 = 0;
    for _ in 0..quota {
        if context.stop.is_stopped() {
            debug!("Worker {} stopping after {} attempts", worker_id, attempts);
            break;
        }
        attempts = attempts.saturating_add(1);

        match context.transport.send(&context.template).await {
            Ok(status) => context.histogram.record(status),
            Err(err) => {
                context.transport_errors.fetch_add(1, Ordering::Relaxed);
                warn!("request failed: {}", err);
            }
        }
    }
    attempts
}
