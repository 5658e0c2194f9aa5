use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::template::RequestTemplate;
use super::transport::{HttpTransport, Transport};
use super::worker::{WorkerContext, run_worker};
use crate::error::HttpError;
use crate::metrics::{StatusCounts, StatusHistogram};
use crate::shutdown::StopSignal;

/// Everything a run needs, fixed at construction.
///
/// `requests >= 1` and `workers >= 1` are the caller's responsibility; the
/// CLI enforces them before building a tester. With `workers == 0` nothing
/// is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTestConfig {
    pub url: String,
    pub method: String,
    pub user_agent: String,
    /// Per-request timeout; zero disables it.
    pub timeout: Duration,
    pub requests: u64,
    pub workers: usize,
}

impl LoadTestConfig {
    /// Attempts assigned to each worker: `floor(requests / workers)`.
    #[must_use]
    pub fn quota(&self) -> u64 {
        u64::try_from(self.workers)
            .ok()
            .and_then(|workers| self.requests.checked_div(workers))
            .unwrap_or(0)
    }

    /// Attempts actually dispatched when nothing stops the run.
    #[must_use]
    pub fn planned_requests(&self) -> u64 {
        u64::try_from(self.workers)
            .map_or(0, |workers| self.quota().saturating_mul(workers))
    }

    /// Requests lost to integer partitioning (`requests mod workers`).
    #[must_use]
    pub fn undispatched_requests(&self) -> u64 {
        self.requests.saturating_sub(self.planned_requests())
    }
}

/// What happened during [`LoadTester::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub quota: u64,
    /// Attempts that were started, successful or not.
    pub attempted: u64,
    /// Requests never dispatched because they did not divide evenly.
    pub undispatched: u64,
    pub transport_errors: u64,
    pub stopped: bool,
}

/// Fixed-size worker pool sending one pre-built request against one target.
pub struct LoadTester {
    config: LoadTestConfig,
    template: Arc<RequestTemplate>,
    transport: Arc<dyn Transport>,
    histogram: Arc<StatusHistogram>,
    stop: StopSignal,
    transport_errors: Arc<AtomicU64>,
}

impl LoadTester {
    /// Builds the request template and a `reqwest` transport for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the method, URL or user agent cannot form a
    /// valid request, or when the HTTP client cannot be built.
    pub fn new(config: LoadTestConfig) -> Result<Self, HttpError> {
        let transport = HttpTransport::new(config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Same as [`LoadTester::new`] with a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns an error when the method, URL or user agent cannot form a
    /// valid request.
    pub fn with_transport(
        config: LoadTestConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, HttpError> {
        let template = RequestTemplate::new(&config.method, &config.url, &config.user_agent)?;
        Ok(Self {
            config,
            template: Arc::new(template),
            transport,
            histogram: Arc::new(StatusHistogram::new()),
            stop: StopSignal::new(),
            transport_errors: Arc::new(AtomicU64::new(0)),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    #[must_use]
    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// Runs every worker to completion or until stopped.
    ///
    /// Meant to be called once per tester. Requests that do not divide evenly
    /// across workers are not sent.
    pub async fn start(&self) -> RunReport {
        let quota = self.config.quota();
        let undispatched = self.config.undispatched_requests();
        if undispatched > 0 {
            warn!(
                "{} of {} requests do not divide across {} workers and will not be sent",
                undispatched, self.config.requests, self.config.workers
            );
        }
        info!(
            "Starting {} workers x {} requests against {} {}",
            self.config.workers,
            quota,
            self.template.method(),
            self.template.url()
        );

        let context = WorkerContext {
            transport: Arc::clone(&self.transport),
            template: Arc::clone(&self.template),
            histogram: Arc::clone(&self.histogram),
            stop: self.stop.clone(),
            transport_errors: Arc::clone(&self.transport_errors),
        };

        let mut handles = Vec::with_capacity(self.config.workers);
        for worker_id in 0..self.config.workers {
            let context = context.clone();
            handles.push(tokio::spawn(run_worker(worker_id, context, quota)));
        }

        let mut attempted: u64 = 0;
        for handle in handles {
            match handle.await {
                Ok(attempts) => attempted = attempted.saturating_add(attempts),
                Err(err) => error!("Worker task failed: {}", err),
            }
        }

        let report = RunReport {
            quota,
            attempted,
            undispatched,
            transport_errors: self.transport_errors(),
            stopped: self.stop.is_stopped(),
        };
        debug!("Run finished: {:?}", report);
        report
    }

    /// Asks every worker to stop before its next request.
    ///
    /// Idempotent and non-blocking; in-flight requests are never interrupted.
    pub fn stop(&self) {
        if self.stop.stop() {
            info!("Stop requested; workers will exit after their current request");
        }
    }

    /// Handle that can stop this tester from another task or thread.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Snapshot of the status-code histogram; partial while running.
    #[must_use]
    pub fn result(&self) -> StatusCounts {
        self.histogram.snapshot()
    }

    /// Attempts that ended in a transport error so far.
    #[must_use]
    pub fn transport_errors(&self) -> u64 {
        self.transport_errors.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for LoadTester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadTester")
            .field("config", &self.config)
            .field("template", &self.template)
            .field("stopped", &self.stop.is_stopped())
            .finish_non_exhaustive()
    }
}
