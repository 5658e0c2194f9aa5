use tracing::{info, warn};

use crate::shutdown::StopSignal;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Raises `stop` once on Ctrl+C (or SIGTERM on unix).
///
/// The task also exits when the signal is raised by someone else; abort the
/// returned handle once the run is over.
pub fn setup_signal_stop_handler(stop: &StopSignal) -> tokio::task::JoinHandle<()> {
    let stop = stop.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                () = stop.stopped() => {}
                result = tokio::signal::ctrl_c() => {
                    request_stop(&stop, result);
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    request_stop(&stop, Ok(()));
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                () = stop.stopped() => {}
                result = tokio::signal::ctrl_c() => {
                    request_stop(&stop, result);
                }
            }
        }
    })
}

fn request_stop(stop: &StopSignal, result: std::io::Result<()>) {
    match result {
        Ok(()) => {
            info!("Interrupt received, finishing in-flight requests");
            stop.stop();
        }
        Err(err) => warn!("Failed to listen for Ctrl+C: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::time::Duration;

    const SHUTDOWN_HANDLER_TIMEOUT: Duration = Duration::from_secs(1);

    fn run_async_test<F>(future: F) -> Result<(), String>
    where
        F: Future<Output = Result<(), String>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| format!("Failed to build runtime: {}", err))?;
        runtime.block_on(future)
    }

    #[test]
    fn signal_handler_exits_on_stop() -> Result<(), String> {
        run_async_test(async {
            let stop = StopSignal::new();
            let handle = setup_signal_stop_handler(&stop);

            stop.stop();

            tokio::time::timeout(SHUTDOWN_HANDLER_TIMEOUT, handle)
                .await
                .map_err(|err| format!("Timed out waiting for signal handler: {}", err))?
                .map_err(|err| format!("Signal handler join error: {}", err))
        })
    }
}
