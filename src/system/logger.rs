use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LOG_ENV: &str = "LOAD_TEST_LOG";

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `LOAD_TEST_LOG` wins over `RUST_LOG`; without either, the level is `info`
/// (`debug` when `verbose`).
pub fn init_logging(verbose: bool, no_color: bool) {
    let directive = log_directive(
        std::env::var(LOG_ENV).ok().as_deref(),
        std::env::var("RUST_LOG").ok().as_deref(),
        verbose,
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

fn log_directive(load_test_log: Option<&str>, rust_log: Option<&str>, verbose: bool) -> String {
    let fallback = if verbose { "debug" } else { "info" };
    [load_test_log, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_owned()
}
