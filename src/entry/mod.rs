//! Binary entry: flags and config -> validated run -> report.
use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::{debug, info};

use crate::args::TesterArgs;
use crate::args::parsers::parse_target_url;
use crate::config::{apply_config, load_config};
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::{LoadTestConfig, LoadTester};
use crate::shutdown_handlers::setup_signal_stop_handler;
use crate::system::logger::init_logging;
use crate::system::summary_output::write_result;

/// Parses the command line, runs the load test, and prints the result.
///
/// # Errors
///
/// Returns an error when arguments or config are invalid, the request cannot
/// be built, or the result cannot be written.
pub fn run() -> AppResult<()> {
    let matches = TesterArgs::command().get_matches();
    let mut args = TesterArgs::from_arg_matches(&matches)?;
    merge_config(&mut args, &matches)?;

    init_logging(args.verbose, args.no_color);

    let config = match build_load_test_config(&args) {
        Ok(config) => config,
        Err(err) => {
            if matches!(err, AppError::Validation(ValidationError::MissingUrl)) {
                eprintln!("{}", TesterArgs::command().render_help());
            }
            return Err(err);
        }
    };
    let tester = LoadTester::new(config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(&tester, &args))
}

fn merge_config(args: &mut TesterArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(args, matches, &config)?;
    }
    Ok(())
}

/// Turns validated CLI values into the engine's configuration.
///
/// # Errors
///
/// Returns an error when the URL is missing or not an absolute http(s) URL.
pub fn build_load_test_config(args: &TesterArgs) -> AppResult<LoadTestConfig> {
    let raw_url = args
        .url
        .as_deref()
        .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
    let url = parse_target_url(raw_url)?;

    Ok(LoadTestConfig {
        url: url.into(),
        method: args.method.clone(),
        user_agent: args.user_agent.clone(),
        timeout: args.request_timeout,
        requests: args.requests.get(),
        workers: args.concurrency.get(),
    })
}

async fn run_async(tester: &LoadTester, args: &TesterArgs) -> AppResult<()> {
    let signal_handle = setup_signal_stop_handler(&tester.stop_signal());

    let report = tester.start().await;
    signal_handle.abort();

    info!(
        "Finished: {} attempted, {} failed{}",
        report.attempted,
        report.transport_errors,
        if report.stopped { " (stopped early)" } else { "" }
    );
    debug!("Run report: {:?}", report);

    write_result(&tester.result(), &report, args.output_format)
}
