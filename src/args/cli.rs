use clap::Parser;
use std::time::Duration;

use super::defaults::{DEFAULT_CONCURRENCY, DEFAULT_REQUESTS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use super::parsers::{parse_method, parse_positive_u64, parse_positive_usize, parse_timeout_arg};
use super::types::{OutputFormat, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    name = "load-test",
    version,
    about = "Send a fixed number of HTTP requests from a pool of concurrent workers and report the status codes."
)]
pub struct TesterArgs {
    /// Target URL: http[s]://hostname[:port]/path
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Number of requests to make
    #[arg(
        long = "requests",
        short = 'n',
        default_value = DEFAULT_REQUESTS,
        value_parser = parse_positive_u64
    )]
    pub requests: PositiveU64,

    /// Number of requests to run at a time (one worker each)
    #[arg(
        long = "concurrency",
        short = 'c',
        default_value = DEFAULT_CONCURRENCY,
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// HTTP method (case-insensitive)
    #[arg(long, short = 'X', default_value = "GET", value_parser = parse_method)]
    pub method: String,

    /// User-Agent header to send requests with
    #[arg(long = "user-agent", short = 'A', default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-request timeout (supports ms/s/m/h, bare numbers are seconds; 0 disables it)
    #[arg(
        long = "timeout",
        short = 't',
        alias = "time-out",
        default_value = DEFAULT_TIMEOUT,
        value_parser = parse_timeout_arg
    )]
    pub request_timeout: Duration,

    /// Result format written to stderr
    #[arg(long = "output-format", short = 'o', value_enum, default_value_t = OutputFormat::Json)]
    pub output_format: OutputFormat,

    /// Path to config file (TOML/JSON). Defaults to ./load-test.toml or ./load-test.json if present.
    #[arg(long)]
    pub config: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by LOAD_TEST_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
