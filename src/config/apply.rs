use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::parsers::parse_method;
use crate::args::{PositiveU64, PositiveUsize, TesterArgs};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments.
///
/// Options set explicitly on the command line keep their CLI value.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "url") {
        if let Some(url) = config.url.clone() {
            args.url = Some(url);
        }
    }

    if !is_cli(matches, "method") {
        if let Some(method) = config.method.as_deref() {
            args.method = parse_method(method).map_err(|err| invalid_field("method", err))?;
        }
    }

    if !is_cli(matches, "user_agent") {
        if let Some(user_agent) = config.user_agent.clone() {
            args.user_agent = user_agent;
        }
    }

    if !is_cli(matches, "request_timeout") {
        if let Some(timeout) = config.timeout.as_ref() {
            args.request_timeout = timeout
                .to_duration()
                .map_err(|err| invalid_field("timeout", err))?;
        }
    }

    if !is_cli(matches, "requests") {
        if let Some(requests) = config.requests {
            args.requests = ensure_positive_u64(requests, "requests")?;
        }
    }

    if !is_cli(matches, "concurrency") {
        if let Some(concurrency) = config.concurrency {
            args.concurrency = ensure_positive_usize(concurrency, "concurrency")?;
        }
    }

    if !is_cli(matches, "output_format") {
        if let Some(format) = config.output_format {
            args.output_format = format;
        }
    }

    if !is_cli(matches, "verbose") {
        if let Some(verbose) = config.verbose {
            args.verbose = verbose;
        }
    }

    if !is_cli(matches, "no_color") {
        if let Some(no_color) = config.no_color {
            args.no_color = no_color;
        }
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn invalid_field(field: &str, source: ValidationError) -> AppError {
    AppError::config(ConfigError::InvalidField {
        field: field.to_owned(),
        source,
    })
}

fn ensure_positive_u64(value: u64, field: &str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}
