use std::time::Duration;

use reqwest::Url;

use super::types::{PositiveU64, PositiveUsize};
use crate::error::ValidationError;

pub(super) fn parse_positive_u64(s: &str) -> Result<PositiveU64, ValidationError> {
    s.parse::<PositiveU64>()
}

pub(super) fn parse_positive_usize(s: &str) -> Result<PositiveUsize, ValidationError> {
    s.parse::<PositiveUsize>()
}

/// Uppercases the method token; token syntax is checked when the request
/// template is built.
pub(crate) fn parse_method(s: &str) -> Result<String, ValidationError> {
    let method = s.trim();
    if method.is_empty() {
        return Err(ValidationError::MethodEmpty);
    }
    Ok(method.to_ascii_uppercase())
}

/// Parses a per-request timeout. Bare numbers are seconds, `ms`/`s`/`m`/`h`
/// suffixes are accepted, and zero means no timeout.
pub(crate) fn parse_timeout_arg(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    let mut digits_len = 0usize;
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits_len = digits_len.saturating_add(1);
        } else {
            break;
        }
    }
    if digits_len == 0 {
        return Err(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|err| ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    match unit {
        "ms" => Ok(Duration::from_millis(number)),
        "s" => Ok(Duration::from_secs(number)),
        "m" => number
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or(ValidationError::DurationOverflow),
        "h" => number
            .checked_mul(60)
            .and_then(|minutes| minutes.checked_mul(60))
            .map(Duration::from_secs)
            .ok_or(ValidationError::DurationOverflow),
        _ => Err(ValidationError::InvalidDurationUnit {
            unit: unit.to_owned(),
        }),
    }
}

/// Accepts absolute `http`/`https` URLs only.
pub(crate) fn parse_target_url(s: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(s.trim()).map_err(|err| ValidationError::InvalidUrl {
        url: s.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ValidationError::UnsupportedUrlScheme {
            url: s.to_owned(),
            scheme: scheme.to_owned(),
        }),
    }
}
