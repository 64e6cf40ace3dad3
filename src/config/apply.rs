use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveU64, PositiveUsize, TesterArgs, parse_header};
use crate::error::ConfigError;

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments.
///
/// Values given on the command line or through the environment are kept.
///
/// # Errors
///
/// Returns an error when config values are invalid.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "playback_file")
        && let Some(path) = config.playback.clone()
    {
        args.playback_file = Some(path);
    }

    if !is_cli(matches, "duration")
        && let Some(duration) = config.duration
    {
        args.duration = ensure_positive_u64(duration, "duration")?;
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = ensure_positive_usize(concurrency, "concurrency")?;
    }

    if !is_cli(matches, "method")
        && let Some(method) = config.method
    {
        args.method = method;
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            parsed.push(
                parse_header(header).map_err(|err| ConfigError::InvalidHeader { source: err })?,
            );
        }
        args.headers = parsed;
    }

    if !is_cli(matches, "host_header")
        && let Some(host) = config.host.clone()
    {
        args.host_header = Some(host);
    }

    if !is_cli(matches, "timeout_ms")
        && let Some(timeout_ms) = config.timeout_ms
    {
        args.timeout_ms = ensure_positive_u64(timeout_ms, "timeout_ms")?;
    }

    apply_flag(
        matches,
        "follow_redirects",
        config.follow_redirects,
        &mut args.follow_redirects,
    );
    apply_flag(
        matches,
        "disable_compression",
        config.disable_compression,
        &mut args.disable_compression,
    );
    apply_flag(
        matches,
        "disable_keepalive",
        config.disable_keepalive,
        &mut args.disable_keepalive,
    );
    apply_flag(matches, "insecure", config.insecure, &mut args.insecure);
    apply_flag(matches, "http2", config.http2, &mut args.http2);
    apply_flag(
        matches,
        "no_progress",
        config.no_progress,
        &mut args.no_progress,
    );

    if !is_cli(matches, "body")
        && let Some(body) = config.body.clone()
    {
        args.body = body;
    }

    if !is_cli(matches, "cert")
        && let Some(cert) = config.cert.clone()
    {
        args.cert = Some(cert);
    }

    if !is_cli(matches, "key")
        && let Some(key) = config.key.clone()
    {
        args.key = Some(key);
    }

    if !is_cli(matches, "cacert")
        && let Some(ca) = config.ca.clone()
    {
        args.cacert = Some(ca);
    }

    if !is_cli(matches, "base_url")
        && let Some(base_url) = config.base_url.clone()
    {
        args.base_url = base_url;
    }

    if !is_cli(matches, "url_file")
        && let Some(url_file) = config.url_file.clone()
    {
        args.url_file = Some(url_file);
    }

    if !is_cli(matches, "repeat")
        && let Some(repeat) = config.repeat
    {
        args.repeat = ensure_positive_usize(repeat, "repeat")?;
    }

    if !is_cli(matches, "server_addr")
        && let Some(addr) = config.server_addr.clone()
    {
        args.server_addr = Some(addr);
    }

    if !is_cli(matches, "output_format")
        && let Some(format) = config.output_format
    {
        args.output_format = format;
    }

    Ok(())
}

fn apply_flag(matches: &ArgMatches, name: &str, value: Option<bool>, target: &mut bool) {
    if !is_cli(matches, name)
        && let Some(value) = value
    {
        *target = value;
    }
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn ensure_positive_u64(value: u64, field: &'static str) -> Result<PositiveU64, ConfigError> {
    PositiveU64::try_from(value)
        .map_err(|err| ConfigError::FieldMustBePositive { field, source: err })
}

fn ensure_positive_usize(value: usize, field: &'static str) -> Result<PositiveUsize, ConfigError> {
    PositiveUsize::try_from(value)
        .map_err(|err| ConfigError::FieldMustBePositive { field, source: err })
}
