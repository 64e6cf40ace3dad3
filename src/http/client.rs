use std::time::Duration;

use reqwest::{Client, redirect};

use crate::args::DEFAULT_USER_AGENT;
use crate::config::{LoadSessionConfig, TargetSource};
use crate::error::HttpError;

/// Builds one worker's client from the session settings.
///
/// Every call produces an independent connection pool.
///
/// # Errors
///
/// Returns an error when reqwest rejects the client configuration.
pub fn build_client(config: &LoadSessionConfig) -> Result<Client, HttpError> {
    let mut builder = Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout)
        .user_agent(DEFAULT_USER_AGENT);

    builder = if config.follow_redirects {
        builder.redirect(redirect::Policy::default())
    } else {
        builder.redirect(redirect::Policy::none())
    };

    if config.disable_keepalive {
        builder = builder
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Some(Duration::ZERO));
    }

    if config.disable_compression {
        builder = builder.no_gzip().no_brotli().no_deflate();
    }

    builder = if !config.http2 {
        builder.http1_only()
    } else if targets_cleartext(&config.target) {
        builder.http2_prior_knowledge()
    } else {
        builder
    };

    builder = config.tls.apply(builder, config.insecure);

    if let Some(server) = config.server_override.as_ref() {
        builder = builder.resolve(&server.host, server.addr);
    }

    builder
        .build()
        .map_err(|err| HttpError::BuildClientFailed { source: err })
}

/// Cleartext targets cannot negotiate h2 through ALPN.
fn targets_cleartext(target: &TargetSource) -> bool {
    let reference = match target {
        TargetSource::Fixed(url) => url.as_str(),
        TargetSource::UrlFile { base_url, .. } => base_url.as_str(),
    };
    reference.starts_with("http://")
}
