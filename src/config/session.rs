use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, Url};

use crate::args::{PositiveUsize, TesterArgs};
use crate::error::{AppError, AppResult, HttpError, ValidationError};
use crate::http::TlsMaterial;

/// Prefix marking a body argument as a file reference.
const BODY_FILE_MARKER: char = '@';

/// Where workers get their targets from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    /// Every request goes to the same URL.
    Fixed(String),
    /// URLs are streamed from a list file, `base_url + line`, `repeat` passes.
    UrlFile {
        path: PathBuf,
        base_url: String,
        repeat: PositiveUsize,
    },
}

/// Pins the target host to a fixed socket address instead of DNS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOverride {
    pub host: String,
    pub addr: SocketAddr,
}

/// Fully resolved settings for one load session.
///
/// Built once from the CLI/config layer; every file reference (body, playback,
/// TLS material) is read here so a bad path fails before any network activity.
#[derive(Debug, Clone)]
pub struct LoadSessionConfig {
    pub duration: Duration,
    pub concurrency: PositiveUsize,
    pub target: TargetSource,
    pub method: Method,
    pub body: String,
    /// Lowercased header names; later duplicates replace earlier ones.
    pub headers: BTreeMap<String, String>,
    pub host_header: Option<String>,
    pub request_timeout: Duration,
    pub follow_redirects: bool,
    pub disable_compression: bool,
    pub disable_keepalive: bool,
    pub insecure: bool,
    pub tls: TlsMaterial,
    pub http2: bool,
    pub server_override: Option<ServerOverride>,
}

impl LoadSessionConfig {
    /// Resolves CLI arguments into a session configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid headers, missing or conflicting targets,
    /// unreadable body/playback/URL/TLS files, or a bad `--server-addr`.
    pub fn from_args(args: &TesterArgs) -> AppResult<Self> {
        let tls = TlsMaterial::load(
            args.cacert.as_deref(),
            args.cert.as_deref(),
            args.key.as_deref(),
        )?;
        let target = resolve_target(args)?;
        let headers = normalize_headers(&args.headers)?;
        let body = resolve_body(&args.body)?;
        let server_override = match args.server_addr.as_deref() {
            Some(value) => Some(resolve_server_override(value, &target)?),
            None => None,
        };

        Ok(Self {
            duration: Duration::from_secs(args.duration.get()),
            concurrency: args.concurrency,
            target,
            method: args.method.into(),
            body,
            headers,
            host_header: args.host_header.clone(),
            request_timeout: Duration::from_millis(args.timeout_ms.get()),
            follow_redirects: args.follow_redirects,
            disable_compression: args.disable_compression,
            disable_keepalive: args.disable_keepalive,
            insecure: args.insecure,
            tls,
            http2: args.http2,
            server_override,
        })
    }

    /// Human-readable description of the target for the start banner.
    #[must_use]
    pub fn target_label(&self) -> String {
        match &self.target {
            TargetSource::Fixed(url) => url.clone(),
            TargetSource::UrlFile {
                path,
                base_url,
                repeat,
            } => format!(
                "{}<{}> x{}",
                base_url,
                path.display(),
                repeat.get()
            ),
        }
    }
}

fn resolve_target(args: &TesterArgs) -> AppResult<TargetSource> {
    let fixed = match (args.url.as_deref(), args.playback_file.as_deref()) {
        (Some(_), Some(_)) => return Err(AppError::validation(ValidationError::TargetConflict)),
        (Some(url), None) => Some(url.to_owned()),
        (None, Some(path)) => Some(read_playback_file(Path::new(path))?),
        (None, None) => None,
    };

    match (fixed, args.url_file.as_deref()) {
        (Some(_), Some(_)) => Err(AppError::validation(ValidationError::TargetConflict)),
        (Some(url), None) => {
            parse_target_url(&url)?;
            Ok(TargetSource::Fixed(url))
        }
        (None, Some(path)) => {
            let path = PathBuf::from(path);
            std::fs::File::open(&path).map_err(|err| {
                AppError::http(HttpError::ReadUrlFile {
                    path: path.clone(),
                    source: err,
                })
            })?;
            Ok(TargetSource::UrlFile {
                path,
                base_url: args.base_url.clone(),
                repeat: args.repeat,
            })
        }
        (None, None) => Err(AppError::validation(ValidationError::MissingTarget)),
    }
}

fn parse_target_url(url: &str) -> AppResult<Url> {
    let parsed = Url::parse(url).map_err(|err| {
        AppError::http(HttpError::InvalidUrl {
            url: url.to_owned(),
            source: err,
        })
    })?;
    if parsed.host_str().is_none() {
        return Err(AppError::http(HttpError::UrlMissingHost {
            url: url.to_owned(),
        }));
    }
    Ok(parsed)
}

fn read_playback_file(path: &Path) -> AppResult<String> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::http(HttpError::ReadPlaybackFile {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    let url = content.trim();
    if url.is_empty() {
        return Err(AppError::http(HttpError::PlaybackFileEmpty {
            path: path.to_path_buf(),
        }));
    }
    Ok(url.to_owned())
}

pub(crate) fn resolve_body(body: &str) -> AppResult<String> {
    match body.strip_prefix(BODY_FILE_MARKER) {
        Some(path) => std::fs::read_to_string(path).map_err(|err| {
            AppError::http(HttpError::ReadBodyFile {
                path: PathBuf::from(path),
                source: err,
            })
        }),
        None => Ok(body.to_owned()),
    }
}

pub(crate) fn normalize_headers(
    headers: &[(String, String)],
) -> Result<BTreeMap<String, String>, ValidationError> {
    let mut normalized = BTreeMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
            ValidationError::InvalidHeaderName {
                name: key.clone(),
                source: err,
            }
        })?;
        HeaderValue::from_str(value).map_err(|err| ValidationError::InvalidHeaderValue {
            name: key.clone(),
            source: err,
        })?;
        normalized.insert(name.as_str().to_owned(), value.clone());
    }
    Ok(normalized)
}

fn resolve_server_override(value: &str, target: &TargetSource) -> AppResult<ServerOverride> {
    let addr: SocketAddr = value.trim().parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidServerAddr {
            value: value.to_owned(),
            source: err,
        })
    })?;
    let reference = match target {
        TargetSource::Fixed(url) => url.as_str(),
        TargetSource::UrlFile { base_url, .. } => base_url.as_str(),
    };
    if reference.is_empty() {
        return Err(AppError::validation(ValidationError::ServerAddrWithoutHost));
    }
    let parsed = parse_target_url(reference)?;
    let host = parsed.host_str().unwrap_or_default().to_owned();
    Ok(ServerOverride { host, addr })
}
