use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("URL '{url}' is missing a host.")]
    UrlMissingHost { url: String },
    #[error("Could not read body file '{path}': {source}")]
    ReadBodyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read playback file '{path}': {source}")]
    ReadPlaybackFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Playback file '{path}' was empty.")]
    PlaybackFileEmpty { path: PathBuf },
    #[error("Failed to read URL file '{path}': {source}")]
    ReadUrlFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read cacert '{path}': {source}")]
    ReadCacert {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid cacert '{path}': {source}")]
    InvalidCacert {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read cert '{path}': {source}")]
    ReadCert {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read key '{path}': {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid cert/key: {source}")]
    InvalidIdentity {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
}
