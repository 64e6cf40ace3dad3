use serde::Deserialize;

use crate::args::{HttpMethod, OutputFormat};

/// On-disk configuration. Every field is optional; CLI flags win over it.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub playback: Option<String>,
    pub duration: Option<u64>,
    pub concurrency: Option<usize>,
    pub method: Option<HttpMethod>,
    pub headers: Option<Vec<String>>,
    pub host: Option<String>,
    pub timeout_ms: Option<u64>,
    pub follow_redirects: Option<bool>,
    pub disable_compression: Option<bool>,
    pub disable_keepalive: Option<bool>,
    pub insecure: Option<bool>,
    pub body: Option<String>,
    pub cert: Option<String>,
    pub key: Option<String>,
    pub ca: Option<String>,
    pub http2: Option<bool>,
    pub base_url: Option<String>,
    pub url_file: Option<String>,
    pub repeat: Option<usize>,
    pub server_addr: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub no_progress: Option<bool>,
}
