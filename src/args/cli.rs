use clap::Parser;

use super::parsers::{parse_bool_env, parse_header, parse_positive_u64, parse_positive_usize};
use super::types::{HttpMethod, OutputFormat, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Async HTTP load generator - concurrent request workers, list-file URL queues, cooperative shutdown, and a compact throughput/latency report."
)]
pub struct TesterArgs {
    /// Target URL for the load test
    #[arg(value_name = "URL", conflicts_with = "playback_file")]
    pub url: Option<String>,

    /// Duration of the test in seconds
    #[arg(
        long = "duration",
        short = 'd',
        default_value = "10",
        env = "WRKR_DURATION",
        value_parser = parse_positive_u64
    )]
    pub duration: PositiveU64,

    /// Number of concurrent workers (each with its own connection pool)
    #[arg(
        long,
        short = 'c',
        default_value = "10",
        env = "WRKR_CONCURRENCY",
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// HTTP method to use
    #[arg(long, short = 'M', default_value = "get", ignore_case = true)]
    pub method: HttpMethod,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Host header override
    #[arg(long = "host")]
    pub host_header: Option<String>,

    /// Socket/request timeout in milliseconds
    #[arg(
        long = "timeout",
        short = 'T',
        default_value = "1000",
        env = "WRKR_TIMEOUT_MS",
        value_parser = parse_positive_u64
    )]
    pub timeout_ms: PositiveU64,

    /// Follow redirects
    #[arg(long = "redir")]
    pub follow_redirects: bool,

    /// Disable compression (no Accept-Encoding hint is sent)
    #[arg(long = "no-c")]
    pub disable_compression: bool,

    /// Disable keep-alive (no TCP connection reuse between requests)
    #[arg(long = "no-ka")]
    pub disable_keepalive: bool,

    /// Skip verifying the server's TLS certificate
    #[arg(long = "no-vr")]
    pub insecure: bool,

    /// Read the target URL from a playback file
    #[arg(long = "playback", short = 'f')]
    pub playback_file: Option<String>,

    /// Request body string or @filename
    #[arg(long, default_value = "")]
    pub body: String,

    /// Client certificate file (PEM)
    #[arg(long)]
    pub cert: Option<String>,

    /// Client private key file (PEM, PKCS#8)
    #[arg(long)]
    pub key: Option<String>,

    /// CA file to verify the server against (PEM)
    #[arg(long = "ca")]
    pub cacert: Option<String>,

    /// Enable HTTP/2 (negotiated via ALPN); HTTP/1.1 only otherwise
    #[arg(long)]
    pub http2: bool,

    /// Base URL prefixed to every line of --url-file
    #[arg(long = "base-url", default_value = "")]
    pub base_url: String,

    /// File with one URL (or path under --base-url) per line
    #[arg(long = "url-file", conflicts_with_all = ["url", "playback_file"])]
    pub url_file: Option<String>,

    /// Number of passes over --url-file
    #[arg(long = "repeat", default_value = "1", value_parser = parse_positive_usize)]
    pub repeat: PositiveUsize,

    /// Fixed server address (ip:port) overriding DNS for the target host
    #[arg(long = "server-addr")]
    pub server_addr: Option<String>,

    /// Path to config file (TOML/JSON). Defaults to ./wrkr.toml or ./wrkr.json if present.
    #[arg(long)]
    pub config: Option<String>,

    /// Report format printed to stdout
    #[arg(long = "output-format", default_value = "text", ignore_case = true)]
    pub output_format: OutputFormat,

    /// Do not draw the processed-requests progress line
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,

    /// Enable verbose logging (sets log level to debug unless overridden by WRKR_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
