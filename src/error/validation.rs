use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid header '{value}'. Header name must not be empty.")]
    HeaderNameEmpty { value: String },
    #[error("Invalid header name '{name}': {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderName,
    },
    #[error("Invalid header value for '{name}': {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
    #[error("Invalid boolean '{value}'. Expected true/false, yes/no, on/off, or 1/0.")]
    InvalidBoolean { value: String },
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("--cert requires --key.")]
    CertWithoutKey,
    #[error("--key requires --cert.")]
    KeyWithoutCert,
    #[error("Missing URL (pass a URL, --playback, or --url-file).")]
    MissingTarget,
    #[error("Cannot combine a fixed URL with --url-file.")]
    TargetConflict,
    #[error("Invalid server address '{value}'. Expected 'ip:port': {source}")]
    InvalidServerAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("--server-addr requires a URL or --base-url with a host.")]
    ServerAddrWithoutHost,
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
