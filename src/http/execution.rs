use futures_util::StreamExt;
use reqwest::{Client, Request};

/// Why a single request did not count as completed.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RequestFailure {
    #[error("timed out: {source}")]
    Timeout {
        #[source]
        source: reqwest::Error,
    },
    #[error("{source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("received status code {status}")]
    Status { status: u16 },
}

impl From<reqwest::Error> for RequestFailure {
    fn from(source: reqwest::Error) -> Self {
        if source.is_timeout() {
            RequestFailure::Timeout { source }
        } else {
            RequestFailure::Transport { source }
        }
    }
}

/// Sends the request and drains the body.
///
/// 2xx and 3xx responses count as completed; the returned value is the number
/// of body bytes read.
pub(crate) async fn execute_request(
    client: &Client,
    request: Request,
) -> Result<u64, RequestFailure> {
    let response = client.execute(request).await?;
    let status = response.status();
    let response_bytes = drain_response_body(response).await?;
    if status.is_success() || status.is_redirection() {
        Ok(response_bytes)
    } else {
        Err(RequestFailure::Status {
            status: status.as_u16(),
        })
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
