use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::metrics::StatsRecord;
use crate::shutdown::StopSwitch;

use super::execution::execute_request;
use super::request::RequestTemplate;

/// Where a worker takes its next URL from.
#[derive(Debug, Clone)]
pub(crate) enum UrlSource {
    Fixed(Arc<str>),
    Queue(async_channel::Receiver<String>),
}

impl UrlSource {
    /// Next target, or `None` once the queue is closed and drained or the
    /// deadline passes while waiting.
    async fn next(&self, deadline: Instant) -> Option<String> {
        match self {
            UrlSource::Fixed(url) => Some(url.to_string()),
            UrlSource::Queue(rx) => tokio::time::timeout_at(deadline, rx.recv())
                .await
                .ok()
                .and_then(Result::ok),
        }
    }
}

/// One request loop with its own client and its own stats.
pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) client: Client,
    pub(crate) template: Arc<RequestTemplate>,
    pub(crate) source: UrlSource,
    pub(crate) stop: StopSwitch,
    pub(crate) duration: Duration,
}

impl Worker {
    /// Runs the loop and hands the record to the aggregator.
    pub(crate) async fn run(self, stats_tx: mpsc::Sender<StatsRecord>) {
        let record = self.request_loop().await;
        debug!(
            "Worker {} done: {} requests, {} errors",
            self.id, record.num_requests, record.num_errors
        );
        if stats_tx.send(record).await.is_err() {
            debug!("Worker {} finished after the aggregator closed", self.id);
        }
    }

    async fn request_loop(&self) -> StatsRecord {
        let started = Instant::now();
        let deadline = started.checked_add(self.duration).unwrap_or(started);
        let mut stats = StatsRecord::default();

        loop {
            if self.stop.is_stopped() || started.elapsed() > self.duration {
                break;
            }
            let Some(url) = self.source.next(deadline).await else {
                break;
            };

            let request = match self.template.build(&self.client, &url) {
                Ok(request) => request,
                Err(err) => {
                    stats.record_failure(&url, err.to_string());
                    continue;
                }
            };

            let request_start = Instant::now();
            match execute_request(&self.client, request).await {
                Ok(response_bytes) => stats.record_success(request_start.elapsed(), response_bytes),
                Err(failure) => stats.record_failure(&url, failure.to_string()),
            }
        }

        stats
    }
}
