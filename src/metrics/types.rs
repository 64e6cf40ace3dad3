use std::time::Duration;

/// The most recent failed request of a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRequest {
    pub url: String,
    pub message: String,
}

/// Outcome counters of a single worker.
///
/// Owned and mutated by its worker only, then handed to the aggregator by
/// value exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsRecord {
    pub num_requests: u64,
    pub num_errors: u64,
    pub total_response_bytes: u64,
    /// Sum of per-request latencies, not wall time.
    pub total_request_duration: Duration,
    pub min_latency: Option<Duration>,
    pub max_latency: Option<Duration>,
    pub last_error: Option<FailedRequest>,
}

impl StatsRecord {
    pub fn record_success(&mut self, latency: Duration, response_bytes: u64) {
        self.num_requests = self.num_requests.saturating_add(1);
        self.total_response_bytes = self.total_response_bytes.saturating_add(response_bytes);
        self.total_request_duration = self.total_request_duration.saturating_add(latency);
        self.min_latency = min_latency(self.min_latency, Some(latency));
        self.max_latency = max_latency(self.max_latency, Some(latency));
    }

    pub fn record_failure(&mut self, url: &str, message: String) {
        self.num_errors = self.num_errors.saturating_add(1);
        self.last_error = Some(FailedRequest {
            url: url.to_owned(),
            message,
        });
    }
}

/// Session-wide merge of every received [`StatsRecord`].
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    pub num_requests: u64,
    pub num_errors: u64,
    pub total_response_bytes: u64,
    pub total_request_duration: Duration,
    pub min_latency: Option<Duration>,
    pub max_latency: Option<Duration>,
    /// Sum of `1 / total_request_duration` over the workers that reported
    /// without a failing URL.
    pub rate_accumulator: f64,
    pub records_received: usize,
    /// Wall-clock session time, measured by the orchestrator.
    pub elapsed: Duration,
    pub interrupted: bool,
}

impl AggregateReport {
    /// Folds one worker's record into the report.
    ///
    /// Sums, min and max are order independent. Returns the record's last
    /// failure when it should be surfaced right away; such records do not
    /// contribute to the rate accumulator.
    pub fn merge(&mut self, record: StatsRecord) -> Option<FailedRequest> {
        self.num_requests = self.num_requests.saturating_add(record.num_requests);
        self.num_errors = self.num_errors.saturating_add(record.num_errors);
        self.total_response_bytes = self
            .total_response_bytes
            .saturating_add(record.total_response_bytes);
        self.total_request_duration = self
            .total_request_duration
            .saturating_add(record.total_request_duration);
        self.min_latency = min_latency(self.min_latency, record.min_latency);
        self.max_latency = max_latency(self.max_latency, record.max_latency);
        self.records_received = self.records_received.saturating_add(1);

        match record.last_error {
            Some(failure) if record.num_errors > 0 && !failure.url.is_empty() => Some(failure),
            Some(_) | None => {
                let busy_secs = record.total_request_duration.as_secs_f64();
                // an idle worker has no rate to contribute
                if busy_secs > 0.0 {
                    self.rate_accumulator += 1.0 / busy_secs;
                }
                None
            }
        }
    }

    /// True when no request completed successfully.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_requests == 0
    }

    /// Completed requests per second of wall-clock session time.
    #[must_use]
    pub fn requests_per_sec(&self) -> f64 {
        per_second(self.num_requests as f64, self.elapsed)
    }

    /// Worker-weighted rate: the rate accumulator divided by the request count.
    ///
    /// Kept as-is for output compatibility; this is not requests over time.
    #[must_use]
    pub fn avg_requests_per_sec(&self) -> f64 {
        if self.num_requests == 0 {
            return 0.0;
        }
        self.rate_accumulator / self.num_requests as f64
    }

    /// Response bytes per second of wall-clock session time.
    #[must_use]
    pub fn bytes_per_sec(&self) -> f64 {
        per_second(self.total_response_bytes as f64, self.elapsed)
    }

    /// Response bytes per second of summed request time.
    #[must_use]
    pub fn avg_bytes_per_sec(&self) -> f64 {
        per_second(
            self.total_response_bytes as f64,
            self.total_request_duration,
        )
    }
}

fn per_second(amount: f64, over: Duration) -> f64 {
    let secs = over.as_secs_f64();
    if secs > 0.0 { amount / secs } else { 0.0 }
}

fn min_latency(left: Option<Duration>, right: Option<Duration>) -> Option<Duration> {
    match (left, right) {
        (Some(left), Some(right)) => Some(left.min(right)),
        (Some(value), None) | (None, Some(value)) => Some(value),
        (None, None) => None,
    }
}

fn max_latency(left: Option<Duration>, right: Option<Duration>) -> Option<Duration> {
    match (left, right) {
        (Some(left), Some(right)) => Some(left.max(right)),
        (Some(value), None) | (None, Some(value)) => Some(value),
        (None, None) => None,
    }
}
