use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::args::OutputFormat;
use crate::error::AppResult;
use crate::metrics::AggregateReport;

use super::format::{format_bytes, format_latency};

pub(crate) const NO_STATISTICS_MESSAGE: &str = "No statistics collected / no requests found";

/// Machine-readable form of the final report.
#[derive(Debug, Serialize)]
pub(crate) struct ReportSummary {
    pub(crate) finished_at: String,
    pub(crate) requests: u64,
    pub(crate) errors: u64,
    pub(crate) elapsed_ms: u128,
    pub(crate) bytes_read: u64,
    pub(crate) requests_per_sec: f64,
    pub(crate) avg_requests_per_sec: f64,
    pub(crate) bytes_per_sec: f64,
    pub(crate) avg_bytes_per_sec: f64,
    pub(crate) fastest_request_us: Option<u128>,
    pub(crate) slowest_request_us: Option<u128>,
    pub(crate) interrupted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<&'static str>,
}

impl ReportSummary {
    pub(crate) fn from_report(report: &AggregateReport) -> Self {
        Self {
            finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            requests: report.num_requests,
            errors: report.num_errors,
            elapsed_ms: report.elapsed.as_millis(),
            bytes_read: report.total_response_bytes,
            requests_per_sec: report.requests_per_sec(),
            avg_requests_per_sec: report.avg_requests_per_sec(),
            bytes_per_sec: report.bytes_per_sec(),
            avg_bytes_per_sec: report.avg_bytes_per_sec(),
            fastest_request_us: report.min_latency.map(|latency| latency.as_micros()),
            slowest_request_us: report.max_latency.map(|latency| latency.as_micros()),
            interrupted: report.interrupted,
            error: report.is_empty().then_some(NO_STATISTICS_MESSAGE),
        }
    }
}

/// Renders the report in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn render_report(report: &AggregateReport, format: OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => {
            let summary = ReportSummary::from_report(report);
            Ok(serde_json::to_string_pretty(&summary)?)
        }
    }
}

pub(crate) fn render_text(report: &AggregateReport) -> String {
    if report.is_empty() {
        return format!("Error: {}\n", NO_STATISTICS_MESSAGE);
    }

    let lines = [
        format!(
            "{} requests in {}, {} read",
            report.num_requests,
            format_elapsed(report.elapsed),
            format_bytes(report.total_response_bytes as f64)
        ),
        format!("Requests/sec:\t\t{:.2}", report.requests_per_sec()),
        format!("Avg Reqs/sec:\t\t{:.2}", report.avg_requests_per_sec()),
        format!("Bytes/sec:\t\t{}", format_bytes(report.bytes_per_sec())),
        format!("Avg B/sec:\t\t{}", format_bytes(report.avg_bytes_per_sec())),
        format!("Fastest Request:\t{}", format_latency(report.min_latency)),
        format!("Slowest Request:\t{}", format_latency(report.max_latency)),
        format!("Number of Errors:\t{}", report.num_errors),
    ];

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

/// Start banner printed before the first request.
pub(crate) fn render_banner(duration: Duration, target: &str, concurrency: usize) -> String {
    format!(
        "Running {}s test @ {}\n  {} worker(s) running concurrently",
        duration.as_secs(),
        target,
        concurrency
    )
}

fn format_elapsed(elapsed: Duration) -> String {
    format_latency(Some(elapsed))
}
