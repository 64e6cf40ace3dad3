use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::http::UrlQueue;
use crate::shutdown::StopSwitch;

use super::{AggregateReport, StatsRecord};

/// Settings for the aggregator task.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorConfig {
    /// Records to wait for before finalizing (the worker count).
    pub expected_records: usize,
    /// How long to keep draining records after a stop.
    pub stop_grace: Duration,
}

/// Spawns the single consumer that merges worker records into the report.
///
/// The task finishes when every expected record arrived, when every sender is
/// gone, or when the grace period after a stop runs out. On stop it flips the
/// switch and closes the URL queue so blocked workers return. The processed
/// request count is published on `progress_tx`.
#[must_use]
pub fn setup_stats_aggregator(
    config: AggregatorConfig,
    mut stats_rx: mpsc::Receiver<StatsRecord>,
    stop: &StopSwitch,
    queue: Option<UrlQueue>,
    progress_tx: watch::Sender<u64>,
) -> JoinHandle<AggregateReport> {
    let stop = stop.clone();
    tokio::spawn(async move {
        let mut report = AggregateReport::default();
        let mut listener = stop.listener();
        let mut stopping = false;
        let grace_timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(grace_timer);

        while report.records_received < config.expected_records {
            tokio::select! {
                biased;
                maybe_record = stats_rx.recv() => {
                    let Some(record) = maybe_record else {
                        break;
                    };
                    if let Some(failure) = report.merge(record) {
                        warn!("Failed URL: {}; err: {}", failure.url, failure.message);
                    }
                    progress_tx.send_replace(report.num_requests);
                }
                () = listener.wait(), if !stopping => {
                    stopping = true;
                    stop.trigger();
                    if let Some(queue) = queue.as_ref() {
                        queue.close();
                    }
                    info!("stopping...");
                    let now = tokio::time::Instant::now();
                    grace_timer
                        .as_mut()
                        .reset(now.checked_add(config.stop_grace).unwrap_or(now));
                }
                () = &mut grace_timer, if stopping => {
                    warn!(
                        "Stopped waiting for {} worker(s) after {:?}",
                        config.expected_records.saturating_sub(report.records_received),
                        config.stop_grace
                    );
                    break;
                }
            }
        }

        report.interrupted = stop.is_stopped();
        report
    })
}
