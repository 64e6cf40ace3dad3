use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::config::{LoadSessionConfig, TargetSource};
use crate::error::{AppError, AppResult};
use crate::http::{
    RequestTemplate, UrlFileSource, UrlQueue, UrlSource, Worker, build_client, setup_url_supplier,
};
use crate::metrics::{AggregateReport, AggregatorConfig, StatsRecord, setup_stats_aggregator};
use crate::shutdown::StopSwitch;

use super::progress::{ProgressOptions, setup_progress_indicator};

/// Extra time granted after a stop, on top of one request timeout.
const STOP_GRACE_MARGIN: Duration = Duration::from_millis(500);

/// One invocation of the load test: a worker pool, its aggregator, and the
/// optional URL supplier.
#[derive(Debug)]
pub struct LoadSession {
    config: Arc<LoadSessionConfig>,
    stop: StopSwitch,
    progress: ProgressOptions,
}

impl LoadSession {
    #[must_use]
    pub fn new(config: LoadSessionConfig) -> Self {
        Self {
            config: Arc::new(config),
            stop: StopSwitch::new(),
            progress: ProgressOptions::disabled(),
        }
    }

    /// Draws the progress line on stderr while the session runs.
    #[must_use]
    pub const fn with_progress(mut self, enabled: bool, no_color: bool) -> Self {
        self.progress = ProgressOptions { enabled, no_color };
        self
    }

    /// Switch that stops this session when triggered.
    #[must_use]
    pub fn stop_handle(&self) -> StopSwitch {
        self.stop.clone()
    }

    /// Asks the session to wind down. Safe to call at any time, repeatedly.
    pub fn stop(&self) {
        if self.stop.trigger() {
            debug!("Stop requested");
        }
    }

    /// Runs the session to completion and returns the merged report.
    ///
    /// Clients and the request template are built before anything is spawned,
    /// so a configuration problem fails without network activity.
    ///
    /// # Errors
    ///
    /// Returns an error when a client or the request template cannot be built,
    /// when the URL supplier fails to read the list file, or when a task panics.
    pub async fn start(&self) -> AppResult<AggregateReport> {
        let config = Arc::clone(&self.config);
        let concurrency = config.concurrency.get();
        let template =
            Arc::new(RequestTemplate::from_config(&config).map_err(AppError::validation)?);
        let clients = (0..concurrency)
            .map(|_| build_client(&config))
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::http)?;

        let (url_source, queue, supplier_handle) = match &config.target {
            TargetSource::Fixed(url) => (UrlSource::Fixed(Arc::from(url.as_str())), None, None),
            TargetSource::UrlFile {
                path,
                base_url,
                repeat,
            } => {
                let queue = UrlQueue::bounded(config.concurrency);
                let source = UrlFileSource {
                    path: path.clone(),
                    base_url: base_url.clone(),
                    repeat: *repeat,
                };
                let handle = setup_url_supplier(source, &queue, &self.stop);
                (UrlSource::Queue(queue.receiver()), Some(queue), Some(handle))
            }
        };

        let (stats_tx, stats_rx) = mpsc::channel::<StatsRecord>(concurrency);
        let (progress_tx, progress_rx) = watch::channel(0_u64);
        let run_start = Instant::now();

        let aggregator_handle = setup_stats_aggregator(
            AggregatorConfig {
                expected_records: concurrency,
                stop_grace: config.request_timeout.saturating_add(STOP_GRACE_MARGIN),
            },
            stats_rx,
            &self.stop,
            queue.clone(),
            progress_tx,
        );
        let progress_handle = self.progress.enabled.then(|| {
            setup_progress_indicator(self.progress, config.duration, run_start, progress_rx)
        });

        debug!(
            "Starting {}s session @ {} with {} worker(s)",
            config.duration.as_secs(),
            config.target_label(),
            concurrency
        );

        let worker_handles: Vec<JoinHandle<()>> = clients
            .into_iter()
            .enumerate()
            .map(|(id, client)| {
                let worker = Worker {
                    id,
                    client,
                    template: Arc::clone(&template),
                    source: url_source.clone(),
                    stop: self.stop.clone(),
                    duration: config.duration,
                };
                tokio::spawn(worker.run(stats_tx.clone()))
            })
            .collect();
        drop(stats_tx);
        drop(url_source);

        let mut report = aggregator_handle.await?;
        report.elapsed = run_start.elapsed();

        finish_workers(worker_handles).await?;
        if let Some(queue) = queue.as_ref() {
            queue.close();
        }
        if let Some(handle) = progress_handle {
            handle.await?;
        }
        if let Some(handle) = supplier_handle {
            let pushed = handle.await??;
            debug!("URL supplier queued {} entries", pushed);
        }

        Ok(report)
    }
}

/// Aborts workers that outlived the aggregator and waits for all of them.
async fn finish_workers(handles: Vec<JoinHandle<()>>) -> AppResult<()> {
    for handle in &handles {
        if !handle.is_finished() {
            handle.abort();
        }
    }
    for handle in handles {
        match handle.await {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => {
                debug!("Aborted a worker that did not report in time");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
