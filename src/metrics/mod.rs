//! Per-worker statistics, their merge into the session report, and the aggregator task.
mod collector;
mod types;


pub use collector::{AggregatorConfig, setup_stats_aggregator};
pub use types::{AggregateReport, FailedRequest, StatsRecord};
