//! Session orchestration, the progress line, and report rendering.
mod format;
mod progress;
mod runner;
mod summary;

#[cfg(test)]
mod tests;

pub use runner::LoadSession;
pub(crate) use summary::{render_banner, render_report};
