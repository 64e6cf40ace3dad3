//! Configuration loading, CLI merging, and the resolved session configuration.
pub(crate) mod apply;
mod loader;
mod session;
pub mod types;


pub use apply::apply_config;
pub use loader::load_config;
pub use session::{LoadSessionConfig, ServerOverride, TargetSource};

#[cfg(test)]
pub(crate) use loader::load_config_file;
