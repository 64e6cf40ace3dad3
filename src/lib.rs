//! Core library for the `wrkr` CLI.
//!
//! This crate provides the building blocks used by the binary: CLI argument
//! types, configuration parsing, the worker pool and its HTTP clients, the
//! statistics aggregator, and report rendering. The primary user-facing
//! interface is the `wrkr` command-line application; library APIs may evolve
//! as the CLI grows.
pub mod app;
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod shutdown;
pub mod shutdown_handlers;
