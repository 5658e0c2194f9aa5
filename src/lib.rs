//! Core library for the `load-test` CLI.
//!
//! The engine lives in [`http`]: a [`http::LoadTester`] builds one request
//! template, splits a fixed request count across a pool of worker tasks, and
//! collects the response status codes into a [`metrics::StatusHistogram`].
//! Runs can be stopped cooperatively through a [`shutdown::StopSignal`];
//! requests already in flight always complete.
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod metrics;
pub mod shutdown;
pub mod shutdown_handlers;
pub mod system;
