//! Lightweight in-process metrics (dependency-free).
//!
//! Counters and histograms are atomics keyed by label sets and rendered in
//! Prometheus text format by the `/metrics` handler.

pub mod metrics;
