//! Observability — scaler metrics
//!
//! Logging goes through the `tracing` facade at the call sites; this module
//! provides the in-process metric counters the scaler reports into.

pub mod metrics;

pub use metrics::{ScalerMetrics, ScalerMetricsSnapshot};
