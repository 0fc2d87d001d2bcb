//! Observability infrastructure for the coin filter
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics
//! - Refresh-cycle metric helpers
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("coinfilter", LogFormat::Pretty)?;
//!
//! // Optional, exposes /metrics
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, CycleOutcome, FetchStage, RefreshMetrics};
