// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shmwait Benchmarking Framework
//!
//! Measures the latency of the notification paths of a wait set.
//!
//! # Benchmark Categories
//!
//! - **Notify**: notify plus a non-blocking drain on one thread
//! - **Wake**: notify on one thread, blocked waiter on another
//! - **Round Trip**: two threads bouncing user triggers
//! - **Attach**: attach/detach churn on the slot table
//!
//! # Data Output
//!
//! All benchmarks output JSON files with standardized metrics for visualization.

pub mod harness;
pub mod metrics;
pub mod reporter;
pub mod scenarios;

pub use harness::BenchmarkHarness;
pub use metrics::{
    BenchmarkCategory, BenchmarkReport, BenchmarkResult, LatencyMetrics, SystemInfo,
    ThroughputMetrics,
};
pub use reporter::JsonReporter;
