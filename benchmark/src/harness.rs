// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark harness for running and timing operations.
//!
//! Provides utilities for measuring execution time with high precision
//! and collecting samples for statistical analysis.

use std::time::{Duration, Instant};

/// A benchmark harness for measuring operation latency.
pub struct BenchmarkHarness {
    /// Number of warmup iterations before measurement
    warmup_iterations: u64,
    /// Number of measurement iterations
    measurement_iterations: u64,
}

impl BenchmarkHarness {
    /// Create a new benchmark harness with default settings.
    pub fn new() -> Self {
        Self {
            warmup_iterations: 10,
            measurement_iterations: 100,
        }
    }

    /// Set the number of warmup iterations.
    pub fn warmup(mut self, iterations: u64) -> Self {
        self.warmup_iterations = iterations;
        self
    }

    /// Set the number of measurement iterations.
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.measurement_iterations = iterations;
        self
    }

    pub fn measurement_iterations(&self) -> u64 {
        self.measurement_iterations
    }

    /// Run a benchmark and collect latency samples.
    ///
    /// The closure should perform a single iteration of the operation being measured.
    /// Returns a vector of latency samples in nanoseconds.
    pub fn run<F>(&self, mut operation: F) -> Vec<u64>
    where
        F: FnMut(),
    {
        // Warmup phase
        for _ in 0..self.warmup_iterations {
            operation();
        }

        measure_n(self.measurement_iterations, operation)
    }

    /// Run a benchmark with setup and teardown phases.
    ///
    /// Setup is called before each iteration, teardown after.
    /// Only the operation time is measured.
    pub fn run_with_setup<S, O, T, V>(&self, mut setup: S, mut operation: O, mut teardown: T) -> Vec<u64>
    where
        S: FnMut() -> V,
        O: FnMut(&V),
        T: FnMut(V),
    {
        for _ in 0..self.warmup_iterations {
            let value = setup();
            operation(&value);
            teardown(value);
        }

        let mut samples = Vec::with_capacity(self.measurement_iterations as usize);
        for _ in 0..self.measurement_iterations {
            let value = setup();

            let start = Instant::now();
            operation(&value);
            let elapsed = start.elapsed();

            teardown(value);
            samples.push(elapsed.as_nanos() as u64);
        }

        samples
    }

    /// Run an operation repeatedly for a fixed duration.
    ///
    /// Returns (total_operations, total_duration_ns).
    pub fn run_throughput<F>(&self, duration: Duration, mut operation: F) -> (u64, u64)
    where
        F: FnMut(),
    {
        for _ in 0..self.warmup_iterations {
            operation();
        }

        let start = Instant::now();
        let mut operations = 0u64;
        while start.elapsed() < duration {
            operation();
            operations += 1;
        }

        (operations, start.elapsed().as_nanos() as u64)
    }
}

impl Default for BenchmarkHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Measure multiple executions and return samples.
pub fn measure_n<F>(iterations: u64, mut f: F) -> Vec<u64>
where
    F: FnMut(),
{
    let mut samples = Vec::with_capacity(iterations as usize);
    for _ in 0..iterations {
        let start = Instant::now();
        f();
        samples.push(start.elapsed().as_nanos() as u64);
    }
    samples
}
