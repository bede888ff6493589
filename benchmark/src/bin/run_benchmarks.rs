// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI tool to run all benchmarks and generate reports.

use clap::Parser;
use shmwait_benchmark::harness::BenchmarkHarness;
use shmwait_benchmark::{
    scenarios, BenchmarkCategory, BenchmarkReport, BenchmarkResult, JsonReporter, LatencyMetrics,
    ThroughputMetrics,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "run_benchmarks")]
#[command(about = "Run shmwait benchmarks and generate JSON reports")]
struct Args {
    /// Output directory for benchmark data
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Number of iterations for each benchmark
    #[arg(short, long, default_value_t = 10_000)]
    iterations: u64,

    /// Categories to run (all if not specified)
    #[arg(short, long)]
    category: Option<Vec<String>>,

    /// Run in quick mode (fewer iterations)
    #[arg(long)]
    quick: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let iterations = if args.quick { 100 } else { args.iterations };
    let harness = BenchmarkHarness::new()
        .warmup(iterations / 10)
        .iterations(iterations);

    println!("Shmwait Benchmark Suite");
    println!("=======================");
    println!("Output directory: {:?}", args.output);
    println!("Iterations: {}", iterations);
    println!();

    let reporter = JsonReporter::new(&args.output)?;
    let mut report = BenchmarkReport::new();

    let requested: Vec<String> = args.category.unwrap_or_default();
    let should_run = |category: BenchmarkCategory| -> bool {
        requested.is_empty()
            || requested
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&category.to_string()))
    };

    for category in BenchmarkCategory::ALL {
        if !should_run(category) {
            continue;
        }
        println!("Running {} benchmarks...", category);
        let (results, elapsed) =
            scenarios::timed(|| run_category(category, &harness, args.quick));
        for result in results? {
            println!("  ✓ {}", result.name);
            report.add_result(result);
        }
        println!("  ({:.2}s)", elapsed.as_secs_f64());
    }

    // Save report
    let path = reporter.save(&report)?;
    println!();
    println!("Benchmark report saved to: {:?}", path);
    println!();

    print_summary(&report);

    Ok(())
}

fn run_category(
    category: BenchmarkCategory,
    harness: &BenchmarkHarness,
    quick: bool,
) -> anyhow::Result<Vec<BenchmarkResult>> {
    let results = match category {
        BenchmarkCategory::Notify => [1, 16, 128]
            .into_iter()
            .map(|capacity| scenarios::notify_poll(harness, capacity))
            .collect::<Result<Vec<_>, _>>()?,
        BenchmarkCategory::Wake => vec![scenarios::wake_latency(harness)?],
        BenchmarkCategory::RoundTrip => {
            let duration = if quick {
                Duration::from_millis(200)
            } else {
                Duration::from_secs(3)
            };
            vec![scenarios::round_trip_throughput(harness, duration)?]
        }
        BenchmarkCategory::Attach => [0, 63, 127]
            .into_iter()
            .map(|occupied| scenarios::attach_detach(harness, occupied))
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(results)
}

fn print_summary(report: &BenchmarkReport) {
    println!("Summary");
    println!("-------");
    println!();

    for result in &report.results {
        if let Some(latency) = &result.latency {
            println!(
                "{}: median={}, p99={}",
                result.name,
                LatencyMetrics::format_latency(latency.median_ns),
                LatencyMetrics::format_latency(latency.p99_ns)
            );
        }
        if let Some(throughput) = &result.throughput {
            println!(
                "{}: {}",
                result.name,
                ThroughputMetrics::format_rate(throughput.ops_per_sec)
            );
        }
    }
}
