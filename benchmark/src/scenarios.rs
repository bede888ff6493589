// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Wait set scenarios measured by the benchmark runner.
//!
//! Each scenario builds its own wait set, runs it under a
//! [`BenchmarkHarness`] and returns a finished [`BenchmarkResult`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use shmwait_core::{Condition, OriginId, ShmWaitResult, UserTrigger, WaitSet};

use crate::harness::BenchmarkHarness;
use crate::metrics::{BenchmarkCategory, BenchmarkResult};

/// Generous bound so a lost wakeup shows up as an outlier, not a hang.
const WAIT_BOUND: Duration = Duration::from_secs(5);

/// Notify one slot and drain it again with a zero-timeout wait.
pub fn notify_poll(harness: &BenchmarkHarness, capacity: usize) -> ShmWaitResult<BenchmarkResult> {
    let waitset = WaitSet::new(capacity)?;
    let attachments = (0..capacity as u64)
        .map(|event_id| waitset.attach(OriginId::next(), event_id, Condition::Signal))
        .collect::<Result<Vec<_>, _>>()?;
    let last = &attachments[capacity - 1];

    let samples = harness.run(|| {
        last.notify();
        let _ = waitset.timed_wait(Duration::ZERO);
    });

    Ok(BenchmarkResult::latency(
        format!("notify_poll_{}", capacity),
        BenchmarkCategory::Notify,
        samples,
        true,
    )
    .with_metadata("capacity", capacity))
}

/// Time from notify on this thread until a blocked waiter thread returns.
///
/// The waiter answers through a second wait set, so each sample is one
/// wake plus one acknowledgement.
pub fn wake_latency(harness: &BenchmarkHarness) -> ShmWaitResult<BenchmarkResult> {
    let request_set = WaitSet::new(2)?;
    let reply_set = WaitSet::new(2)?;
    let request = UserTrigger::new();
    let reply = UserTrigger::new();
    let stop = UserTrigger::new();
    request.enable_event(&request_set, 0)?;
    stop.enable_event(&request_set, 1)?;
    reply.enable_event(&reply_set, 0)?;

    let samples = std::thread::scope(|scope| {
        scope.spawn(|| loop {
            let events = request_set.wait();
            if events.iter().any(|e| e.originates_from(stop.origin_id())) {
                break;
            }
            request.reset_trigger();
            reply.trigger();
        });

        let samples = harness.run(|| {
            request.trigger();
            let _ = reply_set.timed_wait(WAIT_BOUND);
            reply.reset_trigger();
        });
        stop.trigger();
        samples
    });

    Ok(BenchmarkResult::latency(
        "wake_cross_thread",
        BenchmarkCategory::Wake,
        samples,
        true,
    ))
}

/// Sustained ping-pong throughput between two threads.
pub fn round_trip_throughput(
    harness: &BenchmarkHarness,
    duration: Duration,
) -> ShmWaitResult<BenchmarkResult> {
    let ping_set = WaitSet::new(2)?;
    let pong_set = WaitSet::new(2)?;
    let ping = UserTrigger::new();
    let pong = UserTrigger::new();
    ping.enable_event(&ping_set, 0)?;
    pong.enable_event(&pong_set, 0)?;
    let done = AtomicBool::new(false);

    let (ops, duration_ns) = std::thread::scope(|scope| {
        scope.spawn(|| {
            while !done.load(Ordering::Acquire) {
                if pong_set.timed_wait(Duration::from_millis(10)).is_timed_out() {
                    continue;
                }
                pong.reset_trigger();
                ping.trigger();
            }
        });

        let measured = harness.run_throughput(duration, || {
            pong.trigger();
            let _ = ping_set.timed_wait(WAIT_BOUND);
            ping.reset_trigger();
        });
        done.store(true, Ordering::Release);
        measured
    });

    Ok(BenchmarkResult::throughput(
        "round_trip_ping_pong",
        BenchmarkCategory::RoundTrip,
        ops,
        duration_ns,
    ))
}

/// Attach a trigger and drop its guard again.
pub fn attach_detach(harness: &BenchmarkHarness, occupied: usize) -> ShmWaitResult<BenchmarkResult> {
    let waitset = WaitSet::new(occupied + 1)?;
    let _occupied = (0..occupied as u64)
        .map(|event_id| waitset.attach(OriginId::next(), event_id, Condition::Signal))
        .collect::<Result<Vec<_>, _>>()?;
    let origin = OriginId::next();

    let samples = harness.run(|| {
        if let Ok(attachment) = waitset.attach(origin, u64::MAX, Condition::Signal) {
            attachment.detach();
        }
    });

    Ok(BenchmarkResult::latency(
        format!("attach_detach_{}_occupied", occupied),
        BenchmarkCategory::Attach,
        samples,
        true,
    )
    .with_metadata("occupied_slots", occupied))
}

/// Wall-clock time of one scenario, for progress output.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> BenchmarkHarness {
        BenchmarkHarness::new().warmup(2).iterations(20)
    }

    #[test]
    fn test_notify_poll() {
        let result = notify_poll(&quick(), 8).unwrap();
        assert_eq!(result.iterations, 20);
        assert_eq!(result.name, "notify_poll_8");
    }

    #[test]
    fn test_wake_latency() {
        let result = wake_latency(&quick()).unwrap();
        let latency = result.latency.unwrap();
        assert!(latency.max_ns < WAIT_BOUND.as_nanos() as u64);
    }

    #[test]
    fn test_round_trip_throughput() {
        let result = round_trip_throughput(&quick(), Duration::from_millis(50)).unwrap();
        assert!(result.throughput.unwrap().total_ops > 0);
    }

    #[test]
    fn test_attach_detach() {
        let result = attach_detach(&quick(), 4).unwrap();
        assert_eq!(result.category, BenchmarkCategory::Attach);
    }
}
