// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmwait demo` command - In-process wait set walkthrough.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use shmwait_core::{PeriodicTimer, ShmWaitResult, UserTrigger, WaitSet};

const PING: u64 = 0;
const PONG: u64 = 1;
const TICK: u64 = 2;

pub async fn execute(rounds: usize, period_ms: u64) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(rounds = rounds, period_ms = period_ms, "Starting demo");
    tokio::task::spawn_blocking(move || run(rounds, Duration::from_millis(period_ms))).await??;
    Ok(())
}

fn run(rounds: usize, period: Duration) -> ShmWaitResult<()> {
    let waitset = WaitSet::new(4)?;

    let ping = UserTrigger::new();
    let pong = UserTrigger::new();
    ping.enable_event(&waitset, PING)?;
    pong.enable_event(&waitset, PONG)?;

    let timer = PeriodicTimer::start(period)?;
    timer.attach_to(&waitset, TICK)?;

    println!("Wait set with {} of {} slots attached", waitset.len(), waitset.capacity());
    println!();

    let start = Instant::now();
    let stop = AtomicBool::new(false);

    std::thread::scope(|scope| {
        // Raises the user triggers alternately from another thread.
        scope.spawn(|| {
            let mut toggle = false;
            while !stop.load(Ordering::Acquire) {
                std::thread::sleep(period / 3 + Duration::from_millis(1));
                if toggle {
                    pong.trigger();
                } else {
                    ping.trigger();
                }
                toggle = !toggle;
            }
        });

        for round in 1..=rounds {
            for event in waitset.wait() {
                let detail = match event.event_id {
                    PING => {
                        ping.reset_trigger();
                        "ping".to_string()
                    }
                    PONG => {
                        pong.reset_trigger();
                        "pong".to_string()
                    }
                    TICK => format!("tick x{}", timer.acknowledge()),
                    _ => "unknown".to_string(),
                };
                println!(
                    "[{:>3}] {:>7.1}ms  slot {}  {:<14} {}",
                    round,
                    start.elapsed().as_secs_f64() * 1000.0,
                    event.slot,
                    event.kind.to_string(),
                    detail
                );
            }
        }

        stop.store(true, Ordering::Release);
    });

    println!();
    println!("✓ Demo finished after {} rounds", rounds);
    Ok(())
}
