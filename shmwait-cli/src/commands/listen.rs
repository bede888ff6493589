// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmwait listen` command - Wait on the configured segment.
//!
//! Attaches one slot per configured service. Other processes notify a slot
//! with `shmwait notify`. Ctrl+C fires a user trigger that ends the wait loop.

use std::sync::Arc;

use shmwait_core::{
    Attachment, Condition, ConfigLoader, EventInfo, OriginId, ServiceDescription, UserTrigger,
    WaitOutcome, WaitSet, WaitSetError,
};

/// Event id of the shutdown trigger; service events use their list index.
const SHUTDOWN_EVENT: u64 = u64::MAX;

pub async fn execute(config_path: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(config = %config_path, "Starting listener");

    // Load and validate configuration - fail fast on invalid config
    let config = ConfigLoader::load_file(config_path)?;
    let segment = config
        .waitset
        .segment
        .clone()
        .ok_or("listen needs `waitset.segment` set so other processes can notify")?;

    let waitset = Arc::new(WaitSet::from_config(&config.waitset)?);
    let (shutdown, attachments) = attach_listener(&waitset, &config.services)?;

    println!("Listening on segment {}", segment);
    println!();
    for (service, attachment) in config.services.iter().zip(&attachments) {
        println!(
            "  {} → shmwait notify {} {}",
            service,
            segment,
            attachment.handle().slot()
        );
    }
    println!();
    println!("Press Ctrl+C to stop...");
    println!();

    let listener = {
        let waitset = Arc::clone(&waitset);
        let shutdown_origin = shutdown.origin_id();
        let services = config.services.clone();
        let timeout = config.waitset.wait_timeout;

        // The wait blocks its thread, so it runs off the async runtime.
        tokio::task::spawn_blocking(move || {
            let mut received = 0u64;
            loop {
                let events = match waitset.timed_wait(timeout) {
                    WaitOutcome::Ready(events) => events,
                    WaitOutcome::TimedOut => {
                        tracing::trace!("No events within wait timeout");
                        continue;
                    }
                };

                let batch = report_batch(&events, shutdown_origin, &services, json);
                received += batch.received;
                if batch.stop {
                    return received;
                }
            }
        })
    };

    tokio::signal::ctrl_c().await?;
    println!();
    println!("Shutting down...");
    shutdown.trigger();

    let received = listener.await?;
    drop(attachments);

    tracing::info!(received = received, "Listener stopped");
    println!("Listener stopped after {} events.", received);
    Ok(())
}

/// Attach the shutdown trigger, then one `Signal` slot per service.
fn attach_listener(
    waitset: &WaitSet,
    services: &[ServiceDescription],
) -> Result<(UserTrigger, Vec<Attachment>), WaitSetError> {
    let shutdown = UserTrigger::new();
    shutdown.enable_event(waitset, SHUTDOWN_EVENT)?;

    let attachments = services
        .iter()
        .enumerate()
        .map(|(index, _)| waitset.attach(OriginId::next(), index as u64, Condition::Signal))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((shutdown, attachments))
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Batch {
    received: u64,
    stop: bool,
}

/// Print every service event of one wake-up. Shutdown only takes effect
/// after the rest of the batch is reported.
fn report_batch(
    events: &[EventInfo],
    shutdown_origin: OriginId,
    services: &[ServiceDescription],
    json: bool,
) -> Batch {
    let mut batch = Batch::default();
    for event in events {
        if event.originates_from(shutdown_origin) {
            batch.stop = true;
            continue;
        }
        batch.received += 1;

        if json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!(error = %e, "Failed to encode event"),
            }
            continue;
        }
        match services.get(event.event_id as usize) {
            Some(service) => {
                tracing::info!(service = %service, slot = %event.slot, "Event received");
                println!("● {} (slot {})", service, event.slot);
            }
            None => tracing::warn!(event = ?event, "Event for unknown service"),
        }
    }
    batch
}
