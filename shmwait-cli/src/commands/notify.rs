// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmwait notify` command - Notify a slot from another process.

use std::sync::Arc;

use shmwait_core::{EventVariable, SegmentName, SlotIndex, TriggerHandle};

pub async fn execute(segment: &str, slot: u32, count: u32) -> Result<(), Box<dyn std::error::Error>> {
    let name = SegmentName::new(segment)?;
    let variable = Arc::new(EventVariable::open_named(&name)?);

    let handle = TriggerHandle::for_slot(variable, SlotIndex::new(slot))?;
    for _ in 0..count {
        handle.notify();
    }

    tracing::debug!(segment = %name, slot = slot, count = count, "Sent notifications");
    println!("✓ Notified slot {} of {} ({}x)", slot, name, count);
    Ok(())
}
