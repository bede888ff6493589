// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmwait inspect` command - Show the slot table of a segment.

use shmwait_core::{EventVariable, SegmentName, SlotIndex, SlotState};

pub async fn execute(segment: &str, all: bool) -> Result<(), Box<dyn std::error::Error>> {
    let name = SegmentName::new(segment)?;
    let variable = EventVariable::open_named(&name)?;

    println!("Segment:  {}", name);
    println!("Capacity: {} slots", variable.capacity());
    println!();
    println!("{:<6} {:<10} {:<11} {}", "SLOT", "STATE", "GENERATION", "PENDING");

    let mut attached = 0usize;
    for index in 0..variable.capacity() as u32 {
        let slot = SlotIndex::new(index);
        let state = variable.slot_state(slot);
        if state != SlotState::Free {
            attached += 1;
        } else if !all {
            continue;
        }
        let pending = if variable.is_pending(slot) { "●" } else { "○" };
        println!(
            "{:<6} {:<10} {:<11} {}",
            index,
            state.name(),
            variable.generation(slot),
            pending
        );
    }

    println!();
    println!("{} of {} slots in use", attached, variable.capacity());
    Ok(())
}
