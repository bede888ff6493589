// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmwait clean` command - Remove a segment left behind by a crashed listener.

use shmwait_core::{EventVariable, SegmentName};

pub async fn execute(segment: &str) -> Result<(), Box<dyn std::error::Error>> {
    let name = SegmentName::new(segment)?;

    if EventVariable::unlink_named(&name)? {
        tracing::info!(segment = %name, "Removed segment");
        println!("✓ Removed segment {}", name);
    } else {
        println!("No segment named {}", name);
    }
    Ok(())
}
