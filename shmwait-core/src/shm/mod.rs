// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shared memory building blocks.
//!
//! POSIX shared memory regions and the event variable laid out inside them.
//! Everything placed in a region is position independent.

mod event_variable;
mod futex;
mod region;

pub use event_variable::{EventVariable, PendingSet, SlotState, WaitOutcome, MAX_SLOTS};
pub use region::SharedMemoryRegion;
