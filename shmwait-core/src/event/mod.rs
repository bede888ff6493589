// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Triggers and the handles origins use to signal them.

mod attachment;
mod condition;
mod handle;
mod trigger;

pub use attachment::{Attachment, OriginLink};
pub use condition::{Condition, ConditionKind, DataSource};
pub use handle::TriggerHandle;
pub use trigger::{EventInfo, Trigger};
