// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! UserTrigger - an event the application raises by hand.
//!
//! Typical use is interrupting a blocked wait from another thread, e.g. on
//! shutdown, since waits have no cancellation token of their own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::WaitSetError;
use crate::event::{Condition, OriginLink, TriggerHandle};
use crate::types::OriginId;
use crate::waitset::WaitSet;

/// Manually raised, latched event source.
///
/// The latch stays set until [`UserTrigger::reset_trigger`], so a trigger
/// raised while no wait is in progress is reported by the next wait. Calling
/// [`UserTrigger::trigger`] repeatedly before that collapses into one event.
#[derive(Debug)]
pub struct UserTrigger {
    latch: Arc<AtomicBool>,
    link: OriginLink,
}

impl UserTrigger {
    pub fn new() -> Self {
        Self {
            latch: Arc::new(AtomicBool::new(false)),
            link: OriginLink::new(),
        }
    }

    /// Set the latch and wake the attached wait set, if any.
    pub fn trigger(&self) {
        self.latch.store(true, Ordering::Release);
        self.link.notify();
    }

    pub fn has_triggered(&self) -> bool {
        self.latch.load(Ordering::Acquire)
    }

    /// Clear the latch. A pending wake for it is filtered out by the waiter.
    pub fn reset_trigger(&self) {
        self.latch.store(false, Ordering::Release);
    }

    /// Attach to `waitset`, replacing any previous attachment.
    ///
    /// If the latch is already set, the new attachment is notified right
    /// away so the event is not lost.
    pub fn enable_event(
        &self,
        waitset: &WaitSet,
        event_id: u64,
    ) -> Result<TriggerHandle, WaitSetError> {
        let handle = waitset.attach_linked(
            &self.link,
            event_id,
            Condition::UserLatch(Arc::clone(&self.latch)),
        )?;

        tracing::debug!(origin = %self.link.id(), slot = %handle.slot(), "User trigger enabled");

        if self.has_triggered() {
            handle.notify();
        }
        Ok(handle)
    }

    /// Detach from the current wait set; no-op when not attached.
    pub fn disable_event(&self) {
        self.link.detach();
    }

    pub fn is_attached(&self) -> bool {
        self.link.is_attached()
    }

    /// Handle of the current attachment, or an invalid handle.
    pub fn handle(&self) -> TriggerHandle {
        self.link.handle()
    }

    pub fn origin_id(&self) -> OriginId {
        self.link.id()
    }
}

impl Default for UserTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UserTrigger {
    fn drop(&mut self) {
        self.disable_event();
    }
}
