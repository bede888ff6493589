// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Trigger - one attached condition in a wait set's slot table.

use std::fmt;

use serde::Serialize;

use crate::event::{Condition, ConditionKind, OriginLink, TriggerHandle};
use crate::types::{OriginId, SlotIndex, TriggerId};

/// Snapshot of a trigger that fired, returned by a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventInfo {
    pub trigger_id: TriggerId,
    pub origin: OriginId,
    /// Caller-chosen id passed at attach time.
    pub event_id: u64,
    pub slot: SlotIndex,
    pub kind: ConditionKind,
}

impl EventInfo {
    pub fn originates_from(&self, origin: OriginId) -> bool {
        self.origin == origin
    }
}

/// A handle bound to an origin and the condition it represents.
///
/// Triggers live in the wait set's slot table and are only reachable through
/// it, so evaluating and invalidating them is serialized by the table lock.
pub struct Trigger {
    handle: TriggerHandle,
    origin: OriginId,
    event_id: u64,
    condition: Option<Condition>,
    /// Origin-side cell told about invalidation, if the origin keeps one.
    link: Option<OriginLink>,
}

impl Trigger {
    pub(crate) fn new(
        handle: TriggerHandle,
        origin: OriginId,
        event_id: u64,
        condition: Condition,
        link: Option<OriginLink>,
    ) -> Self {
        Self {
            handle,
            origin,
            event_id,
            condition: Some(condition),
            link,
        }
    }

    /// Notify the slot; no effect once invalidated.
    pub fn trigger(&self) {
        self.handle.notify();
    }

    /// Re-evaluate the condition. Always false once invalidated.
    pub fn has_triggered(&self) -> bool {
        self.handle.is_valid()
            && self
                .condition
                .as_ref()
                .is_some_and(Condition::is_satisfied)
    }

    /// Rebind the trigger to another origin or condition, keeping its slot.
    pub fn update_origin(&mut self, origin: OriginId, condition: Condition, link: Option<OriginLink>) {
        tracing::debug!(
            slot = %self.handle.slot(),
            from = %self.origin,
            to = %origin,
            kind = %condition.kind(),
            "Rebinding trigger origin"
        );
        self.origin = origin;
        self.condition = Some(condition);
        self.link = link;
    }

    /// Revoke the trigger.
    ///
    /// Tells the origin its handle is dead, drops the condition (and with it
    /// the last reference to the origin's state) and invalidates the handle.
    pub fn invalidate(&mut self) {
        if let Some(link) = self.link.take() {
            link.revoke(&self.handle);
        }
        self.condition = None;
        self.handle.invalidate();
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn handle(&self) -> &TriggerHandle {
        &self.handle
    }

    pub fn origin(&self) -> OriginId {
        self.origin
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    pub fn unique_id(&self) -> TriggerId {
        self.handle.unique_id()
    }

    pub fn kind(&self) -> Option<ConditionKind> {
        self.condition.as_ref().map(Condition::kind)
    }

    /// Report for a wait result.
    pub fn info(&self) -> Option<EventInfo> {
        let kind = self.kind()?;
        Some(EventInfo {
            trigger_id: self.unique_id(),
            origin: self.origin,
            event_id: self.event_id,
            slot: self.handle.slot(),
            kind,
        })
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("handle", &self.handle)
            .field("origin", &self.origin)
            .field("event_id", &self.event_id)
            .field("condition", &self.condition)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::EventVariable;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn make_trigger(variable: &Arc<EventVariable>, latch: &Arc<AtomicBool>) -> Trigger {
        let (slot, generation) = variable.acquire_slot().unwrap();
        let handle = TriggerHandle::new(Arc::clone(variable), slot, generation, TriggerId::next());
        Trigger::new(
            handle,
            OriginId::next(),
            7,
            Condition::UserLatch(Arc::clone(latch)),
            None,
        )
    }

    #[test]
    fn test_trigger_notifies_slot() {
        let variable = Arc::new(EventVariable::anonymous(4).unwrap());
        let latch = Arc::new(AtomicBool::new(false));
        let trigger = make_trigger(&variable, &latch);

        trigger.trigger();
        let pending = variable.wait(Some(Duration::ZERO)).ready().unwrap();
        assert!(pending.contains(trigger.handle().slot()));
    }

    #[test]
    fn test_has_triggered_follows_condition() {
        let variable = Arc::new(EventVariable::anonymous(4).unwrap());
        let latch = Arc::new(AtomicBool::new(false));
        let trigger = make_trigger(&variable, &latch);

        assert!(!trigger.has_triggered());
        latch.store(true, Ordering::SeqCst);
        assert!(trigger.has_triggered());
    }

    #[test]
    fn test_invalidate_stops_everything() {
        let variable = Arc::new(EventVariable::anonymous(4).unwrap());
        let latch = Arc::new(AtomicBool::new(true));
        let mut trigger = make_trigger(&variable, &latch);

        trigger.invalidate();
        assert!(!trigger.is_valid());
        assert!(!trigger.has_triggered());
        assert!(trigger.info().is_none());
        assert_eq!(Arc::strong_count(&latch), 1);

        trigger.trigger();
        assert!(variable.wait(Some(Duration::ZERO)).is_timed_out());
    }

    #[test]
    fn test_update_origin_keeps_slot() {
        let variable = Arc::new(EventVariable::anonymous(4).unwrap());
        let latch = Arc::new(AtomicBool::new(false));
        let mut trigger = make_trigger(&variable, &latch);
        let slot = trigger.handle().slot();

        let new_origin = OriginId::next();
        trigger.update_origin(new_origin, Condition::Signal, None);

        assert_eq!(trigger.handle().slot(), slot);
        assert_eq!(trigger.origin(), new_origin);
        assert!(trigger.has_triggered());
        let info = trigger.info().unwrap();
        assert!(info.originates_from(new_origin));
        assert_eq!(info.kind, ConditionKind::Signal);
        assert_eq!(info.event_id, 7);
    }
}
