// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! WaitSet - blocks one thread until any attached trigger fires.
//!
//! The wait set owns an [`EventVariable`] and a slot table with one
//! [`Trigger`] per attached slot. Waiting drains the pending bitmap, then
//! re-checks the condition of every drained slot under the table lock and
//! reports only those still satisfied.
//!
//! Detaching also takes the table lock, and a detached trigger drops its
//! condition before the lock is released. A detach therefore either happens
//! before an evaluation (and the slot is skipped) or after it (and the
//! evaluation saw live origin state). It never runs concurrently with one.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::config::WaitSetConfig;
use crate::error::{ShmWaitResult, WaitSetError};
use crate::event::{Attachment, Condition, EventInfo, OriginLink, Trigger, TriggerHandle};
use crate::shm::{EventVariable, PendingSet, WaitOutcome};
use crate::types::{OriginId, SegmentName, TriggerId};

/// State shared between a wait set and the attachments it handed out.
pub(crate) struct WaitSetShared {
    variable: Arc<EventVariable>,
    /// Indexed by slot.
    triggers: Mutex<Vec<Option<Trigger>>>,
}

impl WaitSetShared {
    fn table(&self) -> MutexGuard<'_, Vec<Option<Trigger>>> {
        self.triggers.lock()
    }

    fn attach(
        &self,
        origin: OriginId,
        event_id: u64,
        condition: Condition,
        link: Option<&OriginLink>,
        table: &mut [Option<Trigger>],
    ) -> Result<TriggerHandle, WaitSetError> {
        if table
            .iter()
            .flatten()
            .any(|trigger| trigger.origin() == origin && trigger.event_id() == event_id)
        {
            return Err(WaitSetError::AlreadyAttached { origin, event_id });
        }

        let capacity = self.variable.capacity();
        let (slot, generation) = self
            .variable
            .acquire_slot()
            .ok_or(WaitSetError::CapacityExceeded { capacity })?;

        let handle = TriggerHandle::new(
            Arc::clone(&self.variable),
            slot,
            generation,
            TriggerId::next(),
        );

        debug!(
            slot = %slot,
            trigger = %handle.unique_id(),
            origin = %origin,
            event_id = event_id,
            kind = %condition.kind(),
            "Attached trigger"
        );

        table[slot.as_usize()] = Some(Trigger::new(
            handle.clone(),
            origin,
            event_id,
            condition,
            link.cloned(),
        ));

        Ok(handle)
    }

    /// Detach the trigger behind `handle`. Returns whether one was found.
    pub(crate) fn detach(&self, handle: &TriggerHandle) -> bool {
        let mut table = self.table();
        let index = handle.slot().as_usize();
        let matches = table
            .get(index)
            .and_then(Option::as_ref)
            .is_some_and(|trigger| trigger.handle().same_attachment(handle));
        if !matches {
            return false;
        }
        if let Some(trigger) = table[index].take() {
            self.release(trigger);
        }
        true
    }

    /// Invalidate a trigger taken out of the table and free its slot.
    ///
    /// Must be called with the table lock held.
    fn release(&self, mut trigger: Trigger) {
        let slot = trigger.handle().slot();
        if !self.variable.begin_release(slot) {
            warn!(slot = %slot, "Released a slot that was not attached");
        }
        trigger.invalidate();
        self.variable.finish_release(slot);
        debug!(slot = %slot, origin = %trigger.origin(), "Detached trigger");
    }

    /// Conditions of the drained slots that still hold, in slot order.
    fn collect(&self, pending: &PendingSet) -> Vec<EventInfo> {
        let table = self.table();
        pending
            .iter()
            .filter_map(|slot| table.get(slot.as_usize()).and_then(Option::as_ref))
            .filter(|trigger| trigger.has_triggered())
            .filter_map(Trigger::info)
            .collect()
    }
}

/// Set of triggers one thread can block on.
///
/// At most `capacity` triggers can be attached at once. Attaching, detaching
/// and notifying work from any thread, also while another thread waits.
/// Concurrent waits on one wait set are serialized.
pub struct WaitSet {
    shared: Arc<WaitSetShared>,
    waiter: Mutex<()>,
}

impl WaitSet {
    /// Wait set over a private event variable.
    pub fn new(capacity: usize) -> ShmWaitResult<Self> {
        Ok(Self::with_variable(EventVariable::anonymous(capacity)?))
    }

    /// Wait set over a named segment other processes can notify through.
    pub fn create_named(name: &SegmentName, capacity: usize) -> ShmWaitResult<Self> {
        Ok(Self::with_variable(EventVariable::create_named(name, capacity)?))
    }

    /// Wait set as described by a validated configuration.
    pub fn from_config(config: &WaitSetConfig) -> ShmWaitResult<Self> {
        match &config.segment {
            Some(name) => Self::create_named(name, config.capacity),
            None => Self::new(config.capacity),
        }
    }

    fn with_variable(variable: EventVariable) -> Self {
        let capacity = variable.capacity();
        Self {
            shared: Arc::new(WaitSetShared {
                variable: Arc::new(variable),
                triggers: Mutex::new((0..capacity).map(|_| None).collect()),
            }),
            waiter: Mutex::new(()),
        }
    }

    /// Attach a condition on behalf of `origin`.
    ///
    /// The returned guard detaches the trigger when dropped. Fails with
    /// `AlreadyAttached` if `origin` already attached `event_id` here, and
    /// with `CapacityExceeded` when every slot is taken.
    pub fn attach(
        &self,
        origin: OriginId,
        event_id: u64,
        condition: Condition,
    ) -> Result<Attachment, WaitSetError> {
        let handle = {
            let mut table = self.shared.table();
            self.shared
                .attach(origin, event_id, condition, None, &mut table)?
        };
        Ok(Attachment::new(handle, Arc::downgrade(&self.shared)))
    }

    /// Attach on behalf of an origin that keeps its attachment in `link`.
    ///
    /// Whatever `link` was attached to before, here or elsewhere, is
    /// detached first. The wait set empties `link` when it detaches the
    /// trigger itself.
    pub fn attach_linked(
        &self,
        link: &OriginLink,
        event_id: u64,
        condition: Condition,
    ) -> Result<TriggerHandle, WaitSetError> {
        link.detach();

        let (handle, replaced) = {
            let mut table = self.shared.table();
            let handle =
                self.shared
                    .attach(link.id(), event_id, condition, Some(link), &mut table)?;
            let attachment = Attachment::new(handle.clone(), Arc::downgrade(&self.shared));
            (handle, link.install(attachment))
        };
        // A racing attach on the same link lost; detach it outside the lock.
        drop(replaced);

        Ok(handle)
    }

    /// Detach the trigger behind `handle`.
    ///
    /// Returns `false` for invalid or foreign handles and for handles whose
    /// trigger was already detached.
    pub fn detach(&self, handle: &TriggerHandle) -> bool {
        self.shared.detach(handle)
    }

    /// Detach every trigger attached on behalf of `origin`.
    pub fn detach_origin(&self, origin: OriginId) -> usize {
        let mut table = self.shared.table();
        let mut detached = 0;
        for entry in table.iter_mut() {
            if entry.as_ref().is_some_and(|t| t.origin() == origin) {
                if let Some(trigger) = entry.take() {
                    self.shared.release(trigger);
                    detached += 1;
                }
            }
        }
        detached
    }

    /// Rebind the trigger behind `handle` to a new origin and condition.
    ///
    /// Runs under the table lock, so it never interleaves with a condition
    /// evaluation. The slot, handle and event id stay the same.
    pub fn update_origin(
        &self,
        handle: &TriggerHandle,
        origin: OriginId,
        condition: Condition,
        link: Option<&OriginLink>,
    ) -> Result<(), WaitSetError> {
        let mut table = self.shared.table();
        let index = handle.slot().as_usize();

        let event_id = match table.get(index).and_then(Option::as_ref) {
            Some(trigger) if trigger.handle().same_attachment(handle) => trigger.event_id(),
            _ => return Err(WaitSetError::InvalidHandle { slot: handle.slot() }),
        };

        let clash = table.iter().enumerate().any(|(other, entry)| {
            other != index
                && entry
                    .as_ref()
                    .is_some_and(|t| t.origin() == origin && t.event_id() == event_id)
        });
        if clash {
            return Err(WaitSetError::AlreadyAttached { origin, event_id });
        }

        if let Some(trigger) = table[index].as_mut() {
            trigger.update_origin(origin, condition, link.cloned());
        }
        Ok(())
    }

    /// Block until at least one attached condition holds.
    ///
    /// Never returns an empty list. Events are ordered by slot index.
    pub fn wait(&self) -> Vec<EventInfo> {
        match self.wait_until(None) {
            WaitOutcome::Ready(events) => events,
            WaitOutcome::TimedOut => Vec::new(),
        }
    }

    /// Like [`WaitSet::wait`], but gives up after `timeout`.
    ///
    /// `Duration::ZERO` polls without blocking.
    pub fn timed_wait(&self, timeout: Duration) -> WaitOutcome<Vec<EventInfo>> {
        // Deadlines past the end of `Instant` wait indefinitely.
        self.wait_until(Instant::now().checked_add(timeout))
    }

    fn wait_until(&self, deadline: Option<Instant>) -> WaitOutcome<Vec<EventInfo>> {
        let _waiter = self.waiter.lock();
        loop {
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));

            let pending = match self.shared.variable.wait(remaining) {
                WaitOutcome::Ready(pending) => pending,
                WaitOutcome::TimedOut => return WaitOutcome::TimedOut,
            };

            let events = self.shared.collect(&pending);
            if !events.is_empty() {
                trace!(fired = events.len(), pending = pending.len(), "Wait set woke up");
                return WaitOutcome::Ready(events);
            }

            trace!(pending = pending.len(), "No pending condition still holds");
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return WaitOutcome::TimedOut;
            }
        }
    }

    /// Number of attached triggers.
    pub fn len(&self) -> usize {
        self.shared.table().iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.variable.capacity()
    }

    /// Whether `handle` refers to a trigger currently attached here.
    pub fn is_attached(&self, handle: &TriggerHandle) -> bool {
        self.shared
            .table()
            .get(handle.slot().as_usize())
            .and_then(Option::as_ref)
            .is_some_and(|trigger| trigger.handle().same_attachment(handle))
    }

    /// Segment name, if the wait set lives in a named segment.
    pub fn segment_name(&self) -> Option<&str> {
        self.shared.variable.segment_name()
    }

    /// The underlying event variable, for notifiers that only need slots.
    pub fn event_variable(&self) -> &Arc<EventVariable> {
        &self.shared.variable
    }

    /// Snapshot of the attached triggers in slot order.
    pub fn triggers(&self) -> Vec<EventInfo> {
        self.shared
            .table()
            .iter()
            .flatten()
            .filter_map(Trigger::info)
            .collect()
    }
}

impl Drop for WaitSet {
    fn drop(&mut self) {
        let mut table = self.shared.table();
        let mut detached = 0usize;
        for entry in table.iter_mut() {
            if let Some(trigger) = entry.take() {
                self.shared.release(trigger);
                detached += 1;
            }
        }
        debug!(detached = detached, "Wait set dropped");
    }
}

impl fmt::Debug for WaitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitSet")
            .field("variable", &self.shared.variable)
            .field("attached", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ConditionKind;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_duplicate_attach_rejected() {
        let waitset = WaitSet::new(4).unwrap();
        let origin = OriginId::next();
        let _first = waitset.attach(origin, 7, Condition::Signal).unwrap();

        let err = waitset.attach(origin, 7, Condition::Signal).unwrap_err();
        assert_eq!(err, WaitSetError::AlreadyAttached { origin, event_id: 7 });

        // Same origin, different event id is fine.
        let _second = waitset.attach(origin, 8, Condition::Signal).unwrap();
        assert_eq!(waitset.len(), 2);
    }

    #[test]
    fn test_detach_origin_removes_only_that_origin() {
        let waitset = WaitSet::new(4).unwrap();
        let noisy = OriginId::next();
        let quiet = OriginId::next();
        let a = waitset.attach(noisy, 1, Condition::Signal).unwrap();
        let b = waitset.attach(noisy, 2, Condition::Signal).unwrap();
        let c = waitset.attach(quiet, 1, Condition::Signal).unwrap();

        assert_eq!(waitset.detach_origin(noisy), 2);
        assert!(!a.is_attached());
        assert!(!b.is_attached());
        assert!(c.is_attached());
        assert_eq!(waitset.detach_origin(noisy), 0);
        assert_eq!(waitset.len(), 1);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let waitset = WaitSet::new(2).unwrap();
        let attachment = waitset.attach(OriginId::next(), 1, Condition::Signal).unwrap();
        let handle = attachment.handle().clone();

        assert!(waitset.detach(&handle));
        assert!(!waitset.detach(&handle));
        assert!(!waitset.detach(&TriggerHandle::invalid()));
        // Guard drop after an explicit detach is a no-op.
        drop(attachment);
        assert!(waitset.is_empty());
    }

    #[test]
    fn test_update_origin_swaps_condition() {
        let waitset = WaitSet::new(4).unwrap();
        let attachment = waitset.attach(OriginId::next(), 3, Condition::Signal).unwrap();
        let handle = attachment.handle().clone();

        let latch = Arc::new(AtomicBool::new(false));
        let origin = OriginId::next();
        waitset
            .update_origin(&handle, origin, Condition::UserLatch(Arc::clone(&latch)), None)
            .unwrap();

        // Notified but the new condition does not hold.
        handle.notify();
        assert!(waitset.timed_wait(Duration::ZERO).is_timed_out());

        latch.store(true, std::sync::atomic::Ordering::Release);
        handle.notify();
        let events = waitset.timed_wait(Duration::ZERO).ready().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].origin, origin);
        assert_eq!(events[0].event_id, 3);
        assert_eq!(events[0].slot, handle.slot());
    }

    #[test]
    fn test_update_origin_errors() {
        let waitset = WaitSet::new(4).unwrap();
        let taken = OriginId::next();
        let _existing = waitset.attach(taken, 3, Condition::Signal).unwrap();
        let other = waitset.attach(OriginId::next(), 3, Condition::Signal).unwrap();

        let clash = waitset
            .update_origin(other.handle(), taken, Condition::Signal, None)
            .unwrap_err();
        assert_eq!(clash, WaitSetError::AlreadyAttached { origin: taken, event_id: 3 });

        let stale = other.handle().clone();
        drop(other);
        let invalid = waitset
            .update_origin(&stale, OriginId::next(), Condition::Signal, None)
            .unwrap_err();
        assert!(matches!(invalid, WaitSetError::InvalidHandle { .. }));
    }

    #[test]
    fn test_triggers_snapshot_in_slot_order() {
        let waitset = WaitSet::new(4).unwrap();
        let origin = OriginId::next();
        let first = waitset.attach(origin, 10, Condition::Signal).unwrap();
        let second = waitset
            .attach(origin, 11, Condition::UserLatch(Arc::new(AtomicBool::new(false))))
            .unwrap();
        let third = waitset.attach(origin, 12, Condition::Signal).unwrap();
        drop(second);

        let triggers = waitset.triggers();
        let ids: Vec<u64> = triggers.iter().map(|t| t.event_id).collect();
        assert_eq!(ids, vec![10, 12]);
        assert_eq!(triggers[0].slot, first.handle().slot());
        assert_eq!(triggers[1].slot, third.handle().slot());
        assert!(triggers.iter().all(|t| t.kind == ConditionKind::Signal));
        assert!(triggers.iter().all(|t| t.originates_from(origin)));
    }

    #[test]
    fn test_capacity_exceeded() {
        let waitset = WaitSet::new(1).unwrap();
        let _only = waitset.attach(OriginId::next(), 0, Condition::Signal).unwrap();
        let err = waitset.attach(OriginId::next(), 0, Condition::Signal).unwrap_err();
        assert_eq!(err, WaitSetError::CapacityExceeded { capacity: 1 });
    }
}
