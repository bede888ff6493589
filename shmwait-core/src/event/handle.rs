// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! TriggerHandle - the right to mark one slot pending.

use std::fmt;
use std::sync::Arc;

use crate::error::WaitSetError;
use crate::shm::{EventVariable, SlotState};
use crate::types::{SlotIndex, TriggerId};

/// Capability to notify one slot of one event variable.
///
/// Cheap to clone; all clones address the same slot. A handle whose slot is
/// [`SlotIndex::INVALID`] is detached and every operation on it is a no-op.
/// Handles also carry the slot generation they were issued for, so a copy
/// that outlives its attachment cannot wake a trigger that later reuses the
/// slot.
#[derive(Clone, Default)]
pub struct TriggerHandle {
    variable: Option<Arc<EventVariable>>,
    slot: SlotIndex,
    generation: u32,
    unique_id: TriggerId,
}

impl TriggerHandle {
    pub(crate) fn new(
        variable: Arc<EventVariable>,
        slot: SlotIndex,
        generation: u32,
        unique_id: TriggerId,
    ) -> Self {
        Self {
            variable: Some(variable),
            slot,
            generation,
            unique_id,
        }
    }

    /// A handle that is not attached to anything.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Address a slot attached by another process.
    ///
    /// Used by notifiers that only know the slot index of a named segment.
    /// Fails with `InvalidHandle` when the slot holds no attached trigger.
    pub fn for_slot(variable: Arc<EventVariable>, slot: SlotIndex) -> Result<Self, WaitSetError> {
        if slot.as_usize() >= variable.capacity()
            || variable.slot_state(slot) != SlotState::Attached
        {
            return Err(WaitSetError::InvalidHandle { slot });
        }
        let generation = variable.generation(slot);
        Ok(Self::new(variable, slot, generation, TriggerId::UNASSIGNED))
    }

    /// Mark the slot pending and wake the waiter; no-op when invalid.
    pub fn notify(&self) {
        if let Some(variable) = self.attached_variable() {
            if !variable.notify_current(self.slot, self.generation) {
                tracing::trace!(
                    slot = %self.slot,
                    trigger = %self.unique_id,
                    "Dropped notify on a released slot"
                );
            }
        }
    }

    /// Clear a pending notification of the slot; no-op when invalid.
    pub fn reset(&self) {
        if let Some(variable) = self.attached_variable() {
            if variable.generation(self.slot) == self.generation {
                variable.reset(self.slot);
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.slot.is_valid()
    }

    /// Whether the slot is still attached under this handle's generation.
    ///
    /// Turns false once the owning wait set detached the trigger or was
    /// dropped, even if this copy was never invalidated explicitly.
    pub fn is_live(&self) -> bool {
        self.attached_variable().is_some_and(|variable| {
            variable.slot_state(self.slot) == SlotState::Attached
                && variable.generation(self.slot) == self.generation
        })
    }

    pub fn unique_id(&self) -> TriggerId {
        self.unique_id
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    /// Turn this copy into a detached handle.
    pub fn invalidate(&mut self) {
        self.variable = None;
        self.slot = SlotIndex::INVALID;
    }

    /// Same slot and same attachment, not merely an equal handle.
    pub(crate) fn same_attachment(&self, other: &TriggerHandle) -> bool {
        self == other && self.generation == other.generation
    }

    fn attached_variable(&self) -> Option<&EventVariable> {
        if self.slot.is_valid() {
            self.variable.as_deref()
        } else {
            None
        }
    }
}

impl PartialEq for TriggerHandle {
    /// Same event variable instance and same slot.
    fn eq(&self, other: &Self) -> bool {
        let same_variable = match (&self.variable, &other.variable) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_variable && self.slot == other.slot
    }
}

impl Eq for TriggerHandle {}

impl fmt::Debug for TriggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerHandle")
            .field("slot", &self.slot)
            .field("generation", &self.generation)
            .field("unique_id", &self.unique_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn attached(variable: &Arc<EventVariable>) -> TriggerHandle {
        let (slot, generation) = variable.acquire_slot().unwrap();
        TriggerHandle::new(Arc::clone(variable), slot, generation, TriggerId::next())
    }

    #[test]
    fn test_invalid_handle_is_noop() {
        let handle = TriggerHandle::invalid();
        assert!(!handle.is_valid());
        assert!(!handle.is_live());
        handle.notify();
        handle.reset();
        assert_eq!(handle.unique_id(), TriggerId::UNASSIGNED);
    }

    #[test]
    fn test_notify_marks_slot() {
        let variable = Arc::new(EventVariable::anonymous(4).unwrap());
        let handle = attached(&variable);
        assert!(handle.is_live());

        handle.notify();
        assert!(variable.is_pending(handle.slot()));
        handle.reset();
        assert!(!variable.is_pending(handle.slot()));
    }

    #[test]
    fn test_equality_is_variable_and_slot() {
        let a = Arc::new(EventVariable::anonymous(4).unwrap());
        let b = Arc::new(EventVariable::anonymous(4).unwrap());

        let ha = attached(&a);
        let hb = attached(&b);
        assert_eq!(ha.slot(), hb.slot());
        assert_ne!(ha, hb);
        assert_eq!(ha, ha.clone());
        assert_eq!(TriggerHandle::invalid(), TriggerHandle::invalid());
    }

    #[test]
    fn test_invalidate_detaches_copy_only() {
        let variable = Arc::new(EventVariable::anonymous(4).unwrap());
        let handle = attached(&variable);
        let mut copy = handle.clone();
        copy.invalidate();

        copy.notify();
        assert!(variable.wait(Some(Duration::ZERO)).is_timed_out());
        handle.notify();
        assert!(!variable.wait(Some(Duration::ZERO)).is_timed_out());
    }

    #[test]
    fn test_stale_copy_cannot_wake_reused_slot() {
        let variable = Arc::new(EventVariable::anonymous(1).unwrap());
        let stale = attached(&variable);
        assert!(variable.begin_release(stale.slot()));
        variable.finish_release(stale.slot());

        let fresh = attached(&variable);
        assert_eq!(fresh.slot(), stale.slot());
        assert!(!stale.is_live());

        stale.notify();
        assert!(!variable.is_pending(fresh.slot()));
        fresh.notify();
        assert!(variable.is_pending(fresh.slot()));
    }

    #[test]
    fn test_for_slot_requires_attached_slot() {
        let variable = Arc::new(EventVariable::anonymous(4).unwrap());
        assert_eq!(
            TriggerHandle::for_slot(Arc::clone(&variable), SlotIndex::new(0)),
            Err(WaitSetError::InvalidHandle {
                slot: SlotIndex::new(0)
            })
        );

        let owner = attached(&variable);
        let remote = TriggerHandle::for_slot(Arc::clone(&variable), owner.slot()).unwrap();
        assert_eq!(remote, owner);
        remote.notify();
        assert!(variable.is_pending(owner.slot()));

        assert!(TriggerHandle::for_slot(variable, SlotIndex::new(9)).is_err());
    }
}
