// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Origin-side ownership of attachments.
//!
//! An [`Attachment`] detaches its trigger when dropped. An [`OriginLink`] is
//! the cell an origin (user trigger, timer) keeps its current attachment in;
//! the wait set clears that cell when it revokes the trigger, so the origin
//! learns about the detach without a back pointer into the wait set.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

use crate::event::TriggerHandle;
use crate::types::OriginId;
use crate::waitset::WaitSetShared;

/// RAII guard for one attached trigger.
///
/// Dropping the guard detaches the trigger, unless the wait set is already
/// gone or has revoked it.
#[must_use = "dropping an Attachment detaches the trigger immediately"]
pub struct Attachment {
    handle: TriggerHandle,
    waitset: Weak<WaitSetShared>,
}

impl Attachment {
    pub(crate) fn new(handle: TriggerHandle, waitset: Weak<WaitSetShared>) -> Self {
        Self { handle, waitset }
    }

    pub fn handle(&self) -> &TriggerHandle {
        &self.handle
    }

    pub fn notify(&self) {
        self.handle.notify();
    }

    /// Whether the wait set still holds the trigger.
    pub fn is_attached(&self) -> bool {
        self.waitset.strong_count() > 0 && self.handle.is_live()
    }

    /// Detach now; same as dropping the guard.
    pub fn detach(self) {
        drop(self);
    }

    /// Give up ownership without detaching.
    ///
    /// Used by the wait set when it revokes the trigger itself.
    pub(crate) fn disarm(mut self) -> TriggerHandle {
        self.waitset = Weak::new();
        std::mem::take(&mut self.handle)
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        if !self.handle.is_valid() {
            return;
        }
        if let Some(waitset) = self.waitset.upgrade() {
            waitset.detach(&self.handle);
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("handle", &self.handle)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Shared cell holding an origin's current attachment.
///
/// Clones share the cell. The wait set keeps one clone in the trigger and
/// empties it on revocation; the origin keeps another to notify through.
#[derive(Clone)]
pub struct OriginLink {
    id: OriginId,
    attachment: Arc<Mutex<Option<Attachment>>>,
}

impl OriginLink {
    pub fn new() -> Self {
        Self {
            id: OriginId::next(),
            attachment: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> OriginId {
        self.id
    }

    fn cell(&self) -> MutexGuard<'_, Option<Attachment>> {
        self.attachment.lock()
    }

    /// Handle of the current attachment, or an invalid handle.
    pub fn handle(&self) -> TriggerHandle {
        self.cell()
            .as_ref()
            .map(|attachment| attachment.handle().clone())
            .unwrap_or_default()
    }

    /// Notify through the current attachment; no-op when detached.
    pub fn notify(&self) {
        // Clone out so the cell is not held across the wake syscall.
        let handle = self.handle();
        handle.notify();
    }

    pub fn is_attached(&self) -> bool {
        self.cell()
            .as_ref()
            .is_some_and(Attachment::is_attached)
    }

    /// Detach the current attachment, if any.
    pub fn detach(&self) {
        let previous = self.cell().take();
        // Dropped outside the cell lock: detaching takes the wait set's
        // table lock, which is ordered before this one.
        drop(previous);
    }

    /// Store a new attachment, returning the one it replaces.
    ///
    /// The caller must drop the returned attachment after releasing any wait
    /// set lock it holds.
    pub(crate) fn install(&self, attachment: Attachment) -> Option<Attachment> {
        self.cell().replace(attachment)
    }

    /// Forget the attachment for `handle` without detaching it.
    ///
    /// Returns `false` if the cell already holds something else.
    pub(crate) fn revoke(&self, handle: &TriggerHandle) -> bool {
        let mut cell = self.cell();
        let matches = cell
            .as_ref()
            .is_some_and(|attachment| attachment.handle().unique_id() == handle.unique_id());
        if matches {
            if let Some(attachment) = cell.take() {
                attachment.disarm();
            }
        }
        matches
    }
}

impl Default for OriginLink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OriginLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginLink")
            .field("id", &self.id)
            .field("handle", &self.handle())
            .finish()
    }
}
