// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! EventVariable - shared-memory pending flags with a process-shared wake.
//!
//! The whole state lives in one `#[repr(C)]` header at offset 0 of a
//! [`SharedMemoryRegion`]. It contains no pointers, only atomics and
//! indices, so every process may map it at a different base address.
//!
//! Notifiers OR a bit into the pending bitmap and then bump a futex word.
//! The single waiter samples the futex word *before* draining the bitmap,
//! so a notify that lands after the drain always changes the word and the
//! following futex wait returns immediately: no wakeup is lost.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use crate::error::{SharedMemoryError, ShmWaitResult, WaitSetError};
use crate::shm::{futex, SharedMemoryRegion};
use crate::types::{SegmentName, SlotIndex};

/// Compile-time upper bound on slots per event variable.
pub const MAX_SLOTS: usize = 128;

const BITMAP_WORDS: usize = MAX_SLOTS / 64;

/// "SWEV" in ASCII.
const LAYOUT_MAGIC: u32 = 0x5357_4556;
const LAYOUT_VERSION: u32 = 2;

/// How long a claimed slot waits for stale notifiers to finish. Bounded so a
/// notifier process that died mid-notify cannot stall attach forever.
const CLAIM_SETTLE_TIMEOUT: Duration = Duration::from_millis(500);

/// Shared header, placed at the start of the region.
#[repr(C)]
struct EventVariableHeader {
    /// Written last on creation with release ordering.
    magic: AtomicU32,
    version: AtomicU32,
    capacity: AtomicU32,
    /// CRC32 over magic, version and capacity.
    checksum: AtomicU32,
    /// Futex word, incremented on every notify.
    wake_seq: AtomicU32,
    /// Threads currently inside `wait`.
    sleepers: AtomicU32,
    pending: [AtomicU64; BITMAP_WORDS],
    states: [AtomicU8; MAX_SLOTS],
    generations: [AtomicU32; MAX_SLOTS],
    /// Handle notifies between their generation check and their bitmap write.
    notifiers: [AtomicU32; MAX_SLOTS],
}

/// Allocation state of one slot.
///
/// Pending/idle is tracked separately in the pending bitmap so a waiter can
/// read-and-clear all slots with a handful of atomic swaps.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Not bound to any trigger.
    Free = 0,
    /// Bound to a trigger; notifications are accepted.
    Attached = 1,
    /// Being torn down; notifications through handles are dropped.
    Releasing = 2,
    /// Being bound to a trigger; notifications through handles are dropped.
    Claimed = 3,
}

impl SlotState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Attached,
            2 => Self::Releasing,
            3 => Self::Claimed,
            _ => Self::Free,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Attached => "Attached",
            Self::Releasing => "Releasing",
            Self::Claimed => "Claimed",
        }
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of a wait that may time out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// Woken with a non-empty result.
    Ready(T),
    /// The deadline passed without anything to report.
    TimedOut,
}

impl<T> WaitOutcome<T> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// The ready value, or `None` on timeout.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::TimedOut => None,
        }
    }
}

/// Snapshot of pending slots taken by one wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSet {
    words: [u64; BITMAP_WORDS],
}

impl PendingSet {
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn contains(&self, slot: SlotIndex) -> bool {
        let index = slot.as_usize();
        index < MAX_SLOTS && self.words[index / 64] & (1 << (index % 64)) != 0
    }

    /// Pending slots in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = SlotIndex> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, &word)| {
            (0..64u32)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| SlotIndex::new(word_index as u32 * 64 + bit))
        })
    }
}

/// Fixed-capacity set of pending flags plus a process-shared wake mechanism.
///
/// Exactly one thread is expected to call [`EventVariable::wait`] at a time;
/// any number of threads or processes may notify concurrently.
pub struct EventVariable {
    region: SharedMemoryRegion,
    capacity: usize,
}

impl EventVariable {
    /// Bytes needed to host an event variable, rounded up to a page.
    pub fn required_size() -> usize {
        let header = std::mem::size_of::<EventVariableHeader>();
        let page = SharedMemoryRegion::MIN_SIZE;
        header.div_ceil(page) * page
    }

    /// Initialize a new event variable in a freshly created region.
    pub fn create(region: SharedMemoryRegion, capacity: usize) -> ShmWaitResult<Self> {
        Self::check_capacity(capacity)?;
        Self::check_region(&region)?;

        let variable = Self { region, capacity };
        let header = variable.header();

        header.version.store(LAYOUT_VERSION, Ordering::Relaxed);
        header.capacity.store(capacity as u32, Ordering::Relaxed);
        header
            .checksum
            .store(layout_checksum(capacity as u32), Ordering::Relaxed);
        header.wake_seq.store(0, Ordering::Relaxed);
        header.sleepers.store(0, Ordering::Relaxed);
        for word in &header.pending {
            word.store(0, Ordering::Relaxed);
        }
        for state in &header.states {
            state.store(SlotState::Free as u8, Ordering::Relaxed);
        }
        for generation in &header.generations {
            generation.store(0, Ordering::Relaxed);
        }
        for notifiers in &header.notifiers {
            notifiers.store(0, Ordering::Relaxed);
        }
        header.magic.store(LAYOUT_MAGIC, Ordering::Release);

        tracing::debug!(
            segment = %variable.region.name(),
            capacity = capacity,
            "Initialized event variable"
        );

        Ok(variable)
    }

    /// Event variable in a private anonymous shared mapping.
    pub fn anonymous(capacity: usize) -> ShmWaitResult<Self> {
        let region = SharedMemoryRegion::anonymous(Self::required_size())?;
        Self::create(region, capacity)
    }

    /// Event variable in a named segment other processes can open.
    pub fn create_named(name: &SegmentName, capacity: usize) -> ShmWaitResult<Self> {
        let region = SharedMemoryRegion::create(name.as_str(), Self::required_size())?;
        Self::create(region, capacity)
    }

    /// Attach to an event variable initialized by another process.
    pub fn open(region: SharedMemoryRegion) -> Result<Self, SharedMemoryError> {
        Self::check_region(&region)?;

        // SAFETY: check_region verified the header fits in the mapping and
        // mmap returns page-aligned memory.
        let header = unsafe { &*(region.as_ptr() as *const EventVariableHeader) };

        let magic = header.magic.load(Ordering::Acquire);
        if magic != LAYOUT_MAGIC {
            return Err(SharedMemoryError::LayoutMismatch {
                reason: format!("bad magic {:#010x}", magic),
            });
        }

        let version = header.version.load(Ordering::Relaxed);
        if version != LAYOUT_VERSION {
            return Err(SharedMemoryError::LayoutMismatch {
                reason: format!("layout version {} (expected {})", version, LAYOUT_VERSION),
            });
        }

        let capacity = header.capacity.load(Ordering::Relaxed);
        let checksum = header.checksum.load(Ordering::Relaxed);
        if checksum != layout_checksum(capacity) {
            return Err(SharedMemoryError::LayoutMismatch {
                reason: format!("header checksum {:#010x} does not match", checksum),
            });
        }

        let capacity = capacity as usize;
        if capacity == 0 || capacity > MAX_SLOTS {
            return Err(SharedMemoryError::LayoutMismatch {
                reason: format!("capacity {} out of range", capacity),
            });
        }

        tracing::debug!(segment = %region.name(), capacity = capacity, "Opened event variable");

        Ok(Self { region, capacity })
    }

    /// Open a named segment created with [`EventVariable::create_named`].
    pub fn open_named(name: &SegmentName) -> ShmWaitResult<Self> {
        let region = SharedMemoryRegion::open(name.as_str())?;
        Ok(Self::open(region)?)
    }

    /// Remove a named segment, e.g. one left behind by a crashed owner.
    ///
    /// Mappings that are already open stay valid. Returns `false` if no
    /// segment of that name existed.
    pub fn unlink_named(name: &SegmentName) -> ShmWaitResult<bool> {
        let removed = SharedMemoryRegion::unlink(name.as_str())?;
        tracing::debug!(segment = %name, removed = removed, "Unlinked event variable segment");
        Ok(removed)
    }

    fn check_capacity(capacity: usize) -> Result<(), WaitSetError> {
        if capacity == 0 || capacity > MAX_SLOTS {
            return Err(WaitSetError::InvalidCapacity {
                requested: capacity,
                max: MAX_SLOTS,
            });
        }
        Ok(())
    }

    fn check_region(region: &SharedMemoryRegion) -> Result<(), SharedMemoryError> {
        let required = std::mem::size_of::<EventVariableHeader>();
        if region.size() < required {
            return Err(SharedMemoryError::RegionTooSmall {
                size: region.size(),
                required,
            });
        }
        Ok(())
    }

    fn header(&self) -> &EventVariableHeader {
        // SAFETY: the region is at least header-sized (checked on create/open),
        // page aligned, and lives as long as self. All fields are atomics, so
        // shared references are sound even with concurrent writers.
        unsafe { &*(self.region.as_ptr() as *const EventVariableHeader) }
    }

    fn bit(slot: SlotIndex) -> (usize, u64) {
        let index = slot.as_usize();
        (index / 64, 1u64 << (index % 64))
    }

    fn in_range(&self, slot: SlotIndex) -> bool {
        slot.as_usize() < self.capacity
    }

    /// Number of usable slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Segment name, if other processes can open this variable.
    pub fn segment_name(&self) -> Option<&str> {
        self.region.is_named().then(|| self.region.name())
    }

    /// Mark `slot` pending and wake the waiter.
    ///
    /// Out-of-range slots are ignored.
    pub fn notify(&self, slot: SlotIndex) {
        if !self.in_range(slot) {
            tracing::trace!(slot = %slot, "Ignoring notify for out-of-range slot");
            return;
        }

        let header = self.header();
        let (word, mask) = Self::bit(slot);
        header.pending[word].fetch_or(mask, Ordering::SeqCst);
        header.wake_seq.fetch_add(1, Ordering::SeqCst);

        if header.sleepers.load(Ordering::SeqCst) > 0 {
            futex::wake_all(&header.wake_seq);
        }
    }

    /// Notify only while `slot` is attached under `generation`.
    ///
    /// Returns whether the notification was delivered. The check and the
    /// bitmap write are bracketed by the slot's notifier count, and
    /// [`EventVariable::acquire_slot`] waits that count out before it clears
    /// the pending bit, so a notify that passed the check for an old
    /// generation never survives into the next attachment of the slot.
    pub(crate) fn notify_current(&self, slot: SlotIndex, generation: u32) -> bool {
        if !self.in_range(slot) {
            return false;
        }
        let header = self.header();
        let index = slot.as_usize();

        header.notifiers[index].fetch_add(1, Ordering::SeqCst);
        let current = SlotState::from_raw(header.states[index].load(Ordering::SeqCst))
            == SlotState::Attached
            && header.generations[index].load(Ordering::SeqCst) == generation;
        if current {
            self.notify(slot);
        }
        header.notifiers[index].fetch_sub(1, Ordering::Release);

        current
    }

    /// Clear the pending flag of `slot`.
    pub fn reset(&self, slot: SlotIndex) {
        if !self.in_range(slot) {
            return;
        }
        let (word, mask) = Self::bit(slot);
        self.header().pending[word].fetch_and(!mask, Ordering::SeqCst);
    }

    /// Whether `slot` has an unconsumed notification.
    pub fn is_pending(&self, slot: SlotIndex) -> bool {
        if !self.in_range(slot) {
            return false;
        }
        let (word, mask) = Self::bit(slot);
        self.header().pending[word].load(Ordering::SeqCst) & mask != 0
    }

    /// Allocation state of `slot`; out-of-range slots read as free.
    pub fn slot_state(&self, slot: SlotIndex) -> SlotState {
        if !self.in_range(slot) {
            return SlotState::Free;
        }
        SlotState::from_raw(self.header().states[slot.as_usize()].load(Ordering::Acquire))
    }

    /// Generation of `slot`, bumped every time the slot is released.
    pub fn generation(&self, slot: SlotIndex) -> u32 {
        if !self.in_range(slot) {
            return 0;
        }
        self.header().generations[slot.as_usize()].load(Ordering::Acquire)
    }

    /// Claim the lowest free slot, returning it with its generation.
    ///
    /// The slot starts with no pending flag, whatever stale handles of its
    /// previous attachment did.
    pub(crate) fn acquire_slot(&self) -> Option<(SlotIndex, u32)> {
        let header = self.header();
        let index = (0..self.capacity).find(|&index| {
            header.states[index]
                .compare_exchange(
                    SlotState::Free as u8,
                    SlotState::Claimed as u8,
                    Ordering::SeqCst,
                    Ordering::Acquire,
                )
                .is_ok()
        })?;
        let slot = SlotIndex::new(index as u32);

        self.settle_notifiers(index);
        self.reset(slot);

        let generation = header.generations[index].load(Ordering::Acquire);
        header.states[index].store(SlotState::Attached as u8, Ordering::SeqCst);
        Some((slot, generation))
    }

    /// Wait until no handle notify is between its check and its write.
    fn settle_notifiers(&self, index: usize) {
        let notifiers = &self.header().notifiers[index];
        let deadline = Instant::now() + CLAIM_SETTLE_TIMEOUT;
        while Instant::now() < deadline {
            if notifiers.load(Ordering::Acquire) == 0 {
                return;
            }
            std::thread::yield_now();
        }
        tracing::warn!(
            slot = index,
            in_flight = notifiers.load(Ordering::Relaxed),
            "Notifiers did not drain before attach; a notifier may have died"
        );
    }

    /// Stop accepting handle notifications for `slot`.
    ///
    /// Bumps the generation so copies of the old handle stay dead after the
    /// slot is reused. Returns `false` if the slot was not attached.
    pub(crate) fn begin_release(&self, slot: SlotIndex) -> bool {
        if !self.in_range(slot) {
            return false;
        }
        let header = self.header();
        let index = slot.as_usize();
        let swapped = header.states[index]
            .compare_exchange(
                SlotState::Attached as u8,
                SlotState::Releasing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if swapped {
            header.generations[index].fetch_add(1, Ordering::AcqRel);
        }
        swapped
    }

    /// Drop any stale pending flag and return `slot` to the free pool.
    pub(crate) fn finish_release(&self, slot: SlotIndex) {
        if !self.in_range(slot) {
            return;
        }
        self.reset(slot);
        self.header().states[slot.as_usize()].store(SlotState::Free as u8, Ordering::Release);
    }

    fn drain(&self) -> PendingSet {
        let header = self.header();
        let used_words = self.capacity.div_ceil(64);
        let mut set = PendingSet::default();
        for (word, out) in header.pending[..used_words]
            .iter()
            .zip(set.words.iter_mut())
        {
            *out = word.swap(0, Ordering::SeqCst);
        }
        set
    }

    /// Block until at least one slot is pending or `timeout` elapses.
    ///
    /// `None` waits indefinitely, `Some(Duration::ZERO)` polls. On wake the
    /// whole pending set is read and cleared atomically per bitmap word.
    pub fn wait(&self, timeout: Option<Duration>) -> WaitOutcome<PendingSet> {
        let header = self.header();
        // A timeout too large to represent waits indefinitely.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        header.sleepers.fetch_add(1, Ordering::SeqCst);
        let outcome = loop {
            let seq = header.wake_seq.load(Ordering::SeqCst);

            let pending = self.drain();
            if !pending.is_empty() {
                break WaitOutcome::Ready(pending);
            }

            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break WaitOutcome::TimedOut;
                    }
                    Some(deadline - now)
                }
                None => None,
            };

            futex::wait(&header.wake_seq, seq, remaining);
            tracing::trace!("Event variable woke up");
        };
        header.sleepers.fetch_sub(1, Ordering::SeqCst);

        outcome
    }
}

impl fmt::Debug for EventVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventVariable")
            .field("segment", &self.region.name())
            .field("capacity", &self.capacity)
            .finish()
    }
}

fn layout_checksum(capacity: u32) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&LAYOUT_MAGIC.to_le_bytes());
    hasher.update(&LAYOUT_VERSION.to_le_bytes());
    hasher.update(&capacity.to_le_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn slot(index: u32) -> SlotIndex {
        SlotIndex::new(index)
    }

    #[test]
    fn test_header_fits_in_one_page() {
        assert!(std::mem::size_of::<EventVariableHeader>() <= EventVariable::required_size());
        assert_eq!(EventVariable::required_size() % SharedMemoryRegion::MIN_SIZE, 0);
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(EventVariable::anonymous(0).is_err());
        assert!(EventVariable::anonymous(MAX_SLOTS + 1).is_err());
        assert_eq!(EventVariable::anonymous(MAX_SLOTS).unwrap().capacity(), MAX_SLOTS);
    }

    #[test]
    fn test_notify_then_wait_returns_slot() {
        let var = EventVariable::anonymous(8).unwrap();
        var.notify(slot(3));

        let pending = var.wait(Some(Duration::ZERO)).ready().unwrap();
        assert!(pending.contains(slot(3)));
        assert_eq!(pending.len(), 1);
        assert!(!var.is_pending(slot(3)));
    }

    #[test]
    fn test_notifies_are_or_combined() {
        let var = EventVariable::anonymous(MAX_SLOTS).unwrap();
        var.notify(slot(70));
        var.notify(slot(1));
        var.notify(slot(1));

        let pending = var.wait(None).ready().unwrap();
        let slots: Vec<_> = pending.iter().collect();
        assert_eq!(slots, vec![slot(1), slot(70)]);
    }

    #[test]
    fn test_zero_timeout_polls() {
        let var = EventVariable::anonymous(4).unwrap();
        assert!(var.wait(Some(Duration::ZERO)).is_timed_out());
    }

    #[test]
    fn test_reset_clears_pending() {
        let var = EventVariable::anonymous(4).unwrap();
        var.notify(slot(2));
        assert!(var.is_pending(slot(2)));
        var.reset(slot(2));
        assert!(!var.is_pending(slot(2)));
        assert!(var.wait(Some(Duration::ZERO)).is_timed_out());
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let var = EventVariable::anonymous(4).unwrap();
        var.notify(slot(4));
        var.notify(SlotIndex::INVALID);
        assert!(var.wait(Some(Duration::ZERO)).is_timed_out());
    }

    #[test]
    fn test_slot_lifecycle() {
        let var = EventVariable::anonymous(2).unwrap();
        let (first, gen0) = var.acquire_slot().unwrap();
        let (second, _) = var.acquire_slot().unwrap();
        assert_eq!(first, slot(0));
        assert_eq!(second, slot(1));
        assert!(var.acquire_slot().is_none());
        assert_eq!(var.slot_state(first), SlotState::Attached);

        assert!(var.notify_current(first, gen0));
        assert!(var.begin_release(first));
        assert_eq!(var.slot_state(first), SlotState::Releasing);
        assert!(!var.notify_current(first, gen0));
        var.finish_release(first);

        assert_eq!(var.slot_state(first), SlotState::Free);
        assert!(!var.is_pending(first));
        let (reused, gen1) = var.acquire_slot().unwrap();
        assert_eq!(reused, first);
        assert_eq!(gen1, gen0 + 1);
        assert!(!var.notify_current(reused, gen0));
    }

    #[test]
    fn test_acquire_clears_stale_pending() {
        let var = EventVariable::anonymous(2).unwrap();
        let (first, _) = var.acquire_slot().unwrap();
        assert!(var.begin_release(first));
        var.finish_release(first);

        // A raw notify that hits the slot while it is free.
        var.notify(first);
        assert!(var.is_pending(first));

        let (reused, _) = var.acquire_slot().unwrap();
        assert_eq!(reused, first);
        assert!(!var.is_pending(reused));
    }

    #[test]
    fn test_acquire_waits_for_in_flight_notifier() {
        let var = Arc::new(EventVariable::anonymous(2).unwrap());
        let (first, gen0) = var.acquire_slot().unwrap();

        // A notifier that passed its generation check for `gen0` and is
        // about to write the bitmap when the slot changes hands.
        var.header().notifiers[first.as_usize()].fetch_add(1, Ordering::SeqCst);
        assert!(var.begin_release(first));
        var.finish_release(first);

        let notifier = {
            let var = Arc::clone(&var);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(30));
                var.notify(first);
                var.header().notifiers[first.as_usize()].fetch_sub(1, Ordering::Release);
            })
        };

        let (reused, gen1) = var.acquire_slot().unwrap();
        notifier.join().unwrap();
        assert_eq!(reused, first);
        assert_ne!(gen1, gen0);
        assert_eq!(var.slot_state(reused), SlotState::Attached);
        assert!(!var.is_pending(reused));
    }

    #[test]
    fn test_release_of_free_slot_is_rejected() {
        let var = EventVariable::anonymous(2).unwrap();
        assert!(!var.begin_release(slot(0)));
    }

    #[test]
    fn test_blocking_wait_is_woken_by_other_thread() {
        let var = Arc::new(EventVariable::anonymous(4).unwrap());
        let notifier = {
            let var = Arc::clone(&var);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                var.notify(slot(1));
            })
        };

        let pending = var.wait(Some(Duration::from_secs(5))).ready().unwrap();
        assert!(pending.contains(slot(1)));
        notifier.join().unwrap();
    }

    #[test]
    fn test_open_rejects_uninitialized_region() {
        let region = SharedMemoryRegion::anonymous(EventVariable::required_size()).unwrap();
        assert!(matches!(
            EventVariable::open(region),
            Err(SharedMemoryError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_unlink_named_removes_segment() {
        let name = SegmentName::new(format!("ev-unlink-{}", std::process::id())).unwrap();
        let owner = EventVariable::create_named(&name, 4).unwrap();

        assert!(EventVariable::unlink_named(&name).unwrap());
        assert!(EventVariable::open_named(&name).is_err());
        assert!(!EventVariable::unlink_named(&name).unwrap());

        // The owner's mapping outlives the name.
        owner.notify(slot(1));
        assert!(owner.is_pending(slot(1)));
    }

    #[test]
    fn test_named_variable_is_shared() {
        let name = SegmentName::new(format!("ev-shared-{}", std::process::id())).unwrap();
        let owner = EventVariable::create_named(&name, 16).unwrap();
        assert_eq!(owner.segment_name(), Some(name.as_str()));

        let peer = EventVariable::open_named(&name).unwrap();
        assert_eq!(peer.capacity(), 16);

        peer.notify(slot(9));
        let pending = owner.wait(Some(Duration::ZERO)).ready().unwrap();
        assert!(pending.contains(slot(9)));
    }
}
