// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Conditions a trigger re-validates after a wake.
//!
//! Notifications are level-triggered hints. After the waiter drains a slot
//! it asks the slot's condition whether the event still holds, and drops the
//! slot from the result if it does not.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Anything that can report whether it has data waiting to be taken.
///
/// Implemented by the transport's subscriber queues. Evaluated by the
/// waiting thread while it holds the wait set's slot table, so it must be
/// cheap, must not block and must not call back into the wait set.
pub trait DataSource: Send + Sync {
    fn has_data(&self) -> bool;
}

/// What a trigger checks to decide whether it fired.
///
/// Each variant owns a share of exactly the state it reads, so evaluating it
/// never touches memory the origin could have freed.
#[derive(Clone)]
pub enum Condition {
    /// Latch set by [`crate::UserTrigger::trigger`].
    UserLatch(Arc<AtomicBool>),
    /// Count of timer expirations not yet acknowledged.
    TimerElapsed(Arc<AtomicU64>),
    /// Subscriber-style origin with queued data.
    DataAvailable(Arc<dyn DataSource>),
    /// The notification itself is the event.
    ///
    /// Used for slots notified from other processes, where no local state
    /// can be polled.
    Signal,
}

impl Condition {
    /// Evaluate the condition now.
    pub fn is_satisfied(&self) -> bool {
        match self {
            Self::UserLatch(latch) => latch.load(Ordering::Acquire),
            Self::TimerElapsed(expirations) => expirations.load(Ordering::Acquire) > 0,
            Self::DataAvailable(source) => source.has_data(),
            Self::Signal => true,
        }
    }

    pub fn kind(&self) -> ConditionKind {
        match self {
            Self::UserLatch(_) => ConditionKind::UserLatch,
            Self::TimerElapsed(_) => ConditionKind::TimerElapsed,
            Self::DataAvailable(_) => ConditionKind::DataAvailable,
            Self::Signal => ConditionKind::Signal,
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.kind()).finish()
    }
}

/// Tag of a [`Condition`], reported with every fired event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    UserLatch,
    TimerElapsed,
    DataAvailable,
    Signal,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UserLatch => "user_latch",
            Self::TimerElapsed => "timer_elapsed",
            Self::DataAvailable => "data_available",
            Self::Signal => "signal",
        };
        write!(f, "{}", name)
    }
}
