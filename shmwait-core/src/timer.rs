// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Periodic timer as a wait set event source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::{HardValidationError, ShmWaitResult, WaitSetError};
use crate::event::{Condition, OriginLink, TriggerHandle};
use crate::types::OriginId;
use crate::waitset::WaitSet;

/// Fires every `period` from a task on the current Tokio runtime.
///
/// Each expiration bumps a counter and notifies the attached wait set. The
/// event keeps reporting until [`PeriodicTimer::acknowledge`] consumes the
/// counter.
#[derive(Debug)]
pub struct PeriodicTimer {
    period: Duration,
    expirations: Arc<AtomicU64>,
    link: OriginLink,
    task: Option<JoinHandle<()>>,
}

impl PeriodicTimer {
    /// Start ticking. Must be called from within a Tokio runtime context,
    /// which includes `spawn_blocking` threads.
    pub fn start(period: Duration) -> ShmWaitResult<Self> {
        if period.is_zero() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "period",
                value: "0".to_string(),
                reason: "Timer period must be greater than 0".to_string(),
            }
            .into());
        }

        let runtime = Handle::try_current()?;
        let expirations = Arc::new(AtomicU64::new(0));
        let link = OriginLink::new();

        let task = {
            let expirations = Arc::clone(&expirations);
            let link = link.clone();
            runtime.spawn(async move {
                // First expiration one full period after start.
                let start = tokio::time::Instant::now() + period;
                let mut interval = tokio::time::interval_at(start, period);
                loop {
                    interval.tick().await;
                    expirations.fetch_add(1, Ordering::AcqRel);
                    link.notify();
                }
            })
        };

        tracing::debug!(origin = %link.id(), period_ms = period.as_millis() as u64, "Timer started");

        Ok(Self {
            period,
            expirations,
            link,
            task: Some(task),
        })
    }

    /// Attach to `waitset`, replacing any previous attachment.
    pub fn attach_to(&self, waitset: &WaitSet, event_id: u64) -> Result<TriggerHandle, WaitSetError> {
        let handle = waitset.attach_linked(
            &self.link,
            event_id,
            Condition::TimerElapsed(Arc::clone(&self.expirations)),
        )?;
        if self.expirations() > 0 {
            handle.notify();
        }
        Ok(handle)
    }

    pub fn detach(&self) {
        self.link.detach();
    }

    pub fn is_attached(&self) -> bool {
        self.link.is_attached()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Expirations not yet acknowledged.
    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Acquire)
    }

    /// Consume pending expirations, returning how many there were.
    pub fn acknowledge(&self) -> u64 {
        self.expirations.swap(0, Ordering::AcqRel)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn origin_id(&self) -> OriginId {
        self.link.id()
    }

    /// Stop ticking. Pending expirations are kept.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(origin = %self.link.id(), "Timer stopped");
        }
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop();
        self.link.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShmWaitError;

    #[test]
    fn test_zero_period_rejected() {
        assert!(matches!(
            PeriodicTimer::start(Duration::ZERO),
            Err(ShmWaitError::HardValidation(_))
        ));
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        assert!(matches!(
            PeriodicTimer::start(Duration::from_millis(10)),
            Err(ShmWaitError::Runtime(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timer_wakes_waitset() {
        let waitset = Arc::new(WaitSet::new(4).unwrap());
        let timer = PeriodicTimer::start(Duration::from_millis(10)).unwrap();
        timer.attach_to(&waitset, 5).unwrap();

        let events = {
            let waitset = Arc::clone(&waitset);
            tokio::task::spawn_blocking(move || waitset.timed_wait(Duration::from_secs(5)))
                .await
                .unwrap()
                .ready()
                .unwrap()
        };
        assert_eq!(events[0].event_id, 5);
        assert!(timer.acknowledge() >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_keeps_counter() {
        let mut timer = PeriodicTimer::start(Duration::from_millis(5)).unwrap();
        assert!(timer.is_running());
        tokio::time::sleep(Duration::from_millis(40)).await;
        timer.stop();
        assert!(!timer.is_running());

        // Let an aborted tick that was mid-flight settle.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let seen = timer.expirations();
        assert!(seen >= 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(timer.expirations(), seen);
        assert_eq!(timer.acknowledge(), seen);
        assert_eq!(timer.expirations(), 0);
    }

    #[tokio::test]
    async fn test_drop_detaches() {
        let waitset = WaitSet::new(4).unwrap();
        let timer = PeriodicTimer::start(Duration::from_secs(60)).unwrap();
        timer.attach_to(&waitset, 1).unwrap();
        assert_eq!(waitset.len(), 1);

        drop(timer);
        assert!(waitset.is_empty());
    }
}
