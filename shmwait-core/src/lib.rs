//! Shmwait Core Library
//!
//! Cross-process event notification over shared memory.
//! Provides the shared-memory event variable, trigger handles, wait sets,
//! user-raised and timer event sources, and configuration parsing.

pub mod config;
pub mod error;
pub mod event;
pub mod shm;
pub mod timer;
pub mod types;
pub mod user_trigger;
pub mod waitset;

// Re-export commonly used types
pub use config::{Config, ConfigLoader, WaitSetConfig, RESERVED_SLOTS};
pub use error::{HardValidationError, SharedMemoryError, ShmWaitError, ShmWaitResult, WaitSetError};
pub use event::{
    Attachment, Condition, ConditionKind, DataSource, EventInfo, OriginLink, Trigger, TriggerHandle,
};
pub use shm::{EventVariable, PendingSet, SlotState, WaitOutcome, MAX_SLOTS};
pub use timer::PeriodicTimer;
pub use types::{OriginId, SegmentName, ServiceDescription, ServiceName, SlotIndex, TriggerId};
pub use user_trigger::UserTrigger;
pub use waitset::WaitSet;
