// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for shmwait.
//!
//! This module defines explicit enum error types as per coding guidelines.
//! No `Box<dyn Error>`, no `anyhow::Result` - all errors are strongly typed.
//! A wait that times out is not an error; see [`crate::WaitOutcome`].

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{OriginId, SlotIndex};

/// Top-level error type for shmwait.
/// All errors are explicit variants - no catch-all or generic handling.
#[derive(Debug, Error)]
pub enum ShmWaitError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Wait Set Errors - Returned to the caller, never fatal
    // =========================================================================
    #[error("Wait set error: {0}")]
    WaitSet(#[from] WaitSetError),

    // =========================================================================
    // Shared Memory Errors
    // =========================================================================
    #[error("Shared memory error: {0}")]
    SharedMemory(#[from] SharedMemoryError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("No async runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

/// Hard validation errors reject a configuration before anything is mapped.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Duplicate service description: {description}")]
    DuplicateService { description: String },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// Errors from attaching, detaching and addressing triggers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitSetError {
    #[error("Wait set capacity of {capacity} slots exhausted")]
    CapacityExceeded { capacity: usize },

    #[error("Slot {slot} does not hold an attached trigger")]
    InvalidHandle { slot: SlotIndex },

    #[error("Origin {origin} already attached event {event_id} to this wait set")]
    AlreadyAttached { origin: OriginId, event_id: u64 },

    #[error("Invalid capacity {requested}: must be between 1 and {max}")]
    InvalidCapacity { requested: usize, max: usize },
}

/// Shared memory errors.
#[derive(Debug, Error)]
pub enum SharedMemoryError {
    #[error("Failed to create shared memory region: {name} - {reason}")]
    CreateFailed { name: String, reason: String },

    #[error("Failed to map shared memory: {reason}")]
    MapFailed { reason: String },

    #[error("Region of {size} bytes is too small, {required} bytes required")]
    RegionTooSmall { size: usize, required: usize },

    #[error("Shared layout mismatch: {reason}")]
    LayoutMismatch { reason: String },
}

/// Result type alias using ShmWaitError.
pub type ShmWaitResult<T> = Result<T, ShmWaitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_validation_error_display() {
        let err = HardValidationError::MissingRequiredField {
            field: "instance",
            context: "service at index 2".to_string(),
        };
        assert!(err.to_string().contains("instance"));
        assert!(err.to_string().contains("index 2"));
    }

    #[test]
    fn test_error_chain() {
        let capacity_err = WaitSetError::CapacityExceeded { capacity: 4 };
        let err: ShmWaitError = capacity_err.into();
        assert!(matches!(
            err,
            ShmWaitError::WaitSet(WaitSetError::CapacityExceeded { capacity: 4 })
        ));
    }

    #[test]
    fn test_invalid_handle_mentions_slot() {
        let err = WaitSetError::InvalidHandle {
            slot: SlotIndex::new(7),
        };
        assert!(err.to_string().contains('7'));
    }
}
