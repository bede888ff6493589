// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for identifiers and validated names.
//!
//! Following the "Newtype" pattern in Rust to ensure valid state by construction.
//! Identifiers that cross the shared-memory boundary are plain indices,
//! never addresses.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Maximum length of a segment or service name.
const MAX_NAME_LEN: usize = 64;

static NEXT_TRIGGER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_ORIGIN_ID: AtomicU64 = AtomicU64::new(1);

/// Index of a slot inside an event variable.
///
/// `SlotIndex::INVALID` is the sentinel carried by handles that are not attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotIndex(u32);

impl SlotIndex {
    /// Sentinel for "not attached".
    pub const INVALID: SlotIndex = SlotIndex(u32::MAX);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Index usable for addressing the shared arrays.
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "<invalid>")
        }
    }
}

impl Default for SlotIndex {
    fn default() -> Self {
        Self::INVALID
    }
}

impl From<u32> for SlotIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

/// Process-unique identifier of one attachment.
///
/// Lets an origin that owns several triggers recognize which of them fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerId(u64);

impl TriggerId {
    /// Identifier of handles that were never issued by a wait set.
    pub const UNASSIGNED: TriggerId = TriggerId(0);

    pub(crate) fn next() -> Self {
        Self(NEXT_TRIGGER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for TriggerId {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of an origin object (user trigger, timer, subscriber, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OriginId(u64);

impl OriginId {
    /// Allocate a fresh, process-unique origin identity.
    pub fn next() -> Self {
        Self(NEXT_ORIGIN_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "origin-{}", self.0)
    }
}

/// Validated shared memory segment name.
/// Must be non-empty, alphanumeric with hyphens/underscores, max 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SegmentName(String);

impl SegmentName {
    /// Create a new SegmentName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "segment",
                value: name,
                reason: "Segment name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_NAME_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "segment",
                value: name.clone(),
                reason: format!("Segment name too long: {} chars (max 64)", name.len()),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(HardValidationError::InvalidFieldValue {
                field: "segment",
                value: name,
                reason: "Segment name must contain only alphanumeric characters, hyphens, and underscores".to_string(),
            });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SegmentName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SegmentName> for String {
    fn from(name: SegmentName) -> Self {
        name.0
    }
}

/// One component of a service description.
/// Must match `^[a-zA-Z_][a-zA-Z0-9_]*$`, max 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    /// Create a new ServiceName, validating it for the given field.
    pub fn new(field: &'static str, name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();
        let mut chars = name.chars();

        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !head_ok || !tail_ok || name.len() > MAX_NAME_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field,
                value: name,
                reason: "Must start with a letter or underscore and contain only letters, digits and underscores (max 64)".to_string(),
            });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ServiceName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new("service", value)
    }
}

impl From<ServiceName> for String {
    fn from(name: ServiceName) -> Self {
        name.0
    }
}

/// Service/instance/event triple identifying a data source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServiceDescription {
    pub service: ServiceName,
    pub instance: ServiceName,
    pub event: ServiceName,
}

impl fmt::Display for ServiceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, {}}}", self.service, self.instance, self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index_sentinel() {
        assert!(!SlotIndex::INVALID.is_valid());
        assert!(SlotIndex::new(0).is_valid());
        assert_eq!(SlotIndex::INVALID.to_string(), "<invalid>");
        assert_eq!(SlotIndex::new(3).to_string(), "3");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = TriggerId::next();
        let b = TriggerId::next();
        assert_ne!(a, b);
        assert_ne!(a, TriggerId::UNASSIGNED);

        assert_ne!(OriginId::next(), OriginId::next());
    }

    #[test]
    fn test_segment_name_valid() {
        assert!(SegmentName::new("shmwait-demo").is_ok());
        assert!(SegmentName::new("ws_01").is_ok());
    }

    #[test]
    fn test_segment_name_invalid() {
        assert!(SegmentName::new("").is_err());
        assert!(SegmentName::new("a".repeat(65)).is_err());
        assert!(SegmentName::new("with/slash").is_err());
        assert!(SegmentName::new("with space").is_err());
    }

    #[test]
    fn test_service_name_rules() {
        assert!(ServiceName::new("service", "radar").is_ok());
        assert!(ServiceName::new("service", "_hidden2").is_ok());
        assert!(ServiceName::new("service", "").is_err());
        assert!(ServiceName::new("service", "2fast").is_err());
        assert!(ServiceName::new("service", "front-left").is_err());
    }

    #[test]
    fn test_service_description_display() {
        let desc = ServiceDescription {
            service: ServiceName::new("service", "radar").unwrap(),
            instance: ServiceName::new("instance", "front").unwrap(),
            event: ServiceName::new("event", "objects").unwrap(),
        };
        assert_eq!(desc.to_string(), "{radar, front, objects}");
    }
}
