// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Describes the wait set to create at startup and the services whose
//! events should be attached to it.
//! Any invalid field results in a HardValidationError that prevents startup.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HardValidationError, ShmWaitError, ShmWaitResult};
use crate::shm::MAX_SLOTS;
use crate::types::{SegmentName, ServiceDescription, ServiceName};

/// Raw wait set section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWaitSetConfig {
    #[serde(default = "default_capacity")]
    capacity: usize,
    #[serde(default)]
    segment: Option<String>,
    #[serde(default = "default_wait_timeout_ms")]
    wait_timeout_ms: u64,
}

fn default_capacity() -> usize {
    16
}

fn default_wait_timeout_ms() -> u64 {
    500
}

impl Default for RawWaitSetConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            segment: None,
            wait_timeout_ms: default_wait_timeout_ms(),
        }
    }
}

/// Raw service entry. Fields are optional here so a missing one is reported
/// as an incomplete description instead of a bare YAML error.
#[derive(Debug, Deserialize)]
struct RawServiceConfig {
    service: Option<String>,
    instance: Option<String>,
    event: Option<String>,
}

/// Raw root configuration file.
///
/// `services` has to be present, even if empty, so a file with a misspelled
/// or forgotten section is not taken for a listener with nothing to attach.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    waitset: RawWaitSetConfig,
    services: Option<Vec<RawServiceConfig>>,
}

/// Validated wait set configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSetConfig {
    pub capacity: usize,
    /// Named segment to create; `None` keeps the wait set process-private.
    pub segment: Option<SegmentName>,
    /// Timeout for a single wait in the listen loop.
    pub wait_timeout: Duration,
}

impl Default for WaitSetConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            segment: None,
            wait_timeout: Duration::from_millis(default_wait_timeout_ms()),
        }
    }
}

/// Slots the listener keeps for itself (the shutdown trigger).
pub const RESERVED_SLOTS: usize = 1;

/// Complete validated configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub waitset: WaitSetConfig,
    pub services: Vec<ServiceDescription>,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    /// Returns HardValidationError for any invalid fields.
    pub fn load_file(path: impl AsRef<Path>) -> ShmWaitResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ShmWaitError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ShmWaitError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> ShmWaitResult<Config> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| ShmWaitError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    /// Validate raw configuration and convert to validated types.
    fn validate(raw: RawConfig) -> ShmWaitResult<Config> {
        let waitset = Self::validate_waitset(raw.waitset)?;

        let raw_services = raw.services.ok_or(HardValidationError::MissingRequiredField {
            field: "services",
            context: "configuration root".to_string(),
        })?;

        let mut services = Vec::with_capacity(raw_services.len());
        let mut seen = HashSet::new();

        for (index, raw_service) in raw_services.into_iter().enumerate() {
            let service = Self::validate_service(raw_service, index)?;

            if !seen.insert(service.clone()) {
                return Err(HardValidationError::DuplicateService {
                    description: service.to_string(),
                }
                .into());
            }

            services.push(service);
        }

        // Every service gets its own slot, next to the reserved ones.
        if services.len() + RESERVED_SLOTS > waitset.capacity {
            return Err(HardValidationError::SchemaValidation {
                message: format!(
                    "{} services plus {} reserved slot(s) exceed wait set capacity {}",
                    services.len(),
                    RESERVED_SLOTS,
                    waitset.capacity
                ),
            }
            .into());
        }

        Ok(Config { waitset, services })
    }

    fn validate_waitset(raw: RawWaitSetConfig) -> ShmWaitResult<WaitSetConfig> {
        if raw.capacity == 0 || raw.capacity > MAX_SLOTS {
            return Err(HardValidationError::InvalidFieldValue {
                field: "capacity",
                value: raw.capacity.to_string(),
                reason: format!("Must be between 1 and {}", MAX_SLOTS),
            }
            .into());
        }

        if raw.wait_timeout_ms == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "wait_timeout_ms",
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            }
            .into());
        }

        let segment = raw.segment.map(SegmentName::new).transpose()?;

        Ok(WaitSetConfig {
            capacity: raw.capacity,
            segment,
            wait_timeout: Duration::from_millis(raw.wait_timeout_ms),
        })
    }

    /// Validate a single service entry.
    fn validate_service(raw: RawServiceConfig, index: usize) -> ShmWaitResult<ServiceDescription> {
        let context = format!("service at index {}", index);

        let field = |value: Option<String>, name: &'static str| -> ShmWaitResult<ServiceName> {
            let value = value.ok_or_else(|| HardValidationError::MissingRequiredField {
                field: name,
                context: context.clone(),
            })?;
            Ok(ServiceName::new(name, value)?)
        };

        Ok(ServiceDescription {
            service: field(raw.service, "service")?,
            instance: field(raw.instance, "instance")?,
            event: field(raw.event, "event")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
waitset:
  capacity: 8
  segment: gateway-ws
  wait_timeout_ms: 250

services:
  - service: radar
    instance: front_left
    event: objects
  - service: radar
    instance: front_right
    event: objects
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.waitset.capacity, 8);
        assert_eq!(config.waitset.segment.as_ref().unwrap().as_str(), "gateway-ws");
        assert_eq!(config.waitset.wait_timeout, Duration::from_millis(250));
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[1].instance.as_str(), "front_right");
    }

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::load_string("services: []").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.waitset.capacity, 16);
        assert!(config.waitset.segment.is_none());
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(ConfigLoader::load_string("waitset:\n  capacity: 0\n").is_err());
        assert!(ConfigLoader::load_string("waitset:\n  capacity: 129\n").is_err());
        assert!(ConfigLoader::load_string("waitset:\n  capacity: 128\nservices: []\n").is_ok());
    }

    #[test]
    fn test_incomplete_service() {
        let yaml = r#"
services:
  - service: radar
    event: objects
"#;
        let result = ConfigLoader::load_string(yaml);
        assert!(matches!(
            result,
            Err(ShmWaitError::HardValidation(
                HardValidationError::MissingRequiredField { field: "instance", .. }
            ))
        ));
    }

    #[test]
    fn test_invalid_service_name() {
        let yaml = r#"
services:
  - service: radar
    instance: front-left
    event: objects
"#;
        let result = ConfigLoader::load_string(yaml);
        assert!(matches!(
            result,
            Err(ShmWaitError::HardValidation(
                HardValidationError::InvalidFieldValue { field: "instance", .. }
            ))
        ));
    }

    #[test]
    fn test_duplicate_services() {
        let yaml = r#"
services:
  - service: radar
    instance: front
    event: objects
  - service: radar
    instance: front
    event: objects
"#;
        let result = ConfigLoader::load_string(yaml);
        assert!(matches!(
            result,
            Err(ShmWaitError::HardValidation(HardValidationError::DuplicateService { .. }))
        ));
    }

    #[test]
    fn test_more_services_than_slots() {
        let yaml = r#"
waitset:
  capacity: 1
services:
  - service: a
    instance: b
    event: c
  - service: a
    instance: b
    event: d
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_services_leave_room_for_reserved_slot() {
        let full = r#"
waitset:
  capacity: 2
services:
  - service: a
    instance: b
    event: c
  - service: a
    instance: b
    event: d
"#;
        assert!(matches!(
            ConfigLoader::load_string(full),
            Err(ShmWaitError::HardValidation(HardValidationError::SchemaValidation { .. }))
        ));

        let fits = full.replace("capacity: 2", "capacity: 3");
        let config = ConfigLoader::load_string(&fits).unwrap();
        assert_eq!(config.services.len() + RESERVED_SLOTS, config.waitset.capacity);
    }

    #[test]
    fn test_missing_services_section() {
        let result = ConfigLoader::load_string("waitset:\n  capacity: 4\n");
        assert!(matches!(
            result,
            Err(ShmWaitError::HardValidation(
                HardValidationError::MissingRequiredField { field: "services", .. }
            ))
        ));
        assert!(ConfigLoader::load_string("services: []\n").is_ok());
    }

    #[test]
    fn test_invalid_segment_name() {
        let yaml = "waitset:\n  segment: \"bad/name\"\n";
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_unknown_waitset_field() {
        let yaml = "waitset:\n  capacty: 4\n";
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(ShmWaitError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load_file("/nonexistent/shmwait.yaml");
        assert!(matches!(result, Err(ShmWaitError::ConfigNotFound { .. })));
    }
}
