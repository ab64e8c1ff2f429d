// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device identity attached to every datapoint.

use crate::error::{DatapointError, Result};
use std::fmt;

/// Identity of the device that produced a set of readings.
///
/// Immutable once built; every representation carries it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device {
    device_id: String,
    device_type: String,
}

impl Device {
    /// Build a validated device identity.
    pub fn new(device_id: impl Into<String>, device_type: impl Into<String>) -> Result<Self> {
        let device_id = device_id.into();
        let device_type = device_type.into();
        validate_identifier("deviceId", &device_id)?;
        validate_identifier("deviceType", &device_type)?;
        Ok(Self {
            device_id,
            device_type,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device_type, self.device_id)
    }
}

/// Identifiers must be non-blank and free of control characters.
fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DatapointError::MalformedIdentity {
            field,
            reason: "empty".to_string(),
        });
    }
    if let Some(c) = value.chars().find(|c| c.is_control()) {
        return Err(DatapointError::MalformedIdentity {
            field,
            reason: format!("contains control character {:?}", c),
        });
    }
    Ok(())
}
