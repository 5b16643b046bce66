//! Coordinator and studio configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::CoordinatorLimits;

/// Transaction coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Credits debited per booking and refunded per cancellation.
    pub booking_cost: i64,
    /// Lock-acquisition attempts before surfacing a transaction conflict.
    pub max_txn_attempts: u32,
    /// Milliseconds each attempt waits on a contended class lock.
    pub lock_timeout_ms: u64,
    /// Maximum waitlist entries per class before joins are rejected.
    pub max_waitlist_depth: usize,
    /// Bounded buffer size for in-memory event sinks.
    pub event_buffer: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            booking_cost: 1,
            max_txn_attempts: 3,
            lock_timeout_ms: 50,
            max_waitlist_depth: 100,
            event_buffer: 1024,
        }
    }
}

impl CoordinatorConfig {
    /// Validate coordinator configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.booking_cost <= 0 {
            return Err("booking_cost must be greater than 0".into());
        }
        if self.max_txn_attempts == 0 {
            return Err("max_txn_attempts must be greater than 0".into());
        }
        if self.lock_timeout_ms == 0 {
            return Err("lock_timeout_ms must be greater than 0".into());
        }
        if self.max_waitlist_depth == 0 {
            return Err("max_waitlist_depth must be greater than 0".into());
        }
        if self.event_buffer == 0 {
            return Err("event_buffer must be greater than 0".into());
        }
        Ok(())
    }

    /// Convert to runtime limits.
    pub fn limits(&self) -> CoordinatorLimits {
        CoordinatorLimits {
            booking_cost: self.booking_cost,
            max_txn_attempts: self.max_txn_attempts,
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
        }
    }
}

/// Root studio configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Transaction coordinator settings.
    pub coordinator: CoordinatorConfig,
}

impl StudioConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        self.coordinator
            .validate()
            .map_err(|e| format!("coordinator config invalid: {e}"))
    }

    /// Parse studio configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: StudioConfig =
            serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
