//! Simulation tuning
//!
//! Loaded from JSON by the host application; every field has a default so a
//! partial document is enough.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Events whose durations differ by at most this much share one transition
    pub tie_tolerance: f64,
    /// Upper bound on snapshots appended by one `calculate_to_time`
    pub max_transitions_per_advance: usize,
    /// Skip the quartic solve when swept paths never come within reach
    pub sweep_rejection: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tie_tolerance: TIE_TOLERANCE,
            max_transitions_per_advance: MAX_TRANSITIONS_PER_ADVANCE,
            sweep_rejection: true,
        }
    }
}

impl SimConfig {
    /// Parse a JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        log::info!("Loaded simulation config: {:?}", config);
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every field is in range
    pub fn validate(&self) -> Result<()> {
        if !self.tie_tolerance.is_finite() || self.tie_tolerance < 0.0 {
            return Err(SimError::config(format!(
                "tie_tolerance must be finite and non-negative, got {}",
                self.tie_tolerance
            )));
        }
        if self.max_transitions_per_advance == 0 {
            return Err(SimError::config("max_transitions_per_advance must be positive"));
        }
        Ok(())
    }
}
