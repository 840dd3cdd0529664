//! Tracker configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Configuration for the [`ActiveTrackSet`](crate::ActiveTrackSet).
///
/// Fixed for the lifetime of a tracker. Missing fields take their defaults
/// when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum confidence for a detection to be matched or start a track
    pub activation_threshold: f32,
    /// Minimum IoU for direct association
    pub matching_threshold: f32,
    /// Frames a lost track stays recoverable before it is removed
    pub lost_track_buffer: u32,
    /// Observed frames required before a tentative track is confirmed
    pub min_track_length: u32,
    /// Absolute age ceiling, in frames since creation
    pub max_age: u32,
    /// Capacity of each track's position and confidence history
    pub history_length: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 0.25,
            matching_threshold: 0.8,
            lost_track_buffer: 30,
            min_track_length: 3,
            max_age: 30,
            history_length: 30,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TrackerError {
    TrackerError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.activation_threshold) {
            return Err(invalid(
                "activation_threshold",
                format!("must be in [0, 1], got {}", self.activation_threshold),
            ));
        }
        if !(self.matching_threshold > 0.0 && self.matching_threshold <= 1.0) {
            return Err(invalid(
                "matching_threshold",
                format!("must be in (0, 1], got {}", self.matching_threshold),
            ));
        }
        if self.lost_track_buffer == 0 {
            return Err(invalid("lost_track_buffer", "must be at least 1"));
        }
        if self.min_track_length == 0 {
            return Err(invalid("min_track_length", "must be at least 1"));
        }
        if self.max_age == 0 {
            return Err(invalid("max_age", "must be at least 1"));
        }
        if self.history_length < 2 {
            return Err(invalid(
                "history_length",
                "must hold at least two points for velocity estimation",
            ));
        }
        Ok(())
    }
}
