//! Error types for tracker construction and detection validation.

use thiserror::Error;

/// Errors surfaced by the tracker's fallible entry points.
///
/// `ActiveTrackSet::update` never returns an error; these only come from
/// building a tracker or validating detections before they are fed in.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    #[error("invalid tracker configuration: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("degenerate bounding box [{x1}, {y1}, {x2}, {y2}]")]
    DegenerateBox { x1: f32, y1: f32, x2: f32, y2: f32 },

    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f32),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
