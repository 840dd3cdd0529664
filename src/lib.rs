//! Occlusion-aware multi-object tracking.
//!
//! Turns a per-frame stream of bounding-box detections into stable track
//! identities. Association is greedy IoU matching; tracks that drop out are
//! recovered from their last observed position, short gaps are filled by
//! constant-velocity interpolation, and near-identical boxes claimed by two
//! tracks in the same frame are collapsed to a single identity.
//!
//! ```
//! use occtrack_rs::{ActiveTrackSet, Detection, TrackerConfig};
//!
//! let mut tracker = ActiveTrackSet::new(TrackerConfig::default()).unwrap();
//! let result = tracker.update(&[Detection::new(0.0, 0.0, 10.0, 10.0, 0.9)]);
//! assert_eq!(result.assigned_ids().len(), 1);
//! ```

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::{Result, TrackerError};
pub use integration::{DetectionBuilder, DetectionSource, IntoDetections, TrackerPipeline};
pub use tracker::{
    ActiveTrackSet, Assignment, Detection, FrameResult, Rect, Track, TrackId, TrackSnapshot,
    TrackState, TrackerConfig,
};
