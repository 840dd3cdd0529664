//! Glue between detection backends and the tracker.
//!
//! The tracker never runs a detector itself. These traits let any backend
//! hand its per-frame output to an [`ActiveTrackSet`](crate::ActiveTrackSet).

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::TrackerPipeline;
