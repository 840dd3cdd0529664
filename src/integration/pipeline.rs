//! TrackerPipeline for combining detection with tracking.

use crate::error::Result;
use crate::tracker::{ActiveTrackSet, FrameResult, TrackerConfig};

use super::DetectionSource;

/// A detector and a tracker driven together, one frame per call.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: ActiveTrackSet,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Fails only if `config` is invalid.
    pub fn new(detector: D, config: TrackerConfig) -> Result<Self> {
        Ok(Self {
            detector,
            tracker: ActiveTrackSet::new(config)?,
        })
    }

    pub fn with_default_config(detector: D) -> Result<Self> {
        Self::new(detector, TrackerConfig::default())
    }

    /// Run detection on one frame and feed the result to the tracker.
    ///
    /// A detector error leaves the tracker untouched, so the frame counter
    /// does not advance for that frame.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> std::result::Result<FrameResult, D::Error> {
        let detections = self.detector.detect(input, width, height)?;
        Ok(self.tracker.update(&detections))
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn tracker(&self) -> &ActiveTrackSet {
        &self.tracker
    }
}
