//! Trait for object detection inference backends.

use crate::tracker::{Detection, Rect};

/// Anything that can produce detections for one frame.
///
/// Implement this trait to feed a detection model into a
/// [`TrackerPipeline`](super::TrackerPipeline).
///
/// # Example
///
/// ```ignore
/// use occtrack_rs::{DetectionSource, Detection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run inference on one frame of raw image data.
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// Conversion from a backend's native output into detections.
pub trait IntoDetections {
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// `([x1, y1, x2, y2], score)` pairs.
impl IntoDetections for Vec<([f32; 4], f32)> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|([x1, y1, x2, y2], score)| {
                Detection::from_rect(Rect::from_tlbr(x1, y1, x2, y2), score)
            })
            .collect()
    }
}

/// `([x1, y1, x2, y2], score, class_id)` triples.
impl IntoDetections for Vec<([f32; 4], f32, i64)> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|([x1, y1, x2, y2], score, class_id)| {
                Detection::new(x1, y1, x2, y2, score).with_class(class_id)
            })
            .collect()
    }
}
