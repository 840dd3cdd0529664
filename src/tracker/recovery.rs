//! Observation-centric recovery of recently lost tracks.
//!
//! A lost track is re-identified purely from positional continuity: its last
//! observed box is compared against detections nobody claimed this frame,
//! using a threshold looser than direct association.

use crate::tracker::observation_buffer::ObservationBuffer;
use crate::tracker::rect::Rect;
use crate::tracker::track::{Track, TrackId};

/// Scale applied to `matching_threshold` for recovery matches.
pub const RECOVERY_THRESHOLD_FACTOR: f32 = 0.7;

#[derive(Debug, Clone, Copy)]
pub struct RecoveryEngine {
    iou_threshold: f32,
    lost_track_buffer: u32,
}

impl RecoveryEngine {
    pub fn new(matching_threshold: f32, lost_track_buffer: u32) -> Self {
        Self {
            iou_threshold: matching_threshold * RECOVERY_THRESHOLD_FACTOR,
            lost_track_buffer,
        }
    }

    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Lost, and lost for no more than `lost_track_buffer` frames.
    pub fn is_recoverable(&self, track: &Track, frame_id: u32) -> bool {
        track.is_lost()
            && track
                .lost_since_frame()
                .is_some_and(|since| frame_id.saturating_sub(since) <= self.lost_track_buffer)
    }

    /// Box a lost track is matched against.
    ///
    /// The buffered entry at [`Track::last_observation`] and [`Track::bbox`]
    /// are written from the same detection, so they agree while that frame is
    /// still buffered. Once it is evicted the stored box is used.
    pub fn reference_box(track: &Track, observations: &ObservationBuffer) -> Rect {
        let (frame_id, index) = track.last_observation();
        observations
            .observation(frame_id, index)
            .unwrap_or_else(|| track.bbox())
    }

    /// Pair recoverable tracks with unclaimed detections.
    ///
    /// Tracks are visited in ascending id order and each takes its best
    /// remaining detection, so a lower id wins a contested detection even if a
    /// later track overlaps it more. Ties on IoU go to the lower detection
    /// index. `unclaimed` holds indices into `detections`.
    pub fn recover<'a>(
        &self,
        tracks: impl IntoIterator<Item = &'a Track>,
        observations: &ObservationBuffer,
        frame_id: u32,
        detections: &[Rect],
        unclaimed: &[usize],
    ) -> Vec<(TrackId, usize)> {
        let mut lost: Vec<&Track> = tracks
            .into_iter()
            .filter(|t| self.is_recoverable(t, frame_id))
            .collect();
        lost.sort_by_key(|t| t.id());

        let mut available = unclaimed.to_vec();
        let mut recovered = Vec::new();

        for track in lost {
            if available.is_empty() {
                break;
            }
            let reference = Self::reference_box(track, observations);

            let mut best: Option<(usize, f32)> = None;
            for (slot, &det_idx) in available.iter().enumerate() {
                let iou = reference.iou(&detections[det_idx]);
                if iou >= self.iou_threshold && best.is_none_or(|(_, b)| iou > b) {
                    best = Some((slot, iou));
                }
            }

            if let Some((slot, iou)) = best {
                let det_idx = available.remove(slot);
                tracing::debug!(track_id = %track.id(), det_idx, iou, "recovered lost track");
                recovered.push((track.id(), det_idx));
            }
        }

        recovered
    }
}
