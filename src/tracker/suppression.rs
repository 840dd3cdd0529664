//! Track-level NMS over one frame's identity assignments.

use std::cmp::Ordering;

use crate::tracker::rect::Rect;
use crate::tracker::track::TrackId;

/// Boxes overlapping more than this are treated as the same object.
pub const DUPLICATE_IOU_THRESHOLD: f32 = 0.9;

/// A detection that was given a track id this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub detection_index: usize,
    pub track_id: TrackId,
    pub bbox: Rect,
    /// Confidence of this frame's detection
    pub score: f32,
    pub age: u32,
}

impl Candidate {
    /// Higher confidence first, then the older track, then the lower id.
    fn priority(&self, other: &Candidate) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.age.cmp(&self.age))
            .then_with(|| self.track_id.cmp(&other.track_id))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DuplicateSuppressor {
    iou_threshold: f32,
}

impl Default for DuplicateSuppressor {
    fn default() -> Self {
        Self::new(DUPLICATE_IOU_THRESHOLD)
    }
}

impl DuplicateSuppressor {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }

    /// Positions in `candidates` whose assignment must be dropped, ascending.
    ///
    /// Every pair overlapping by more than the threshold is compared, and the
    /// lower-priority side of each pair is dropped. In a chain A~B~C both B
    /// and C lose even when A and C do not overlap. Only the frame's
    /// assignment is affected, the losing track lives on.
    pub fn suppress(&self, candidates: &[Candidate]) -> Vec<usize> {
        let mut dropped = vec![false; candidates.len()];

        for (i, a) in candidates.iter().enumerate() {
            for (j, b) in candidates.iter().enumerate().skip(i + 1) {
                if a.bbox.iou(&b.bbox) <= self.iou_threshold {
                    continue;
                }
                let (winner, loser) = match a.priority(b) {
                    Ordering::Greater => (j, i),
                    _ => (i, j),
                };
                tracing::trace!(
                    kept = %candidates[winner].track_id,
                    dropped = %candidates[loser].track_id,
                    "suppressed duplicate assignment"
                );
                dropped[loser] = true;
            }
        }

        (0..candidates.len()).filter(|&i| dropped[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(det: usize, id: u64, bbox: Rect, score: f32, age: u32) -> Candidate {
        Candidate {
            detection_index: det,
            track_id: TrackId(id),
            bbox,
            score,
            age,
        }
    }

    fn near_duplicates() -> (Rect, Rect) {
        // IoU = 380.25 / 419.75 ~ 0.906
        (
            Rect::from_tlbr(0.0, 0.0, 20.0, 20.0),
            Rect::from_tlbr(0.5, 0.5, 20.5, 20.5),
        )
    }

    #[test]
    fn test_lower_confidence_is_dropped() {
        let (a, b) = near_duplicates();
        let candidates = [candidate(0, 1, a, 0.9, 1), candidate(1, 2, b, 0.95, 1)];
        assert_eq!(DuplicateSuppressor::default().suppress(&candidates), vec![0]);
    }

    #[test]
    fn test_confidence_tie_keeps_older_track() {
        let (a, b) = near_duplicates();
        let candidates = [candidate(0, 1, a, 0.9, 10), candidate(1, 2, b, 0.9, 2)];
        assert_eq!(DuplicateSuppressor::default().suppress(&candidates), vec![1]);
    }

    #[test]
    fn test_full_tie_keeps_lower_id() {
        let (a, b) = near_duplicates();
        let candidates = [candidate(0, 5, a, 0.9, 3), candidate(1, 4, b, 0.9, 3)];
        assert_eq!(DuplicateSuppressor::default().suppress(&candidates), vec![0]);
    }

    #[test]
    fn test_moderate_overlap_is_kept() {
        // IoU ~ 0.82, below the duplicate threshold.
        let candidates = [
            candidate(0, 1, Rect::from_tlbr(0.0, 0.0, 20.0, 20.0), 0.9, 1),
            candidate(1, 2, Rect::from_tlbr(1.0, 1.0, 21.0, 21.0), 0.95, 1),
        ];
        assert!(DuplicateSuppressor::default().suppress(&candidates).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(DuplicateSuppressor::default().suppress(&[]).is_empty());
    }

    #[test]
    fn test_chain_drops_loser_of_every_pair() {
        // IoU(a, b) = IoU(b, c) ~ 0.914, IoU(a, c) ~ 0.835.
        let a = Rect::from_tlbr(0.0, 0.0, 20.0, 20.0);
        let b = Rect::from_tlbr(0.9, 0.0, 20.9, 20.0);
        let c = Rect::from_tlbr(1.8, 0.0, 21.8, 20.0);
        assert!(a.iou(&c) <= DUPLICATE_IOU_THRESHOLD);

        let candidates = [
            candidate(0, 1, a, 0.95, 1),
            candidate(1, 2, b, 0.9, 1),
            candidate(2, 3, c, 0.8, 1),
        ];
        assert_eq!(DuplicateSuppressor::default().suppress(&candidates), vec![1, 2]);
    }
}
