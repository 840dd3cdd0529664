//! Detection input and greedy IoU association.

use ndarray::Array2;

use crate::error::{Result, TrackerError};
use crate::tracker::rect::Rect;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in TLBR format (x1, y1, x2, y2)
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
    /// Detector class, if the detector emits one
    pub class_id: Option<i64>,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            score,
            class_id: None,
        }
    }

    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self {
            bbox,
            score,
            class_id: None,
        }
    }

    pub fn with_class(mut self, class_id: i64) -> Self {
        self.class_id = Some(class_id);
        self
    }

    /// Reject degenerate boxes and confidences outside `[0, 1]`.
    ///
    /// The tracker assumes validated input; call this before `update` when the
    /// detector cannot be trusted to produce well-formed output.
    pub fn validate(&self) -> Result<()> {
        if !self.bbox.is_valid() {
            let [x1, y1, x2, y2] = self.bbox.to_tlbr();
            return Err(TrackerError::DegenerateBox { x1, y1, x2, y2 });
        }
        if !(0.0..=1.0).contains(&self.score) {
            return Err(TrackerError::ConfidenceOutOfRange(self.score));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// Matched `(row, col)` pairs in the order they were chosen
    pub matches: Vec<(usize, usize)>,
    pub unmatched_rows: Vec<usize>,
    pub unmatched_cols: Vec<usize>,
}

/// Greedy repeated-argmax assignment over a similarity matrix.
///
/// Picks the remaining pair with the highest similarity, provided it is at
/// least `thresh`, removes its row and column, and repeats. This is not an
/// optimal bipartite assignment: a locally best pair is always taken even when
/// it forces a worse total.
///
/// Ties on the maximum resolve to the lowest row, then the lowest column.
pub fn greedy_assignment(similarity: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = similarity.dim();

    let mut row_free = vec![true; num_rows];
    let mut col_free = vec![true; num_cols];
    let mut matches = Vec::new();

    loop {
        let mut best: Option<(usize, usize, f32)> = None;
        for i in (0..num_rows).filter(|&i| row_free[i]) {
            for j in (0..num_cols).filter(|&j| col_free[j]) {
                let value = similarity[[i, j]];
                if value.is_nan() {
                    continue;
                }
                // Strict comparison keeps the first (lowest index) pair on ties.
                if best.is_none_or(|(_, _, b)| value > b) {
                    best = Some((i, j, value));
                }
            }
        }

        match best {
            Some((i, j, value)) if value >= thresh => {
                row_free[i] = false;
                col_free[j] = false;
                matches.push((i, j));
            }
            _ => break,
        }
    }

    AssignmentResult {
        matches,
        unmatched_rows: (0..num_rows).filter(|&i| row_free[i]).collect(),
        unmatched_cols: (0..num_cols).filter(|&j| col_free[j]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_global_max_first() {
        let sim = Array2::from_shape_vec((2, 2), vec![0.85, 0.95, 0.90, 0.10]).unwrap();
        let result = greedy_assignment(&sim, 0.5);

        // [0,1]=0.95 is taken first, which leaves [1,0]=0.90.
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
        assert!(result.unmatched_rows.is_empty());
        assert!(result.unmatched_cols.is_empty());
    }

    #[test]
    fn test_greedy_is_not_optimal() {
        // Optimal total pairs (0,1)+(1,0) = 1.7, greedy takes (0,0)=0.95 then
        // nothing else qualifies.
        let sim = Array2::from_shape_vec((2, 2), vec![0.95, 0.85, 0.85, 0.0]).unwrap();
        let result = greedy_assignment(&sim, 0.8);

        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_rows, vec![1]);
        assert_eq!(result.unmatched_cols, vec![1]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let sim = Array2::from_shape_vec((1, 1), vec![0.8]).unwrap();
        assert_eq!(greedy_assignment(&sim, 0.8).matches, vec![(0, 0)]);

        let sim = Array2::from_shape_vec((1, 1), vec![0.79]).unwrap();
        assert!(greedy_assignment(&sim, 0.8).matches.is_empty());
    }

    #[test]
    fn test_tie_prefers_lowest_row_then_col() {
        let sim = Array2::from_elem((2, 2), 0.9);
        let result = greedy_assignment(&sim, 0.5);
        assert_eq!(result.matches, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_empty_rows() {
        let sim = Array2::<f32>::zeros((0, 3));
        let result = greedy_assignment(&sim, 0.5);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_cols, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_cols() {
        let sim = Array2::<f32>::zeros((2, 0));
        let result = greedy_assignment(&sim, 0.5);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_rows, vec![0, 1]);
    }

    #[test]
    fn test_detection_validation() {
        assert!(Detection::new(0.0, 0.0, 10.0, 10.0, 0.5).validate().is_ok());
        assert!(matches!(
            Detection::new(10.0, 0.0, 10.0, 10.0, 0.5).validate(),
            Err(TrackerError::DegenerateBox { .. })
        ));
        assert_eq!(
            Detection::new(0.0, 0.0, 10.0, 10.0, 1.5).validate(),
            Err(TrackerError::ConfidenceOutOfRange(1.5))
        );
        assert!(Detection::new(0.0, 0.0, 10.0, 10.0, f32::NAN).validate().is_err());
    }
}
