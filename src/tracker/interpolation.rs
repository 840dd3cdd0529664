//! Constant-velocity trajectory fill for short observation gaps.

use nalgebra::Vector2;

use crate::tracker::track::{Track, TrajectoryPoint};

/// Synthesises trajectory points for frames a track was not observed in.
///
/// Only `position_history` is touched; the track's box and score always come
/// from real observations.
#[derive(Debug, Clone, Copy)]
pub struct GapInterpolator {
    max_gap: u32,
}

impl GapInterpolator {
    /// Gaps longer than half the lost-track buffer are left empty.
    pub fn new(lost_track_buffer: u32) -> Self {
        Self {
            max_gap: lost_track_buffer / 2,
        }
    }

    pub fn max_gap(&self) -> u32 {
        self.max_gap
    }

    /// Fill frames strictly between the track's last observation and `frame_id`.
    ///
    /// Must run before the observation for `frame_id` is recorded. Velocity is
    /// taken from the last two history points. Returns the number of points
    /// appended.
    pub fn fill(&self, track: &mut Track, frame_id: u32) -> usize {
        let last_frame = track.last_frame();
        let frame_delta = frame_id.saturating_sub(last_frame);
        if frame_delta <= 1 || frame_delta > self.max_gap {
            return 0;
        }

        let history = track.position_history();
        let n = history.len();
        if n < 2 {
            return 0;
        }
        let last = history[n - 1];
        let prev = history[n - 2];

        let prev_delta = last.frame_id.saturating_sub(prev.frame_id);
        if prev_delta == 0 {
            return 0;
        }
        let velocity: Vector2<f32> = (last.position - prev.position) / prev_delta as f32;

        for skipped in (last_frame + 1)..frame_id {
            let steps = (skipped - last_frame) as f32;
            track.push_position(TrajectoryPoint {
                position: last.position + velocity * steps,
                frame_id: skipped,
                interpolated: true,
            });
        }

        tracing::trace!(
            track_id = %track.id(),
            from = last_frame,
            to = frame_id,
            "interpolated gap"
        );
        (frame_delta - 1) as usize
    }
}
