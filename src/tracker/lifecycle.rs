//! Track state transitions.
//!
//! | From                | Event                                        | To        |
//! |---------------------|----------------------------------------------|-----------|
//! | (none)              | unmatched, unrecovered detection             | Tentative |
//! | Tentative           | observed on `min_track_length` frames        | Confirmed |
//! | Tentative/Lost      | age >= max(5, `min_track_length`), never     | Removed   |
//! |                     | confirmed                                    |           |
//! | Tentative/Confirmed | no detection this frame                      | Lost      |
//! | Lost                | matched or recovered                         | Confirmed |
//! | Lost                | lost for more than `lost_track_buffer`       | Removed   |
//! | any                 | age > `max_age`                              | Removed   |

use crate::tracker::track::Track;
use crate::tracker::track_state::TrackState;

/// Floor on the age at which a never-confirmed track is dropped.
pub const TENTATIVE_REMOVAL_AGE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Never confirmed and old enough to be dropped, whether Tentative or Lost
    FalsePositive,
    /// Lost for longer than the recovery window
    Expired,
    /// Exceeded the absolute age ceiling
    MaxAge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Confirmed,
    Lost,
    Recovered,
    Removed(RemovalReason),
}

#[derive(Debug, Clone, Copy)]
pub struct LifecycleManager {
    min_track_length: u32,
    lost_track_buffer: u32,
    max_age: u32,
}

impl LifecycleManager {
    pub fn new(min_track_length: u32, lost_track_buffer: u32, max_age: u32) -> Self {
        Self {
            min_track_length,
            lost_track_buffer,
            max_age,
        }
    }

    /// A track that got no detection this frame. Already-lost tracks keep
    /// the frame they were first lost in.
    pub fn mark_missed(&self, track: &mut Track, frame_id: u32) -> Option<Transition> {
        track.tick(frame_id);
        match track.state() {
            TrackState::Tentative | TrackState::Confirmed => {
                track.mark_lost(frame_id);
                tracing::debug!(track_id = %track.id(), frame_id, "track lost");
                Some(Transition::Lost)
            }
            TrackState::Lost | TrackState::Removed => None,
        }
    }

    /// A lost track that was matched again, directly or through recovery.
    pub fn mark_recovered(&self, track: &mut Track) -> Option<Transition> {
        if track.is_lost() {
            track.mark_confirmed();
            Some(Transition::Recovered)
        } else {
            None
        }
    }

    /// Decide the end-of-frame transition for `track` without applying it.
    pub fn evaluate(&self, track: &Track, frame_id: u32) -> Option<Transition> {
        if track.age() > self.max_age {
            return Some(Transition::Removed(RemovalReason::MaxAge));
        }
        let false_positive = !track.was_confirmed()
            && track.age() >= TENTATIVE_REMOVAL_AGE.max(self.min_track_length);
        match track.state() {
            TrackState::Tentative => {
                if track.hits() >= self.min_track_length {
                    Some(Transition::Confirmed)
                } else if false_positive {
                    Some(Transition::Removed(RemovalReason::FalsePositive))
                } else {
                    None
                }
            }
            TrackState::Lost if false_positive => {
                Some(Transition::Removed(RemovalReason::FalsePositive))
            }
            TrackState::Lost => {
                let lost_for = track
                    .lost_since_frame()
                    .map_or(0, |since| frame_id.saturating_sub(since));
                (lost_for > self.lost_track_buffer)
                    .then_some(Transition::Removed(RemovalReason::Expired))
            }
            TrackState::Confirmed | TrackState::Removed => None,
        }
    }

    /// Evaluate and apply the end-of-frame transition.
    pub fn apply(&self, track: &mut Track, frame_id: u32) -> Option<Transition> {
        let transition = self.evaluate(track, frame_id)?;
        match transition {
            Transition::Confirmed => {
                track.mark_confirmed();
                tracing::debug!(track_id = %track.id(), frame_id, "track confirmed");
            }
            Transition::Removed(reason) => {
                track.mark_removed();
                tracing::debug!(track_id = %track.id(), frame_id, ?reason, "track removed");
            }
            Transition::Lost | Transition::Recovered => {}
        }
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::matching::Detection;
    use crate::tracker::rect::Rect;
    use crate::tracker::track::test_track;

    fn unit_detection() -> Detection {
        Detection::new(0.0, 0.0, 10.0, 10.0, 0.9)
    }

    fn manager() -> LifecycleManager {
        LifecycleManager::new(3, 30, 30)
    }

    #[test]
    fn test_confirms_after_min_track_length() {
        let lifecycle = manager();
        let mut track = test_track(1, unit_detection().bbox, 1);
        assert_eq!(lifecycle.apply(&mut track, 1), None);

        track.observe(&unit_detection(), 2, 0);
        assert_eq!(lifecycle.apply(&mut track, 2), None);

        track.observe(&unit_detection(), 3, 0);
        assert_eq!(lifecycle.apply(&mut track, 3), Some(Transition::Confirmed));
        assert_eq!(track.state(), TrackState::Confirmed);
    }

    #[test]
    fn test_min_track_length_one_confirms_immediately() {
        let lifecycle = LifecycleManager::new(1, 30, 30);
        let mut track = test_track(1, unit_detection().bbox, 1);
        assert_eq!(lifecycle.apply(&mut track, 1), Some(Transition::Confirmed));
    }

    #[test]
    fn test_unconfirmed_tentative_is_removed() {
        let lifecycle = manager();
        let mut track = test_track(1, unit_detection().bbox, 1);
        // Aged to 5 frames with a single observation.
        track.tick(5);
        assert_eq!(
            lifecycle.evaluate(&track, 5),
            Some(Transition::Removed(RemovalReason::FalsePositive))
        );
    }

    #[test]
    fn test_never_confirmed_lost_track_is_removed() {
        let lifecycle = manager();
        let mut track = test_track(1, unit_detection().bbox, 1);
        lifecycle.mark_missed(&mut track, 2);
        lifecycle.mark_missed(&mut track, 4);
        assert_eq!(lifecycle.evaluate(&track, 4), None);

        lifecycle.mark_missed(&mut track, 5);
        assert_eq!(
            lifecycle.evaluate(&track, 5),
            Some(Transition::Removed(RemovalReason::FalsePositive))
        );
    }

    #[test]
    fn test_previously_confirmed_lost_track_waits_for_expiry() {
        let lifecycle = LifecycleManager::new(1, 30, 100);
        let mut track = test_track(1, unit_detection().bbox, 1);
        assert_eq!(lifecycle.apply(&mut track, 1), Some(Transition::Confirmed));
        lifecycle.mark_missed(&mut track, 2);
        lifecycle.mark_missed(&mut track, 10);
        assert_eq!(lifecycle.evaluate(&track, 10), None);
    }

    #[test]
    fn test_miss_marks_lost_once() {
        let lifecycle = manager();
        let mut track = test_track(1, unit_detection().bbox, 1);
        assert_eq!(lifecycle.mark_missed(&mut track, 2), Some(Transition::Lost));
        assert_eq!(lifecycle.mark_missed(&mut track, 3), None);
        assert_eq!(track.lost_since_frame(), Some(2));
        assert_eq!(track.time_since_update(), 2);
    }

    #[test]
    fn test_lost_expires_after_buffer() {
        let lifecycle = LifecycleManager::new(3, 5, 100);
        let mut track = test_track(1, unit_detection().bbox, 1);
        lifecycle.mark_missed(&mut track, 2);

        assert_eq!(lifecycle.evaluate(&track, 7), None);
        assert_eq!(
            lifecycle.evaluate(&track, 8),
            Some(Transition::Removed(RemovalReason::Expired))
        );
    }

    #[test]
    fn test_recovery_confirms_lost_track() {
        let lifecycle = manager();
        let mut track = test_track(1, unit_detection().bbox, 1);
        lifecycle.mark_missed(&mut track, 2);
        assert_eq!(lifecycle.mark_recovered(&mut track), Some(Transition::Recovered));
        assert_eq!(track.state(), TrackState::Confirmed);
        assert_eq!(track.lost_since_frame(), None);
        assert_eq!(lifecycle.mark_recovered(&mut track), None);
    }

    #[test]
    fn test_max_age_removes_any_state() {
        let lifecycle = LifecycleManager::new(1, 30, 4);
        let mut track = test_track(1, Rect::from_tlbr(0.0, 0.0, 1.0, 1.0), 1);
        lifecycle.apply(&mut track, 1);
        for frame in 2..=5 {
            track.observe(&unit_detection(), frame, 0);
        }
        assert_eq!(track.age(), 5);
        assert_eq!(
            lifecycle.apply(&mut track, 5),
            Some(Transition::Removed(RemovalReason::MaxAge))
        );
        assert_eq!(track.state(), TrackState::Removed);
    }
}
