//! A single tracked identity and its bounded history.

use std::collections::VecDeque;
use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Persistent identity of a track. Never reused by the tracker that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source owned by one tracker instance.
///
/// Ids start at 1, so two trackers fed the same frames hand out the same ids.
#[derive(Debug, Default, Clone)]
pub struct TrackIdGenerator {
    last: u64,
}

impl TrackIdGenerator {
    pub fn next_id(&mut self) -> TrackId {
        self.last += 1;
        TrackId(self.last)
    }

    /// Most recently issued id, or `None` before the first track.
    pub fn last_issued(&self) -> Option<TrackId> {
        (self.last > 0).then_some(TrackId(self.last))
    }
}

/// One sample of a track's centre trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub position: Point2<f32>,
    pub frame_id: u32,
    /// Synthesised by gap interpolation rather than observed
    pub interpolated: bool,
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, value: T, capacity: usize) {
    while buffer.len() >= capacity.max(1) {
        buffer.pop_front();
    }
    buffer.push_back(value);
}

#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    state: TrackState,
    /// Set on the first confirmation and never cleared
    confirmed_once: bool,
    bbox: Rect,
    score: f32,
    class_id: Option<i64>,
    age: u32,
    hits: u32,
    time_since_update: u32,
    first_frame: u32,
    last_frame: u32,
    lost_since_frame: Option<u32>,
    /// Index of the last observation within the filtered detections of `last_frame`
    last_observation_index: usize,
    position_history: VecDeque<TrajectoryPoint>,
    confidence_history: VecDeque<f32>,
    history_length: usize,
}

impl Track {
    pub(crate) fn new(
        id: TrackId,
        detection: &Detection,
        frame_id: u32,
        observation_index: usize,
        history_length: usize,
    ) -> Self {
        let mut track = Self {
            id,
            state: TrackState::Tentative,
            confirmed_once: false,
            bbox: detection.bbox,
            score: detection.score,
            class_id: detection.class_id,
            age: 0,
            hits: 0,
            time_since_update: 0,
            first_frame: frame_id,
            last_frame: frame_id,
            lost_since_frame: None,
            last_observation_index: observation_index,
            position_history: VecDeque::with_capacity(history_length),
            confidence_history: VecDeque::with_capacity(history_length),
            history_length,
        };
        track.observe(detection, frame_id, observation_index);
        track
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Whether the track has ever been confirmed, whatever its current state.
    pub fn was_confirmed(&self) -> bool {
        self.confirmed_once
    }

    /// Box of the most recent direct or recovered observation.
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn class_id(&self) -> Option<i64> {
        self.class_id
    }

    /// Frames since creation, counting the creation frame.
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Number of frames with a direct or recovered observation.
    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    pub fn first_frame(&self) -> u32 {
        self.first_frame
    }

    /// Frame of the most recent observation.
    pub fn last_frame(&self) -> u32 {
        self.last_frame
    }

    pub fn lost_since_frame(&self) -> Option<u32> {
        self.lost_since_frame
    }

    pub fn is_lost(&self) -> bool {
        self.state.is_lost()
    }

    pub fn position_history(&self) -> &VecDeque<TrajectoryPoint> {
        &self.position_history
    }

    pub fn confidence_history(&self) -> &VecDeque<f32> {
        &self.confidence_history
    }

    /// `(frame, index)` locating the last observation in the observation buffer.
    pub fn last_observation(&self) -> (u32, usize) {
        (self.last_frame, self.last_observation_index)
    }

    /// Record a direct or recovered observation for `frame_id`.
    pub(crate) fn observe(&mut self, detection: &Detection, frame_id: u32, observation_index: usize) {
        self.bbox = detection.bbox;
        self.score = detection.score;
        self.class_id = detection.class_id;
        self.last_frame = frame_id;
        self.last_observation_index = observation_index;
        self.hits += 1;
        self.time_since_update = 0;
        self.age = frame_id - self.first_frame + 1;

        self.push_position(TrajectoryPoint {
            position: detection.bbox.center(),
            frame_id,
            interpolated: false,
        });
        push_bounded(
            &mut self.confidence_history,
            detection.score,
            self.history_length,
        );
    }

    pub(crate) fn push_position(&mut self, point: TrajectoryPoint) {
        push_bounded(&mut self.position_history, point, self.history_length);
    }

    /// Advance the frame clock without an observation.
    pub(crate) fn tick(&mut self, frame_id: u32) {
        self.age = frame_id - self.first_frame + 1;
        self.time_since_update = frame_id - self.last_frame;
    }

    pub(crate) fn mark_confirmed(&mut self) {
        self.state = TrackState::Confirmed;
        self.confirmed_once = true;
        self.lost_since_frame = None;
    }

    pub(crate) fn mark_lost(&mut self, frame_id: u32) {
        self.state = TrackState::Lost;
        self.lost_since_frame = Some(frame_id);
    }

    pub(crate) fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }
}

#[cfg(test)]
pub(crate) fn test_track(id: u64, bbox: Rect, frame_id: u32) -> Track {
    Track::new(TrackId(id), &Detection::from_rect(bbox, 0.9), frame_id, 0, 30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator_is_monotonic() {
        let mut ids = TrackIdGenerator::default();
        assert_eq!(ids.last_issued(), None);
        assert_eq!(ids.next_id(), TrackId(1));
        assert_eq!(ids.next_id(), TrackId(2));
        assert_eq!(ids.last_issued(), Some(TrackId(2)));
    }

    #[test]
    fn test_new_track_is_tentative_with_one_hit() {
        let track = test_track(7, Rect::from_tlbr(0.0, 0.0, 10.0, 10.0), 3);
        assert_eq!(track.state(), TrackState::Tentative);
        assert_eq!(track.age(), 1);
        assert_eq!(track.hits(), 1);
        assert_eq!(track.first_frame(), 3);
        assert_eq!(track.last_frame(), 3);
        assert_eq!(track.position_history().len(), 1);
        assert_eq!(track.position_history()[0].position, Point2::new(5.0, 5.0));
        assert_eq!(track.id().to_string(), "7");
    }

    #[test]
    fn test_age_tracks_observed_span() {
        let mut track = test_track(1, Rect::from_tlbr(0.0, 0.0, 10.0, 10.0), 1);
        let det = Detection::new(1.0, 1.0, 11.0, 11.0, 0.7);
        track.observe(&det, 2, 0);
        track.observe(&det, 3, 0);
        assert_eq!(track.age(), track.last_frame() - track.first_frame() + 1);
        assert_eq!(track.age(), 3);
        assert_eq!(track.score(), 0.7);

        track.tick(5);
        assert_eq!(track.age(), 5);
        assert_eq!(track.time_since_update(), 2);
    }

    #[test]
    fn test_history_is_bounded() {
        let det = Detection::new(0.0, 0.0, 10.0, 10.0, 0.5);
        let mut track = Track::new(TrackId(1), &det, 1, 0, 3);
        for frame in 2..=10 {
            track.observe(&det, frame, 0);
        }
        assert_eq!(track.position_history().len(), 3);
        assert_eq!(track.confidence_history().len(), 3);
        assert_eq!(track.position_history()[0].frame_id, 8);
    }

    #[test]
    fn test_lost_and_confirmed_transitions() {
        let mut track = test_track(1, Rect::from_tlbr(0.0, 0.0, 10.0, 10.0), 1);
        track.mark_lost(4);
        assert!(track.is_lost());
        assert_eq!(track.lost_since_frame(), Some(4));

        assert!(!track.was_confirmed());

        track.mark_confirmed();
        assert_eq!(track.state(), TrackState::Confirmed);
        assert_eq!(track.lost_since_frame(), None);

        track.mark_lost(6);
        assert!(track.was_confirmed());
    }
}
