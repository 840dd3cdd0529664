//! Track table and the per-frame update pipeline.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::Result;
use crate::tracker::config::TrackerConfig;
use crate::tracker::interpolation::GapInterpolator;
use crate::tracker::lifecycle::{LifecycleManager, Transition};
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::observation_buffer::ObservationBuffer;
use crate::tracker::recovery::RecoveryEngine;
use crate::tracker::rect::{Rect, iou_batch};
use crate::tracker::suppression::{Candidate, DuplicateSuppressor};
use crate::tracker::track::{Track, TrackId, TrackIdGenerator};
use crate::tracker::track_state::TrackState;

/// Lost tracks younger than this still take part in direct association.
pub const LOST_ASSOCIATION_GRACE: u32 = 5;

/// Identity given to one input detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Assignment {
    Assigned(TrackId),
    #[default]
    Unassigned,
}

impl Assignment {
    pub fn track_id(self) -> Option<TrackId> {
        match self {
            Assignment::Assigned(id) => Some(id),
            Assignment::Unassigned => None,
        }
    }
}

/// Read-only view of a live track, handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub id: TrackId,
    pub bbox: Rect,
    pub score: f32,
    pub age: u32,
    pub state: TrackState,
    pub class_id: Option<i64>,
}

impl TrackSnapshot {
    pub fn is_lost(&self) -> bool {
        self.state.is_lost()
    }
}

impl From<&Track> for TrackSnapshot {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id(),
            bbox: track.bbox(),
            score: track.score(),
            age: track.age(),
            state: track.state(),
            class_id: track.class_id(),
        }
    }
}

/// Output of one `update` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub frame_id: u32,
    /// One entry per input detection, in input order
    pub assignments: Vec<Assignment>,
    /// Every track still held after this frame, ascending by id
    pub tracks: Vec<TrackSnapshot>,
}

impl FrameResult {
    pub fn track_id_for(&self, detection_index: usize) -> Option<TrackId> {
        self.assignments
            .get(detection_index)
            .and_then(|a| a.track_id())
    }

    /// Ids assigned this frame, in detection order.
    pub fn assigned_ids(&self) -> Vec<TrackId> {
        self.assignments.iter().filter_map(|a| a.track_id()).collect()
    }
}

/// Owns every track and drives the per-frame pipeline.
///
/// Frames are implied by call order: each `update` advances the internal
/// frame counter by one, so skipped calls behave like frames with no
/// detections. Not thread-safe; a single caller must drive it.
pub struct ActiveTrackSet {
    tracks: BTreeMap<TrackId, Track>,
    observations: ObservationBuffer,
    ids: TrackIdGenerator,
    frame_id: u32,
    config: TrackerConfig,
    recovery: RecoveryEngine,
    interpolator: GapInterpolator,
    lifecycle: LifecycleManager,
    suppressor: DuplicateSuppressor,
}

impl ActiveTrackSet {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracks: BTreeMap::new(),
            observations: ObservationBuffer::new(config.lost_track_buffer as usize),
            ids: TrackIdGenerator::default(),
            frame_id: 0,
            recovery: RecoveryEngine::new(config.matching_threshold, config.lost_track_buffer),
            interpolator: GapInterpolator::new(config.lost_track_buffer),
            lifecycle: LifecycleManager::new(
                config.min_track_length,
                config.lost_track_buffer,
                config.max_age,
            ),
            suppressor: DuplicateSuppressor::default(),
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of frames processed so far.
    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Live tracks in ascending id order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn observations(&self) -> &ObservationBuffer {
        &self.observations
    }

    pub fn snapshot(&self) -> Vec<TrackSnapshot> {
        self.tracks.values().map(TrackSnapshot::from).collect()
    }

    /// Process the next frame's detections.
    ///
    /// Detections are assumed valid (see [`Detection::validate`]). Never fails:
    /// ambiguous cases degrade to "no match".
    pub fn update(&mut self, detections: &[Detection]) -> FrameResult {
        self.frame_id += 1;
        let frame_id = self.frame_id;
        let mut assignments = vec![Assignment::Unassigned; detections.len()];

        if detections.is_empty() {
            self.mark_missed_except(&BTreeSet::new(), frame_id);
            self.apply_lifecycle(frame_id);
            return self.frame_result(assignments);
        }

        // Indices into `detections` of everything above the activation threshold.
        let active: Vec<usize> = detections
            .iter()
            .enumerate()
            .filter(|(_, d)| d.score >= self.config.activation_threshold)
            .map(|(i, _)| i)
            .collect();
        let boxes: Vec<Rect> = active.iter().map(|&i| detections[i].bbox).collect();
        let scores: Vec<f32> = active.iter().map(|&i| detections[i].score).collect();
        self.observations.push(frame_id, boxes.clone(), scores);

        // Step 1: direct association against active and freshly lost tracks
        let (eligible, track_boxes): (Vec<TrackId>, Vec<Rect>) = self
            .tracks
            .values()
            .filter(|t| is_associable(t, frame_id))
            .map(|t| (t.id(), t.bbox()))
            .unzip();
        let ious = iou_batch(&boxes, &track_boxes);

        let AssignmentResult {
            matches,
            unmatched_rows,
            ..
        } = matching::greedy_assignment(&ious, self.config.matching_threshold);

        // (row in `active`, track) for every track that received an observation
        let mut observed: Vec<(usize, TrackId)> = Vec::with_capacity(active.len());
        let matched_count = matches.len();

        for (row, col) in matches {
            let track_id = eligible[col];
            tracing::trace!(%track_id, det_idx = active[row], iou = ious[[row, col]], "matched");
            if self.observe_track(track_id, &detections[active[row]], frame_id, row) {
                observed.push((row, track_id));
            }
        }

        // Step 2: recovery of lost tracks from what association left over
        let recovered = self.recovery.recover(
            self.tracks.values(),
            &self.observations,
            frame_id,
            &boxes,
            &unmatched_rows,
        );
        let recovered_count = recovered.len();
        let mut unclaimed = unmatched_rows;
        for (track_id, row) in recovered {
            unclaimed.retain(|&r| r != row);
            if self.observe_track(track_id, &detections[active[row]], frame_id, row) {
                observed.push((row, track_id));
            }
        }

        // Step 3: new tentative tracks, ids issued in detection order
        let created_count = unclaimed.len();
        for row in unclaimed {
            let track_id = self.ids.next_id();
            let detection = &detections[active[row]];
            tracing::debug!(%track_id, frame_id, det_idx = active[row], "track created");
            self.tracks.insert(
                track_id,
                Track::new(track_id, detection, frame_id, row, self.config.history_length),
            );
            observed.push((row, track_id));
        }

        // Step 4: lose whatever got nothing, then settle lifecycle
        let updated: BTreeSet<TrackId> = observed.iter().map(|&(_, id)| id).collect();
        self.mark_missed_except(&updated, frame_id);
        self.apply_lifecycle(frame_id);

        // Step 5: per-detection ids, then collapse duplicates
        let candidates: Vec<Candidate> = observed
            .into_iter()
            .filter_map(|(row, track_id)| {
                // Tracks removed by the lifecycle pass this frame get no id.
                let track = self.tracks.get(&track_id)?;
                let detection_index = active[row];
                Some(Candidate {
                    detection_index,
                    track_id,
                    bbox: track.bbox(),
                    score: detections[detection_index].score,
                    age: track.age(),
                })
            })
            .collect();

        let suppressed = self.suppressor.suppress(&candidates);
        for (pos, candidate) in candidates.iter().enumerate() {
            if suppressed.binary_search(&pos).is_err() {
                assignments[candidate.detection_index] = Assignment::Assigned(candidate.track_id);
            }
        }

        tracing::trace!(
            frame_id,
            detections = detections.len(),
            matched = matched_count,
            recovered = recovered_count,
            created = created_count,
            suppressed = suppressed.len(),
            tracks = self.tracks.len(),
            "frame processed"
        );

        self.frame_result(assignments)
    }

    /// Apply a direct or recovered observation. Returns `false` if the id is
    /// not in the table, which can only happen if the table was corrupted.
    fn observe_track(
        &mut self,
        track_id: TrackId,
        detection: &Detection,
        frame_id: u32,
        row: usize,
    ) -> bool {
        let Some(track) = self.tracks.get_mut(&track_id) else {
            debug_assert!(false, "dangling track id {track_id}");
            return false;
        };
        self.interpolator.fill(track, frame_id);
        track.observe(detection, frame_id, row);
        self.lifecycle.mark_recovered(track);
        true
    }

    fn mark_missed_except(&mut self, updated: &BTreeSet<TrackId>, frame_id: u32) {
        for track in self
            .tracks
            .values_mut()
            .filter(|t| !updated.contains(&t.id()))
        {
            self.lifecycle.mark_missed(track, frame_id);
        }
    }

    fn apply_lifecycle(&mut self, frame_id: u32) {
        let lifecycle = self.lifecycle;
        self.tracks.retain(|_, track| {
            !matches!(
                lifecycle.apply(track, frame_id),
                Some(Transition::Removed(_))
            )
        });
    }

    fn frame_result(&self, assignments: Vec<Assignment>) -> FrameResult {
        FrameResult {
            frame_id: self.frame_id,
            assignments,
            tracks: self.snapshot(),
        }
    }
}

/// Active tracks, plus lost ones inside the association grace period.
fn is_associable(track: &Track, frame_id: u32) -> bool {
    match track.state() {
        TrackState::Tentative | TrackState::Confirmed => true,
        TrackState::Lost => track
            .lost_since_frame()
            .is_some_and(|since| frame_id.saturating_sub(since) < LOST_ASSOCIATION_GRACE),
        TrackState::Removed => false,
    }
}
