mod active_track_set;
mod config;
mod interpolation;
mod lifecycle;
mod matching;
mod observation_buffer;
mod recovery;
mod rect;
mod suppression;
mod track;
mod track_state;

pub use active_track_set::{
    ActiveTrackSet, Assignment, FrameResult, LOST_ASSOCIATION_GRACE, TrackSnapshot,
};
pub use config::TrackerConfig;
pub use interpolation::GapInterpolator;
pub use lifecycle::{LifecycleManager, RemovalReason, TENTATIVE_REMOVAL_AGE, Transition};
pub use matching::{AssignmentResult, Detection, greedy_assignment};
pub use observation_buffer::{FrameObservations, ObservationBuffer};
pub use recovery::{RECOVERY_THRESHOLD_FACTOR, RecoveryEngine};
pub use rect::{Rect, iou_batch};
pub use suppression::{Candidate, DUPLICATE_IOU_THRESHOLD, DuplicateSuppressor};
pub use track::{Track, TrackId, TrackIdGenerator, TrajectoryPoint};
pub use track_state::TrackState;
