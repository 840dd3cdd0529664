use serde::{Deserialize, Serialize};

/// Track state enumeration for object tracking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackState {
    /// Newly created track, not yet seen for `min_track_length` frames
    #[default]
    Tentative,
    /// Established identity, matched on the most recent frame
    Confirmed,
    /// Missed at least one frame, still eligible for recovery
    Lost,
    /// Purged from the track set; the id is never issued again
    Removed,
}

impl TrackState {
    pub fn is_lost(self) -> bool {
        self == TrackState::Lost
    }
}
