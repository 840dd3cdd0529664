//! Rolling window of recent frames' raw detections.

use std::collections::VecDeque;

use crate::tracker::rect::Rect;

/// Detections kept for one frame, after activation-threshold filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameObservations {
    pub frame_id: u32,
    pub boxes: Vec<Rect>,
    pub scores: Vec<f32>,
}

/// Bounded FIFO of per-frame observations.
///
/// Only recovery reads it: a lost track is compared against the box it was
/// last *observed* with, looked up here by `(frame, index)`.
#[derive(Debug, Clone)]
pub struct ObservationBuffer {
    frames: VecDeque<FrameObservations>,
    capacity: usize,
}

impl ObservationBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a frame, evicting the oldest one when full.
    pub fn push(&mut self, frame_id: u32, boxes: Vec<Rect>, scores: Vec<f32>) {
        debug_assert_eq!(boxes.len(), scores.len());
        if self.capacity == 0 {
            return;
        }
        while self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(FrameObservations {
            frame_id,
            boxes,
            scores,
        });
    }

    pub fn frame(&self, frame_id: u32) -> Option<&FrameObservations> {
        // Frames are pushed in increasing order, so a binary search is valid.
        self.frames
            .binary_search_by_key(&frame_id, |f| f.frame_id)
            .ok()
            .map(|idx| &self.frames[idx])
    }

    /// Box of detection `index` in frame `frame_id`, if still buffered.
    pub fn observation(&self, frame_id: u32, index: usize) -> Option<Rect> {
        self.frame(frame_id)
            .and_then(|f| f.boxes.get(index))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameObservations> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
