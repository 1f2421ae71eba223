use serde::{Deserialize, Serialize};

use super::RingBuffer;
use crate::sim::Frame;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEntry<T> {
    pub frame: Frame,
    pub data: T,
}

/// A [`RingBuffer`] of per-frame data, looked up by frame number.
///
/// Lookups scan the live entries linearly; that is bounded by the capacity,
/// not by how many frames have elapsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRingBuffer<T> {
    entries: RingBuffer<FrameEntry<T>>,
}

impl<T> FrameRingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RingBuffer::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, frame: Frame) -> Option<usize> {
        self.entries.iter().position(|entry| entry.frame == frame)
    }

    /// Store `data` for `frame`. An existing entry for that frame is overwritten in place.
    pub fn set(&mut self, frame: Frame, data: T) {
        if let Some(entry) = self
            .position(frame)
            .and_then(|index| self.entries.get_mut(index))
        {
            entry.data = data;
            return;
        }
        self.entries.push(FrameEntry { frame, data });
    }

    pub fn get(&self, frame: Frame) -> Option<&T> {
        self.entries
            .iter()
            .find(|entry| entry.frame == frame)
            .map(|entry| &entry.data)
    }

    pub fn get_mut(&mut self, frame: Frame) -> Option<&mut T> {
        let index = self.position(frame)?;
        self.entries.get_mut(index).map(|entry| &mut entry.data)
    }

    pub fn contains(&self, frame: Frame) -> bool {
        self.position(frame).is_some()
    }

    /// Frame of the most recently pushed entry.
    pub fn newest_frame(&self) -> Option<Frame> {
        self.entries.newest().map(|entry| entry.frame)
    }

    pub fn oldest_frame(&self) -> Option<Frame> {
        self.entries.oldest().map(|entry| entry.frame)
    }

    /// Drop entries pushed after the one for `frame`, e.g. predicted frames
    /// invalidated by a rollback. Assumes frames were pushed in ascending order.
    pub fn discard_after(&mut self, frame: Frame) -> usize {
        let mut dropped = 0;
        while self.newest_frame().is_some_and(|newest| newest > frame) {
            self.entries.pop_newest();
            dropped += 1;
        }
        dropped
    }

    pub fn resize(&mut self, new_capacity: usize) {
        self.entries.resize(new_capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &FrameEntry<T>> + '_ {
        self.entries.iter()
    }
}
