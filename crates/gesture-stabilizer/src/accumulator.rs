//! Bounded sequence buffer of per-frame feature vectors.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use gesture_models::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the buffer behaves once it holds `capacity` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// Fill to capacity, classify once, then start over from empty.
    Fixed,
    /// Keep the most recent `capacity` frames, evicting the oldest.
    #[default]
    Sliding,
}

impl WindowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowMode::Fixed => "fixed",
            WindowMode::Sliding => "sliding",
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WindowMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" | "reset" => Ok(WindowMode::Fixed),
            "sliding" | "rolling" => Ok(WindowMode::Sliding),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// Buffer state after a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStatus {
    pub len: usize,
    pub capacity: usize,
    /// True when the buffer holds exactly `capacity` frames.
    pub ready: bool,
}

/// Rolling buffer holding the most recent frames in chronological order.
#[derive(Debug, Clone)]
pub struct SequenceAccumulator {
    frames: VecDeque<FeatureVector>,
    capacity: usize,
    mode: WindowMode,
}

impl SequenceAccumulator {
    /// Create an empty buffer. A zero capacity is treated as one.
    pub fn new(capacity: usize, mode: WindowMode) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity + 1),
            capacity,
            mode,
        }
    }

    /// Append a frame and report whether the window is ready.
    pub fn push(&mut self, vector: FeatureVector) -> BufferStatus {
        match self.mode {
            WindowMode::Fixed => {
                // A full window that was not cleared after classification
                // starts a fresh one.
                if self.frames.len() >= self.capacity {
                    self.frames.clear();
                }
                self.frames.push_back(vector);
            }
            WindowMode::Sliding => {
                self.frames.push_back(vector);
                while self.frames.len() > self.capacity {
                    self.frames.pop_front();
                }
            }
        }
        self.status()
    }

    pub fn status(&self) -> BufferStatus {
        BufferStatus {
            len: self.frames.len(),
            capacity: self.capacity,
            ready: self.is_ready(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.frames.len() == self.capacity
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

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Frames from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureVector> {
        self.frames.iter()
    }

    /// Frames flattened row-major, oldest first: `[frames * features]`.
    pub fn flatten(&self) -> Vec<f32> {
        let width = self.frames.front().map(|f| f.len()).unwrap_or(0);
        let mut out = Vec::with_capacity(self.frames.len() * width);
        for frame in &self.frames {
            out.extend_from_slice(frame.as_slice());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: f32) -> FeatureVector {
        FeatureVector::new(vec![tag, tag])
    }

    #[test]
    fn test_fixed_ready_once_per_window() {
        let mut buffer = SequenceAccumulator::new(3, WindowMode::Fixed);
        let ready: Vec<bool> = (0..9).map(|i| buffer.push(frame(i as f32)).ready).collect();

        assert_eq!(
            ready,
            vec![false, false, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn test_fixed_restart_keeps_new_frame() {
        let mut buffer = SequenceAccumulator::new(2, WindowMode::Fixed);
        buffer.push(frame(1.0));
        buffer.push(frame(2.0));
        let status = buffer.push(frame(3.0));

        assert_eq!(status.len, 1);
        assert_eq!(buffer.flatten(), vec![3.0, 3.0]);
    }

    #[test]
    fn test_sliding_evicts_oldest_first() {
        let mut buffer = SequenceAccumulator::new(3, WindowMode::Sliding);
        for i in 0..10 {
            let status = buffer.push(frame(i as f32));
            assert!(status.len <= 3);
            assert_eq!(status.ready, i >= 2);
        }

        let tags: Vec<f32> = buffer.iter().map(|f| f.as_slice()[0]).collect();
        assert_eq!(tags, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_twenty_nine_of_thirty_not_ready() {
        let mut buffer = SequenceAccumulator::new(30, WindowMode::Sliding);
        for i in 0..29 {
            assert!(!buffer.push(frame(i as f32)).ready);
        }
        let status = buffer.push(frame(29.0));
        assert!(status.ready);
        assert_eq!(status.len, 30);
    }

    #[test]
    fn test_flatten_is_row_major() {
        let mut buffer = SequenceAccumulator::new(2, WindowMode::Sliding);
        buffer.push(FeatureVector::new(vec![1.0, 2.0]));
        buffer.push(FeatureVector::new(vec![3.0, 4.0]));
        assert_eq!(buffer.flatten(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("fixed".parse::<WindowMode>().unwrap(), WindowMode::Fixed);
        assert_eq!("SLIDING".parse::<WindowMode>().unwrap(), WindowMode::Sliding);
        assert!("ring".parse::<WindowMode>().is_err());
    }
}
