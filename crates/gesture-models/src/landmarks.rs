//! Holistic landmark sets as returned by the body-tracking service.

use serde::{Deserialize, Serialize};

/// Number of pose landmarks produced by the holistic tracker.
pub const POSE_LANDMARKS: usize = 33;
/// Number of face mesh landmarks produced by the holistic tracker.
pub const FACE_LANDMARKS: usize = 468;
/// Number of landmarks per hand.
pub const HAND_LANDMARKS: usize = 21;

/// Pose landmark: normalized x, y, z and visibility.
pub type PosePoint = [f32; 4];

/// Face or hand landmark: normalized x, y, z.
pub type Point3 = [f32; 3];

/// Landmarks detected in a single frame.
///
/// Each group is `None` when the tracker did not find it in the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolisticLandmarks {
    #[serde(default)]
    pub pose_landmarks: Option<Vec<PosePoint>>,
    #[serde(default)]
    pub face_landmarks: Option<Vec<Point3>>,
    #[serde(default)]
    pub left_hand_landmarks: Option<Vec<Point3>>,
    #[serde(default)]
    pub right_hand_landmarks: Option<Vec<Point3>>,
}

impl HolisticLandmarks {
    /// Returns true if at least one hand was detected.
    pub fn has_hands(&self) -> bool {
        self.left_hand_landmarks.is_some() || self.right_hand_landmarks.is_some()
    }

    /// Returns true if nothing was detected at all.
    pub fn is_empty(&self) -> bool {
        self.pose_landmarks.is_none()
            && self.face_landmarks.is_none()
            && !self.has_hands()
    }
}
