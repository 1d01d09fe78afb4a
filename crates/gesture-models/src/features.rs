//! Per-frame feature vectors built from landmark sets.
//!
//! Two layouts are in use:
//! - `Hands`: left hand xyz followed by right hand xyz (126 values)
//! - `Holistic`: pose xyzv, face xyz, left hand xyz, right hand xyz (1662 values)
//!
//! A landmark group missing from the frame is written as zeros so every
//! vector of a layout has the same length.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::landmarks::{
    HolisticLandmarks, Point3, PosePoint, FACE_LANDMARKS, HAND_LANDMARKS, POSE_LANDMARKS,
};

const HAND_VALUES: usize = HAND_LANDMARKS * 3;
const POSE_VALUES: usize = POSE_LANDMARKS * 4;
const FACE_VALUES: usize = FACE_LANDMARKS * 3;

/// Errors building a feature vector.
#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("{group} has {actual} landmarks, expected {expected}")]
    LandmarkCount {
        group: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown feature layout: {0}")]
    UnknownLayout(String),
}

/// Feature vector for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// All-zero vector, as produced for a frame with no detections.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Which landmark groups make up a feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureLayout {
    /// Both hands only.
    Hands,
    /// Pose, face and both hands.
    Holistic,
}

impl FeatureLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureLayout::Hands => "hands",
            FeatureLayout::Holistic => "holistic",
        }
    }

    /// Number of values per frame.
    pub fn len(&self) -> usize {
        match self {
            FeatureLayout::Hands => 2 * HAND_VALUES,
            FeatureLayout::Holistic => POSE_VALUES + FACE_VALUES + 2 * HAND_VALUES,
        }
    }

    /// Returns true if the layout needs face landmarks.
    pub fn uses_face(&self) -> bool {
        matches!(self, FeatureLayout::Holistic)
    }

    /// Flatten the landmarks of one frame into a feature vector.
    pub fn extract(&self, landmarks: &HolisticLandmarks) -> Result<FeatureVector, FeatureError> {
        let mut values = Vec::with_capacity(self.len());

        if *self == FeatureLayout::Holistic {
            push_pose(&mut values, landmarks.pose_landmarks.as_deref())?;
            push_points(
                &mut values,
                "face",
                FACE_LANDMARKS,
                landmarks.face_landmarks.as_deref(),
            )?;
        }
        push_points(
            &mut values,
            "left hand",
            HAND_LANDMARKS,
            landmarks.left_hand_landmarks.as_deref(),
        )?;
        push_points(
            &mut values,
            "right hand",
            HAND_LANDMARKS,
            landmarks.right_hand_landmarks.as_deref(),
        )?;

        debug_assert_eq!(values.len(), self.len());
        Ok(FeatureVector(values))
    }
}

fn push_pose(values: &mut Vec<f32>, points: Option<&[PosePoint]>) -> Result<(), FeatureError> {
    match points {
        Some(points) => {
            check_count("pose", POSE_LANDMARKS, points.len())?;
            values.extend(points.iter().flatten());
        }
        None => values.extend(std::iter::repeat(0.0).take(POSE_VALUES)),
    }
    Ok(())
}

fn push_points(
    values: &mut Vec<f32>,
    group: &'static str,
    expected: usize,
    points: Option<&[Point3]>,
) -> Result<(), FeatureError> {
    match points {
        Some(points) => {
            check_count(group, expected, points.len())?;
            values.extend(points.iter().flatten());
        }
        None => values.extend(std::iter::repeat(0.0).take(expected * 3)),
    }
    Ok(())
}

fn check_count(group: &'static str, expected: usize, actual: usize) -> Result<(), FeatureError> {
    if actual != expected {
        return Err(FeatureError::LandmarkCount {
            group,
            expected,
            actual,
        });
    }
    Ok(())
}

impl fmt::Display for FeatureLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FeatureLayout {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hands" => Ok(FeatureLayout::Hands),
            "holistic" => Ok(FeatureLayout::Holistic),
            _ => Err(FeatureError::UnknownLayout(s.to_string())),
        }
    }
}
