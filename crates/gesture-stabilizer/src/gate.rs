//! Confidence gate over a classifier's probability distribution.

use crate::error::GateError;

/// Result of gating one distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Top label cleared the threshold.
    Confident { label: String, confidence: f32 },
    /// Top probability did not clear the threshold. `raw_confidence` is kept
    /// for logging only; callers report 0.0.
    Rejected { raw_confidence: f32 },
}

impl GateDecision {
    /// Label if confident.
    pub fn label(&self) -> Option<&str> {
        match self {
            GateDecision::Confident { label, .. } => Some(label),
            GateDecision::Rejected { .. } => None,
        }
    }

    /// Reported confidence: the probability when confident, otherwise 0.0.
    pub fn confidence(&self) -> f32 {
        match self {
            GateDecision::Confident { confidence, .. } => *confidence,
            GateDecision::Rejected { .. } => 0.0,
        }
    }
}

/// Argmax plus threshold over a fixed label set.
#[derive(Debug, Clone)]
pub struct ClassificationGate {
    labels: Vec<String>,
    threshold: f32,
}

impl ClassificationGate {
    pub fn new<I, S>(labels: I, threshold: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            threshold,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Pick the most probable label. The probability must be strictly
    /// greater than the threshold to pass.
    pub fn decide(&self, probabilities: &[f32]) -> Result<GateDecision, GateError> {
        if probabilities.is_empty() {
            return Err(GateError::EmptyDistribution);
        }
        if probabilities.len() != self.labels.len() {
            return Err(GateError::LabelMismatch {
                expected: self.labels.len(),
                actual: probabilities.len(),
            });
        }

        let (index, confidence) = argmax(probabilities).ok_or(GateError::NonFinite)?;

        if confidence > self.threshold {
            Ok(GateDecision::Confident {
                label: self.labels[index].clone(),
                confidence,
            })
        } else {
            Ok(GateDecision::Rejected {
                raw_confidence: confidence,
            })
        }
    }
}

/// Index and value of the largest finite element; first wins on ties.
fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .fold(None, |best, (i, v)| match best {
            Some((_, best_v)) if best_v >= v => best,
            _ => Some((i, v)),
        })
}
