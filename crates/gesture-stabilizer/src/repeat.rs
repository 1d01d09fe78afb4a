//! Repeat suppression for consecutive confident labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of confirmations needed to re-emit the same label.
pub const DEFAULT_REPEAT_LIMIT: u32 = 3;

/// How repeated labels are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Every confident label is emitted.
    #[default]
    Off,
    /// A label equal to the previously emitted one is dropped.
    Distinct,
    /// A label equal to the previous one is held until it has been seen
    /// `limit` more times.
    Counted { limit: u32 },
}

impl RepeatPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatPolicy::Off => "off",
            RepeatPolicy::Distinct => "distinct",
            RepeatPolicy::Counted { .. } => "counted",
        }
    }
}

impl fmt::Display for RepeatPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatPolicy::Counted { limit } => write!(f, "counted({limit})"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl FromStr for RepeatPolicy {
    type Err = ConfigError;

    /// Parses `off`, `distinct`, `counted` or `counted:<limit>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let (name, limit) = match lower.split_once(':') {
            Some((name, limit)) => (name, Some(limit)),
            None => (lower.as_str(), None),
        };

        match (name, limit) {
            ("off" | "none", None) => Ok(RepeatPolicy::Off),
            ("distinct", None) => Ok(RepeatPolicy::Distinct),
            ("counted", None) => Ok(RepeatPolicy::Counted {
                limit: DEFAULT_REPEAT_LIMIT,
            }),
            ("counted", Some(limit)) => limit
                .trim()
                .parse()
                .map(|limit| RepeatPolicy::Counted { limit })
                .map_err(|_| ConfigError::UnknownRepeatPolicy(s.to_string())),
            _ => Err(ConfigError::UnknownRepeatPolicy(s.to_string())),
        }
    }
}

/// What to do with a confident candidate label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatVerdict {
    /// Emit the label now.
    Emit,
    /// Same label as before; keep collecting confirmations.
    Hold { repeat_count: u32 },
    /// Same label as before; drop it.
    Drop,
}

/// Last emitted label and how many times it has repeated since.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionState {
    pub last_label: Option<String>,
    pub repeat_count: u32,
}

/// Applies a [`RepeatPolicy`] across consecutive candidates.
#[derive(Debug, Clone)]
pub struct RepeatSuppressor {
    policy: RepeatPolicy,
    state: PredictionState,
}

impl RepeatSuppressor {
    pub fn new(policy: RepeatPolicy) -> Self {
        Self {
            policy,
            state: PredictionState::default(),
        }
    }

    pub fn policy(&self) -> RepeatPolicy {
        self.policy
    }

    pub fn state(&self) -> &PredictionState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = PredictionState::default();
    }

    /// Judge a confident candidate and update the state.
    pub fn judge(&mut self, candidate: &str) -> RepeatVerdict {
        let is_repeat = self.state.last_label.as_deref() == Some(candidate);

        match self.policy {
            RepeatPolicy::Off => {
                self.remember(candidate);
                RepeatVerdict::Emit
            }
            RepeatPolicy::Distinct => {
                if is_repeat {
                    RepeatVerdict::Drop
                } else {
                    self.remember(candidate);
                    RepeatVerdict::Emit
                }
            }
            RepeatPolicy::Counted { limit } => {
                if is_repeat {
                    self.state.repeat_count += 1;
                    if self.state.repeat_count < limit {
                        return RepeatVerdict::Hold {
                            repeat_count: self.state.repeat_count,
                        };
                    }
                }
                self.remember(candidate);
                RepeatVerdict::Emit
            }
        }
    }

    fn remember(&mut self, label: &str) {
        self.state.last_label = Some(label.to_string());
        self.state.repeat_count = 0;
    }
}
