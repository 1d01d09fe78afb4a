//! Default stabilizer settings for each endpoint.

use gesture_models::Endpoint;

use crate::accumulator::WindowMode;
use crate::repeat::{RepeatPolicy, DEFAULT_REPEAT_LIMIT};
use crate::stabilizer::StabilizerConfig;

/// Settings the endpoint's model was tuned with.
pub fn default_config(endpoint: Endpoint) -> StabilizerConfig {
    match endpoint {
        Endpoint::Predict => StabilizerConfig::new(
            5,
            WindowMode::Sliding,
            0.80,
            RepeatPolicy::Counted {
                limit: DEFAULT_REPEAT_LIMIT,
            },
        ),
        Endpoint::DetectSection => {
            StabilizerConfig::new(30, WindowMode::Sliding, 0.90, RepeatPolicy::Distinct)
        }
        Endpoint::DetectFood => {
            StabilizerConfig::new(30, WindowMode::Sliding, 0.75, RepeatPolicy::Off)
        }
        Endpoint::DetectEmotion => {
            StabilizerConfig::new(3, WindowMode::Sliding, 0.98, RepeatPolicy::Off)
        }
    }
}
