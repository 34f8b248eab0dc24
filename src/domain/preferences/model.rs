use crate::domain::tts::{MAX_SPEED, MIN_SPEED};
use serde::{Deserialize, Serialize};

/// Voice settings captured once per job at admission.
///
/// The snapshot travels inside the job envelope, so a preference change made
/// while a job is running never reaches that job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Provider voice id; `None` picks a default from the text language
    pub voice: Option<String>,
    pub speed: f32,
    pub style_instructions: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            voice: None,
            speed: 1.0,
            style_instructions: None,
        }
    }
}

impl Preferences {
    /// Clamp speed into the provider range and drop blank strings
    pub fn normalized(self) -> Self {
        let speed = if self.speed.is_finite() {
            self.speed.clamp(MIN_SPEED, MAX_SPEED)
        } else {
            1.0
        };

        Self {
            voice: non_blank(self.voice),
            speed,
            style_instructions: non_blank(self.style_instructions),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
