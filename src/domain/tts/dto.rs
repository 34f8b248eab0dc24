use serde::{Deserialize, Serialize};

/// Speed bounds accepted by every provider we talk to
pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 4.0;

/// One provider call: a single chunk of text with the job's voice settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    pub speed: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

/// Audio container produced by a provider.
///
/// Both containers support lossless stream-copy concatenation and are
/// directly playable by the messaging transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioContainer {
    OggOpus,
    Mp3,
}

impl AudioContainer {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioContainer::OggOpus => "ogg",
            AudioContainer::Mp3 => "mp3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioContainer::OggOpus => "audio/ogg",
            AudioContainer::Mp3 => "audio/mpeg",
        }
    }
}

/// Synthesized audio for one chunk, tagged with the chunk index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    pub index: usize,
    pub bytes: Vec<u8>,
}

/// Final playable artifact handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub bytes: Vec<u8>,
    pub container: AudioContainer,
}
