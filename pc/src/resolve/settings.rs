//! Resolution settings and aspect-ratio suffixes

use serde::{Deserialize, Serialize};

/// Appended for square output
pub const SQUARE_SUFFIX: &str = "Output the final image in a square 1:1 aspect ratio.";

/// Appended for widescreen output. The generator only produces square images,
/// so 16:9 is simulated with black letterbox bars inside the square frame.
pub const LETTERBOX_SUFFIX: &str = "Output the final image as a square 1:1 image with the scene composed as a 16:9 widescreen frame centered vertically, and fill the areas above and below it with solid black bars to simulate a 16:9 aspect ratio.";

/// Requested output aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// No aspect instruction
    #[default]
    #[serde(rename = "none")]
    None,
    /// Square output
    #[serde(rename = "1:1")]
    Square,
    /// Square output letterboxed to look 16:9
    #[serde(rename = "16:9")]
    Widescreen,
}

impl AspectRatio {
    /// Fixed sentence appended to the prompt, if any
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Square => Some(SQUARE_SUFFIX),
            Self::Widescreen => Some(LETTERBOX_SUFFIX),
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Square => write!(f, "1:1"),
            Self::Widescreen => write!(f, "16:9"),
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "1:1" | "square" => Ok(Self::Square),
            "16:9" | "widescreen" => Ok(Self::Widescreen),
            other => Err(format!("unknown aspect ratio '{}' (expected none, 1:1 or 16:9)", other)),
        }
    }
}

/// User settings that shape every resolved prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveSettings {
    /// Append the master prompt to every preset
    pub master_prompt_enabled: bool,
    /// Text appended when enabled
    pub master_prompt_text: String,
    /// Aspect-ratio instruction
    pub aspect_ratio: AspectRatio,
}

impl ResolveSettings {
    /// Master prompt text if enabled and non-blank
    pub fn master_prompt(&self) -> Option<&str> {
        if self.master_prompt_enabled && !self.master_prompt_text.trim().is_empty() {
            Some(&self.master_prompt_text)
        } else {
            None
        }
    }
}
