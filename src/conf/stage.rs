//! Stage settings.

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Stage settings.
#[derive(Clone, Debug, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct Stage {
    /// Whether the conference starts in the audio-only mode, suppressing all
    /// the video rendering. Defaults to `false`.
    #[default(false)]
    pub start_audio_only: bool,

    /// Whether the conference starts in the tile view layout. Defaults to
    /// `false`.
    #[default(false)]
    pub start_in_tile_view: bool,
}
