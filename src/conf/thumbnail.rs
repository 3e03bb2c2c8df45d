//! Thumbnails settings.

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Thumbnails settings.
#[derive(Clone, Debug, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct Thumbnail {
    /// Whether the connection indicator is never shown. Defaults to `false`.
    #[default(false)]
    pub connection_indicator_disabled: bool,

    /// Whether the connection indicator is shown on hover only. Defaults to
    /// `true`.
    #[default(true)]
    pub connection_indicator_auto_hide: bool,

    /// Whether the dominant speaker indicator is never shown. Defaults to
    /// `false`.
    #[default(false)]
    pub dominant_speaker_indicator_disabled: bool,

    /// Whether the moderator indicator is never shown. Defaults to `false`.
    #[default(false)]
    pub moderator_indicator_disabled: bool,

    /// Whether only the filmstrip is shown, disabling connection stats.
    /// Defaults to `false`.
    #[default(false)]
    pub film_strip_only: bool,
}
