//! Status indicators drawn over a thumbnail.

use derive_more::Display;

use crate::{conf, conference::Layout, media::ConnectionStatus};

/// Side the indicators' tooltips pop up at.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum TooltipPosition {
    /// Above the indicator.
    #[display(fmt = "top")]
    Top,

    /// To the left of the indicator.
    #[display(fmt = "left")]
    Left,

    /// To the right of the indicator.
    #[display(fmt = "right")]
    Right,
}

impl From<Layout> for TooltipPosition {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::TileView => Self::Right,
            Layout::VerticalFilmstrip => Self::Left,
            Layout::HorizontalFilmstrip => Self::Top,
        }
    }
}

/// Connection quality indicator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConnectionIndicator {
    /// [`ConnectionStatus`] of the participant.
    pub status: ConnectionStatus,

    /// Whether the indicator is shown even without hover.
    pub always_visible: bool,

    /// Whether connection stats can be opened from the indicator.
    pub stats_enabled: bool,
}

/// Indicators drawn over a thumbnail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Indicators {
    /// Whether the audio is muted.
    pub audio_muted: bool,

    /// Whether the video is muted.
    pub video_muted: bool,

    /// Whether the moderator star is shown.
    pub moderator: bool,

    /// [`ConnectionIndicator`], if it's shown at all.
    pub connection: Option<ConnectionIndicator>,

    /// Whether the raised hand is shown.
    pub raised_hand: bool,

    /// Whether the dominant speaker indicator is shown.
    pub dominant_speaker: bool,

    /// [`TooltipPosition`] of all the indicators.
    pub tooltip_position: TooltipPosition,

    /// Whether the thumbnail is focused, being pinned.
    pub focused: bool,
}

/// Inputs [`Indicators`] are derived from.
#[derive(Clone, Copy, Debug)]
pub struct IndicatorInputs<'a> {
    /// Thumbnails settings.
    pub conf: &'a conf::Thumbnail,

    /// Current [`Layout`].
    pub layout: Layout,

    /// Whether the audio is muted.
    pub audio_muted: bool,

    /// Whether the video is muted.
    pub video_muted: bool,

    /// Whether the participant is a moderator.
    pub moderator: bool,

    /// [`ConnectionStatus`] of the participant.
    pub connection_status: ConnectionStatus,

    /// Whether the connection indicator has been removed.
    pub connection_indicator_removed: bool,

    /// Whether the thumbnail is hovered.
    pub hovered: bool,

    /// Whether the participant raised its hand.
    pub raised_hand: bool,

    /// Whether the participant is the dominant speaker.
    pub dominant_speaker: bool,

    /// Whether the participant is pinned.
    pub pinned: bool,
}

impl Indicators {
    /// Derives [`Indicators`] from the provided [`IndicatorInputs`].
    #[must_use]
    pub fn derive(inputs: IndicatorInputs<'_>) -> Self {
        let conf = inputs.conf;
        let connection = if conf.connection_indicator_disabled
            || inputs.connection_indicator_removed
        {
            None
        } else {
            Some(ConnectionIndicator {
                status: inputs.connection_status,
                always_visible: inputs.hovered
                    || !conf.connection_indicator_auto_hide,
                stats_enabled: !conf.film_strip_only,
            })
        };
        Self {
            audio_muted: inputs.audio_muted,
            video_muted: inputs.video_muted,
            moderator: inputs.moderator && !conf.moderator_indicator_disabled,
            connection,
            raised_hand: inputs.raised_hand,
            dominant_speaker: inputs.dominant_speaker
                && !conf.dominant_speaker_indicator_disabled,
            tooltip_position: inputs.layout.into(),
            focused: inputs.pinned,
        }
    }
}
