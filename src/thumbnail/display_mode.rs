//! Derivation of what a thumbnail renders.

use derive_more::Display;

/// What a thumbnail renders.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum DisplayMode {
    /// Video only.
    Video,

    /// Avatar only.
    AvatarOnly,

    /// Name over a blank block, while the video plays on the stage.
    NameOverVideo,

    /// Video with the display name.
    VideoWithName,

    /// Avatar with the display name.
    AvatarWithName,
}

/// Everything a [`DisplayMode`] is derived from.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DisplayInputs {
    /// Whether the participant owns the stage.
    pub is_on_stage: bool,

    /// Whether the tile view layout is active.
    pub tile_view: bool,

    /// Whether the participant has a feed which is muted neither by the
    /// participant nor by the feed itself.
    pub video_playable: bool,

    /// Whether the feed is attached to a rendered video element.
    pub has_rendered_element: bool,

    /// Whether the audio-only mode is active.
    pub audio_only: bool,

    /// Whether the thumbnail or its popover is hovered.
    pub hovered: bool,
}

/// Selects the [`DisplayMode`] for the provided [`DisplayInputs`].
///
/// The first matching rule wins:
/// 1. the stage owner outside of the tile view renders the name, over the
///    video block if the video plays;
/// 2. a playable rendered video is shown, with the name on hover;
/// 3. otherwise the avatar is shown, with the name on hover.
#[must_use]
pub fn select_display_mode(inputs: DisplayInputs) -> DisplayMode {
    let plays = inputs.video_playable && !inputs.audio_only;
    if inputs.is_on_stage && !inputs.tile_view {
        if plays {
            DisplayMode::NameOverVideo
        } else {
            DisplayMode::AvatarWithName
        }
    } else if plays && inputs.has_rendered_element {
        if inputs.hovered {
            DisplayMode::VideoWithName
        } else {
            DisplayMode::Video
        }
    } else if inputs.hovered {
        DisplayMode::AvatarWithName
    } else {
        DisplayMode::AvatarOnly
    }
}
