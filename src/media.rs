//! Media feeds of participants and their connectivity.

use derive_more::Display;

use crate::participant::ParticipantId;

/// Kind of a media track.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum MediaKind {
    /// Audio track.
    Audio,

    /// Video track.
    Video,
}

/// Source a video feed is captured from.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum FeedKind {
    /// Feed captured from a camera.
    Camera,

    /// Feed captured from a display.
    Screen,
}

/// Handle to a participant's video feed which is rendered by the view layer.
#[cfg_attr(any(test, feature = "mockable"), mockall::automock)]
pub trait MediaFeed {
    /// Indicates whether the feed itself reports being muted.
    fn is_muted(&self) -> bool;

    /// Returns [`FeedKind`] of this feed.
    fn kind(&self) -> FeedKind;
}

/// Connectivity of a participant as reported by the conference bridge.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ConnectionStatus {
    /// Media is flowing.
    Active,

    /// Participant's connection is lost, media stopped flowing.
    Interrupted,

    /// Participant's video is suspended by the bridge, usually because of
    /// the low bandwidth.
    Inactive,
}

impl Default for ConnectionStatus {
    #[inline]
    fn default() -> Self {
        Self::Active
    }
}

/// Source of per-participant [`ConnectionStatus`]es.
#[cfg_attr(any(test, feature = "mockable"), mockall::automock)]
pub trait ConnectionStatusProvider {
    /// Returns the current [`ConnectionStatus`] of the participant with the
    /// provided [`ParticipantId`].
    fn status_of(&self, participant: &ParticipantId) -> ConnectionStatus;
}
