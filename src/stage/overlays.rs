//! Ancillary overlays drawn over the stage.

use derive_more::Display;

use crate::{media::ConnectionStatus, participant::ParticipantId};

use super::ContainerKind;

/// Banner describing connectivity problems of the stage owner.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ConnectionBanner {
    /// Owner's connection is interrupted.
    #[display(fmt = "INTERRUPTED")]
    Interrupted,

    /// Owner's video is suspended because of the low bandwidth.
    #[display(fmt = "LOW_BANDWIDTH")]
    LowBandwidth,
}

/// Overlays the view layer draws over the active stage container.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Overlays {
    /// Whether the watermark is shown.
    pub watermark: bool,

    /// Connectivity banner of the remote stage owner.
    pub banner: Option<ConnectionBanner>,

    /// Whether the grey filter marking an interrupted remote feed is shown.
    pub problem_filter: bool,

    /// Whether the message about the interrupted local connection is shown.
    pub local_connection_message: bool,

    /// Whether the grey filter marking the interrupted local connection is
    /// shown.
    pub local_problem_filter: bool,

    /// Participant whose presence label is shown.
    pub presence_label: Option<ParticipantId>,
}

/// Inputs [`Overlays`] are derived from.
#[derive(Clone, Copy, Debug)]
pub struct OverlayInputs<'a> {
    /// Kind of the active container.
    pub active: ContainerKind,

    /// Owner of the stage.
    pub owner: Option<&'a ParticipantId>,

    /// Whether the stage owner is the local participant.
    pub owner_is_local: bool,

    /// [`ConnectionStatus`] of the stage owner.
    pub owner_status: ConnectionStatus,

    /// Whether the audio-only mode is active.
    pub audio_only: bool,

    /// Whether the local connection is interrupted.
    pub local_interrupted: bool,
}

impl Overlays {
    /// Derives [`Overlays`] from the provided [`OverlayInputs`].
    #[must_use]
    pub fn derive(inputs: OverlayInputs<'_>) -> Self {
        let active = inputs.active;
        if !active.carries_overlays() {
            return Self::default();
        }

        let local_connection_message = inputs.local_interrupted;
        let overridden = inputs.audio_only
            || inputs.owner_is_local
            || local_connection_message;

        let banner = if overridden {
            None
        } else {
            match inputs.owner_status {
                ConnectionStatus::Interrupted => {
                    Some(ConnectionBanner::Interrupted)
                }
                ConnectionStatus::Inactive => {
                    Some(ConnectionBanner::LowBandwidth)
                }
                ConnectionStatus::Active => None,
            }
        };

        let presence_label = if banner.is_none()
            && !local_connection_message
            && !inputs.owner_is_local
        {
            inputs.owner.cloned()
        } else {
            None
        };

        Self {
            watermark: true,
            problem_filter: active.is_video()
                && banner == Some(ConnectionBanner::Interrupted),
            banner,
            local_connection_message,
            local_problem_filter: active.is_video()
                && local_connection_message,
            presence_label,
        }
    }

    /// Returns [`Overlays`] with everything hidden.
    #[inline]
    #[must_use]
    pub fn hidden() -> Self {
        Self::default()
    }
}
