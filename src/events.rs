//! Events published and consumed by the core.

use std::{cell::RefCell, rc::Rc};

use derivative::Derivative;
use futures::{
    channel::mpsc,
    stream::{LocalBoxStream, StreamExt as _},
};
use medea_macro::dispatchable;

use crate::{
    media::{ConnectionStatus, MediaFeed, MediaKind},
    participant::ParticipantId,
};

/// Event published by the stage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StageEvent {
    /// Stage owner has been changed (or its feed has been swapped).
    LargeVideoIdChanged(Option<ParticipantId>),

    /// Resolution of the video on the stage has been changed.
    ResolutionChanged {
        /// New width of the video.
        width: u32,

        /// New height of the video.
        height: u32,
    },
}

/// Publish/subscribe primitive delivering [`StageEvent`]s.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: RefCell<Vec<mpsc::UnboundedSender<StageEvent>>>,
}

impl EventBus {
    /// Creates a new [`EventBus`] without subscribers.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns [`LocalBoxStream`] of all the [`StageEvent`]s published after
    /// this call.
    pub fn subscribe(&self) -> LocalBoxStream<'static, StageEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.borrow_mut().push(tx);
        rx.boxed_local()
    }

    /// Delivers the provided [`StageEvent`] to all the subscribers, forgetting
    /// the gone ones.
    pub fn publish(&self, event: StageEvent) {
        log::debug!("Publishing {:?}", event);
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }
}

/// Input from the rest of the application the conference reacts on.
#[dispatchable(self: &Self)]
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub enum InputEvent {
    /// Participant's audio or video has been (un)muted.
    Muted {
        /// Muted participant.
        participant: ParticipantId,

        /// Kind of the (un)muted media.
        kind: MediaKind,

        /// Whether the media is muted now.
        muted: bool,
    },

    /// Mouse entered or left participant's thumbnail.
    Hovered {
        /// Participant of the thumbnail.
        participant: ParticipantId,

        /// Whether the thumbnail is hovered now.
        hovered: bool,
    },

    /// Mouse entered or left the popover of participant's thumbnail.
    PopoverHovered {
        /// Participant of the thumbnail.
        participant: ParticipantId,

        /// Whether the popover is hovered now.
        hovered: bool,
    },

    /// [`ConnectionStatus`] of a participant has been changed.
    ConnectionStatusChanged {
        /// Participant whose connectivity has been changed.
        participant: ParticipantId,

        /// New [`ConnectionStatus`].
        status: ConnectionStatus,
    },

    /// Another participant became the dominant speaker.
    DominantSpeakerChanged {
        /// New dominant speaker.
        participant: ParticipantId,
    },

    /// Participant raised or lowered its hand.
    RaisedHand {
        /// Participant which raised or lowered its hand.
        participant: ParticipantId,

        /// Whether the hand is raised now.
        raised: bool,
    },

    /// Participant gained or lost the moderator role.
    ModeratorChanged {
        /// Participant whose role has been changed.
        participant: ParticipantId,

        /// Whether the participant is a moderator now.
        moderator: bool,
    },

    /// Video feed of a participant has been attached or detached.
    FeedChanged {
        /// Participant whose feed has been changed.
        participant: ParticipantId,

        /// New feed of the participant.
        #[derivative(Debug = "ignore")]
        feed: Option<Rc<dyn MediaFeed>>,
    },

    /// User toggled the pin of a participant.
    PinToggled {
        /// Participant to toggle the pin of.
        participant: ParticipantId,
    },

    /// User clicked participant's thumbnail.
    ThumbnailClicked {
        /// Participant of the clicked thumbnail.
        participant: ParticipantId,
    },
}
