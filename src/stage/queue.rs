//! Single-slot queue of stage switch requests.

use std::rc::Rc;

use derivative::Derivative;
use futures::{
    channel::oneshot,
    future::{self, LocalBoxFuture},
    FutureExt as _,
};
use tracerr::Traced;

use crate::{media::MediaFeed, participant::ParticipantId};

use super::{ConfigurationError, ContainerKind, StageError};

/// Result of a stage switch request.
pub type SwitchResult = Result<(), Traced<StageError>>;

/// [`Future`] resolving once a stage switch request is applied or dropped.
///
/// [`Future`]: std::future::Future
pub type SwitchHandle = LocalBoxFuture<'static, SwitchResult>;

/// What a stage switch request asks for.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub enum SwitchRequest {
    /// Put the feed of a participant on the stage.
    Participant {
        /// Participant to put on the stage.
        id: ParticipantId,

        /// Feed of the participant, if it has any.
        #[derivative(Debug = "ignore")]
        feed: Option<Rc<dyn MediaFeed>>,

        /// Requested kind of the stage container.
        kind: ContainerKind,
    },

    /// Show the container of the provided kind, keeping the stage owner.
    Container(ContainerKind),
}

impl SwitchRequest {
    /// Returns [`ContainerKind`] this request was issued for.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Participant { kind, .. } | Self::Container(kind) => *kind,
        }
    }
}

/// [`SwitchRequest`] waiting to be applied along with the sender of its
/// result.
#[derive(Debug)]
pub(super) struct PendingSwitchRequest {
    pub(super) request: SwitchRequest,
    result: oneshot::Sender<SwitchResult>,
}

impl PendingSwitchRequest {
    /// Creates a new [`PendingSwitchRequest`] returning it along with a
    /// [`SwitchHandle`] resolving to its result.
    pub(super) fn new(request: SwitchRequest) -> (Self, SwitchHandle) {
        let (tx, rx) = oneshot::channel();
        let handle = rx
            .map(|res| {
                res.unwrap_or_else(|_| {
                    Err(tracerr::new!(StageError::from(
                        ConfigurationError::Disposed
                    )))
                })
            })
            .boxed_local();
        (
            Self {
                request,
                result: tx,
            },
            handle,
        )
    }

    /// Resolves this request with the provided [`SwitchResult`].
    pub(super) fn resolve(self, result: SwitchResult) {
        // Caller is not interested in the result anymore.
        let _ = self.result.send(result);
    }
}

/// Returns [`SwitchHandle`] which is already resolved with the provided
/// [`SwitchResult`].
pub(super) fn resolved(result: SwitchResult) -> SwitchHandle {
    future::ready(result).boxed_local()
}

/// Queue holding at most one [`PendingSwitchRequest`].
///
/// A newer request always replaces the pending one, which is resolved with
/// [`StageError::Superseded`] at once.
#[derive(Debug, Default)]
pub(super) struct SwitchQueue(Option<PendingSwitchRequest>);

impl SwitchQueue {
    /// Puts the provided [`PendingSwitchRequest`] into this queue,
    /// superseding the one being there.
    pub(super) fn put(&mut self, request: PendingSwitchRequest) {
        if let Some(superseded) = self.0.replace(request) {
            log::debug!("Switch request superseded: {:?}", superseded.request);
            superseded.resolve(Err(tracerr::new!(StageError::Superseded)));
        }
    }

    /// Returns a copy of the pending [`SwitchRequest`], if any.
    pub(super) fn peek(&self) -> Option<SwitchRequest> {
        self.0.as_ref().map(|pending| pending.request.clone())
    }

    /// Takes the pending [`PendingSwitchRequest`] out of this queue.
    pub(super) fn take(&mut self) -> Option<PendingSwitchRequest> {
        self.0.take()
    }

    /// Indicates whether there is no pending request.
    #[cfg(test)]
    pub(super) fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}
