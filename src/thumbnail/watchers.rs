//! Watchers of the conference-wide state a thumbnail depends on.

use std::rc::Rc;

use futures::StreamExt as _;
use medea_macro::watchers;
use tracerr::Traced;

use crate::{
    conference::{Layout, SessionContext},
    participant::ParticipantId,
};

use super::{Component, State, ThumbnailError};

#[watchers]
impl Component {
    /// Recomputes the thumbnail when the stage owner changes.
    #[watch(self.session.stage_owner.subscribe().skip(1))]
    async fn stage_owner_changed(
        ctx: Rc<SessionContext>,
        state: Rc<State>,
        _: Option<ParticipantId>,
    ) -> Result<(), Traced<ThumbnailError>> {
        state.recompute(&ctx);
        Ok(())
    }

    /// Recomputes the thumbnail once the video on the stage is actually
    /// rendered, or is forgotten.
    #[watch(self.session.rendered_on_stage.subscribe().skip(1))]
    async fn rendered_on_stage_changed(
        ctx: Rc<SessionContext>,
        state: Rc<State>,
        _: Option<ParticipantId>,
    ) -> Result<(), Traced<ThumbnailError>> {
        state.recompute(&ctx);
        Ok(())
    }

    /// Recomputes the thumbnail when some participant is pinned or unpinned.
    #[watch(self.session.pinned.subscribe().skip(1))]
    async fn pinned_changed(
        ctx: Rc<SessionContext>,
        state: Rc<State>,
        _: Option<ParticipantId>,
    ) -> Result<(), Traced<ThumbnailError>> {
        state.recompute(&ctx);
        Ok(())
    }

    /// Recomputes the thumbnail for the new [`Layout`], which moves its
    /// tooltips and turns the stage owner into a regular tile.
    #[watch(self.session.layout.subscribe().skip(1))]
    async fn layout_changed(
        ctx: Rc<SessionContext>,
        state: Rc<State>,
        layout: Layout,
    ) -> Result<(), Traced<ThumbnailError>> {
        log::trace!("Thumbnail follows {} layout", layout);
        state.recompute(&ctx);
        Ok(())
    }

    /// Recomputes the thumbnail when the audio-only mode is switched.
    #[watch(self.session.audio_only.subscribe().skip(1))]
    async fn audio_only_changed(
        ctx: Rc<SessionContext>,
        state: Rc<State>,
        _: bool,
    ) -> Result<(), Traced<ThumbnailError>> {
        state.recompute(&ctx);
        Ok(())
    }
}
