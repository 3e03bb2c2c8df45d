//! Per-participant thumbnails.
//!
//! Each [`ThumbnailPresenter`] holds the [`ThumbnailState`] of a single
//! participant and derives a [`DisplayMode`] from it with a pure function.
//! Changes of the conference-wide state (stage owner, pin, layout,
//! audio-only mode) are picked up by watchers, so no central broadcast of the
//! correct state is needed.

mod display_mode;
mod indicators;
mod variant;
mod watchers;

use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use derivative::Derivative;
use derive_more::Display;
use futures::stream::LocalBoxStream;
use log::Level;
use medea_reactive::ObservableCell;
use tracerr::Traced;

use crate::{
    conference::{Layout, SessionContext},
    media::{ConnectionStatus, FeedKind, MediaFeed, MediaKind},
    participant::ParticipantId,
    platform::Executor,
    utils::{self, Named},
};

#[doc(inline)]
pub use self::{
    display_mode::{select_display_mode, DisplayInputs, DisplayMode},
    indicators::{
        ConnectionIndicator, IndicatorInputs, Indicators, TooltipPosition,
    },
    variant::{
        Camera, DisplayNameProps, SharedContent, ThumbnailKind,
        ThumbnailVariant,
    },
};

/// Component of a [`ThumbnailPresenter`].
type Component = utils::Component<State, SessionContext>;

/// Errors of [`ThumbnailPresenter`] operations.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ThumbnailError {
    /// Operation is called before the participant ID is assigned.
    ///
    /// Is a non-fatal no-op, reported as a warning only.
    #[display(fmt = "`{}` is called before participant ID is assigned", _0)]
    PrecondVoid(&'static str),
}

impl Named for ThumbnailError {
    #[inline]
    fn name(&self) -> &'static str {
        match self {
            Self::PrecondVoid(_) => "PrecondVoid",
        }
    }

    #[inline]
    fn level(&self) -> Level {
        Level::Warn
    }
}

/// Fields of a thumbnail its [`DisplayMode`] is derived from.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ThumbnailState {
    /// Whether the participant's audio is muted.
    pub is_audio_muted: bool,

    /// Whether the participant's video is muted.
    pub is_video_muted: bool,

    /// Whether the thumbnail is hovered.
    pub is_hovered: bool,

    /// Whether the popover of the thumbnail is hovered.
    pub is_popover_hovered: bool,

    /// [`ConnectionStatus`] of the participant.
    pub connection_status: ConnectionStatus,

    /// Whether the participant is the dominant speaker.
    pub is_dominant_speaker: bool,

    /// Whether the participant raised its hand.
    pub is_raised_hand: bool,

    /// Whether the participant is a moderator.
    pub is_moderator: bool,

    /// Kind of the participant's video.
    pub video_type: FeedKind,

    /// Whether the participant owns the stage.
    pub is_on_stage: bool,

    /// Whether the participant's video has been actually rendered on the
    /// stage since it became the stage owner.
    pub was_ever_rendered_on_stage: bool,

    /// Participant's video feed.
    #[derivative(Debug = "ignore")]
    pub feed: Option<Rc<dyn MediaFeed>>,

    /// Whether the feed is attached to a rendered video element.
    pub is_video_element_attached: bool,

    /// Whether the connection indicator has been removed.
    pub is_connection_indicator_removed: bool,

    /// Whether recomputations are suspended.
    pub is_update_view_disabled: bool,
}

impl ThumbnailState {
    fn new(variant: ThumbnailVariant) -> Self {
        Self {
            is_audio_muted: false,
            is_video_muted: variant.starts_video_muted(),
            is_hovered: false,
            is_popover_hovered: false,
            connection_status: ConnectionStatus::Active,
            is_dominant_speaker: false,
            is_raised_hand: false,
            is_moderator: false,
            video_type: FeedKind::Camera,
            is_on_stage: false,
            was_ever_rendered_on_stage: false,
            feed: None,
            is_video_element_attached: false,
            is_connection_indicator_removed: false,
            is_update_view_disabled: false,
        }
    }

    /// Indicates whether the participant has a feed which is muted neither by
    /// the participant nor by the feed itself.
    #[must_use]
    pub fn is_video_playable(&self) -> bool {
        !self.is_video_muted
            && self.feed.as_ref().map_or(false, |feed| !feed.is_muted())
    }

    /// Indicates whether the thumbnail or its popover is hovered.
    #[inline]
    #[must_use]
    pub fn is_hovered(&self) -> bool {
        self.is_hovered || self.is_popover_hovered
    }
}

/// Immutable state of a thumbnail the view layer projects.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ThumbnailSnapshot {
    /// ID of the participant, if it's assigned.
    pub id: Option<ParticipantId>,

    /// ID of the container rendering the thumbnail.
    pub container_id: Option<String>,

    /// Rendered display name.
    pub display_name: Option<DisplayNameProps>,

    /// Avatar source.
    pub avatar: Option<String>,

    /// Whether device availability icons are shown.
    pub device_icons: bool,

    /// What the thumbnail renders.
    pub display_mode: DisplayMode,

    /// Indicators drawn over the thumbnail.
    pub indicators: Indicators,

    /// Kind of the participant's video.
    pub video_type: FeedKind,

    /// Whether the participant owns the stage.
    pub is_on_stage: bool,

    /// Whether the participant's video has been rendered on the stage.
    pub was_ever_rendered_on_stage: bool,
}

/// State of a [`ThumbnailPresenter`]'s component.
pub struct State {
    /// Conference-wide state the watchers follow.
    session: Rc<SessionContext>,
    id: RefCell<Option<ParticipantId>>,
    variant: ThumbnailVariant,
    fields: RefCell<ThumbnailState>,
    display_mode: ObservableCell<DisplayMode>,
    snapshot: ObservableCell<ThumbnailSnapshot>,
}

impl State {
    fn new(
        id: Option<ParticipantId>,
        variant: ThumbnailVariant,
        ctx: &Rc<SessionContext>,
    ) -> Self {
        let mut fields = ThumbnailState::new(variant);
        let snapshot = derive_snapshot(id.as_ref(), variant, &mut fields, ctx);
        Self {
            session: Rc::clone(ctx),
            id: RefCell::new(id),
            variant,
            fields: RefCell::new(fields),
            display_mode: ObservableCell::new(snapshot.display_mode),
            snapshot: ObservableCell::new(snapshot),
        }
    }

    /// Returns the participant ID, failing with
    /// [`ThumbnailError::PrecondVoid`] if it's not assigned yet.
    fn ensure_id(
        &self,
        op: &'static str,
    ) -> Result<ParticipantId, Traced<ThumbnailError>> {
        self.id
            .borrow()
            .clone()
            .ok_or_else(|| tracerr::new!(ThumbnailError::PrecondVoid(op)))
    }

    /// Recomputes the [`ThumbnailSnapshot`], unless recomputations are
    /// suspended.
    ///
    /// Publishes nothing if nothing has been changed.
    fn recompute(&self, ctx: &SessionContext) {
        if self.fields.borrow().is_update_view_disabled {
            return;
        }
        let snapshot = derive_snapshot(
            self.id.borrow().as_ref(),
            self.variant,
            &mut self.fields.borrow_mut(),
            ctx,
        );
        let mode = snapshot.display_mode;
        if self.display_mode.replace(mode) != mode {
            log::trace!(
                "Thumbnail of {:?} switched to {} mode",
                snapshot.id,
                mode,
            );
        }
        self.snapshot.set(snapshot);
    }

    /// Recomputes the [`ThumbnailSnapshot`].
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    fn update_view(
        &self,
        ctx: &SessionContext,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.ensure_id("update_view").map_err(tracerr::wrap!())?;
        self.recompute(ctx);
        Ok(())
    }
}

/// Derives [`ThumbnailSnapshot`] of the provided [`ThumbnailState`], updating
/// its stage related fields.
fn derive_snapshot(
    id: Option<&ParticipantId>,
    variant: ThumbnailVariant,
    fields: &mut ThumbnailState,
    ctx: &SessionContext,
) -> ThumbnailSnapshot {
    let layout = ctx.layout.get();
    let audio_only = ctx.audio_only.get();
    let is_on_stage = id.map_or(false, |id| {
        ctx.stage_owner.borrow().as_ref() == Some(id)
    });
    let pinned =
        id.map_or(false, |id| ctx.pinned.borrow().as_ref() == Some(id));

    fields.is_on_stage = is_on_stage;
    fields.was_ever_rendered_on_stage = is_on_stage
        && id.map_or(false, |id| {
            ctx.rendered_on_stage.borrow().as_ref() == Some(id)
        });

    let display_mode = select_display_mode(DisplayInputs {
        is_on_stage,
        tile_view: layout == Layout::TileView,
        video_playable: fields.is_video_playable(),
        has_rendered_element: fields.is_video_element_attached,
        audio_only,
        hovered: fields.is_hovered(),
    });
    let indicators = Indicators::derive(IndicatorInputs {
        conf: &ctx.conf,
        layout,
        audio_muted: fields.is_audio_muted,
        video_muted: fields.is_video_muted,
        moderator: fields.is_moderator,
        connection_status: fields.connection_status,
        connection_indicator_removed: fields.is_connection_indicator_removed,
        hovered: fields.is_hovered(),
        raised_hand: fields.is_raised_hand,
        dominant_speaker: fields.is_dominant_speaker,
        pinned,
    });
    let directory = ctx.directory.as_ref();

    ThumbnailSnapshot {
        id: id.cloned(),
        container_id: id.map(|id| variant.container_id(id)),
        display_name: id.map(|id| variant.display_name(id, directory)),
        avatar: id.and_then(|id| variant.avatar(id, directory)),
        device_icons: variant.device_icons(),
        display_mode,
        indicators,
        video_type: fields.video_type,
        is_on_stage,
        was_ever_rendered_on_stage: fields.was_ever_rendered_on_stage,
    }
}

/// Presenter of a participant's thumbnail.
///
/// Every mutator recomputes the [`DisplayMode`] synchronously. Recomputation
/// is idempotent: unchanged inputs publish nothing.
pub struct ThumbnailPresenter(Component);

impl ThumbnailPresenter {
    /// Creates a new [`ThumbnailPresenter`] and spawns its watchers onto the
    /// provided [`Executor`].
    pub fn new(
        id: Option<ParticipantId>,
        variant: ThumbnailVariant,
        ctx: Rc<SessionContext>,
        executor: Executor,
    ) -> Self {
        let state = Rc::new(State::new(id, variant, &ctx));
        Self(Component::new(state, ctx, executor))
    }

    /// Returns the participant ID, if it's assigned.
    #[inline]
    pub fn id(&self) -> Option<ParticipantId> {
        self.0.state().id.borrow().clone()
    }

    /// Assigns the participant ID.
    pub fn set_id(&self, id: ParticipantId) {
        self.0.state().id.replace(Some(id));
        self.0.state().recompute(&self.0.ctx());
    }

    /// Returns [`ThumbnailVariant`] of this thumbnail.
    #[inline]
    pub fn variant(&self) -> ThumbnailVariant {
        self.0.state().variant
    }

    /// Returns the current [`ThumbnailState`].
    #[inline]
    pub fn state(&self) -> Ref<'_, ThumbnailState> {
        self.0.state().fields.borrow()
    }

    /// Returns the participant's feed.
    #[inline]
    pub fn feed(&self) -> Option<Rc<dyn MediaFeed>> {
        self.0.state().fields.borrow().feed.clone()
    }

    /// Returns the current [`DisplayMode`].
    #[inline]
    pub fn display_mode(&self) -> DisplayMode {
        self.0.state().display_mode.get()
    }

    /// Returns [`LocalBoxStream`] of [`DisplayMode`] changes, starting with
    /// the current one.
    #[inline]
    pub fn on_display_mode(&self) -> LocalBoxStream<'static, DisplayMode> {
        self.0.state().display_mode.subscribe()
    }

    /// Returns the latest [`ThumbnailSnapshot`].
    #[inline]
    pub fn snapshot(&self) -> ThumbnailSnapshot {
        self.0.state().snapshot.get()
    }

    /// Returns [`LocalBoxStream`] of [`ThumbnailSnapshot`]s, starting with
    /// the latest one.
    #[inline]
    pub fn on_snapshot(&self) -> LocalBoxStream<'static, ThumbnailSnapshot> {
        self.0.state().snapshot.subscribe()
    }

    /// Indicates whether this participant is the pinned one.
    pub fn is_pinned(&self) -> bool {
        let id = self.0.state().id.borrow();
        id.is_some() && *self.0.ctx().pinned.borrow() == *id
    }

    /// Sets whether the media of the provided [`MediaKind`] is muted.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_muted(
        &self,
        kind: MediaKind,
        muted: bool,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_muted", |fields| match kind {
            MediaKind::Audio => fields.is_audio_muted = muted,
            MediaKind::Video => fields.is_video_muted = muted,
        })
    }

    /// Sets [`ConnectionStatus`] of the participant.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_connection_status(
        &self,
        status: ConnectionStatus,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_connection_status", |fields| {
            fields.connection_status = status;
        })
    }

    /// Sets whether the thumbnail is hovered.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_hover(
        &self,
        hovered: bool,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_hover", |fields| fields.is_hovered = hovered)
    }

    /// Sets whether the popover of the thumbnail is hovered.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_popover_hover(
        &self,
        hovered: bool,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_popover_hover", |fields| {
            fields.is_popover_hovered = hovered;
        })
    }

    /// Sets whether the participant is the dominant speaker.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_dominant_speaker(
        &self,
        dominant: bool,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_dominant_speaker", |fields| {
            fields.is_dominant_speaker = dominant;
        })
    }

    /// Sets whether the participant raised its hand.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_raised_hand(
        &self,
        raised: bool,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_raised_hand", |fields| fields.is_raised_hand = raised)
    }

    /// Sets whether the participant is a moderator.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_moderator(
        &self,
        moderator: bool,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_moderator", |fields| fields.is_moderator = moderator)
    }

    /// Sets the participant's feed, taking the video type from it.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_feed(
        &self,
        feed: Option<Rc<dyn MediaFeed>>,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_feed", |fields| {
            if let Some(feed) = &feed {
                fields.video_type = feed.kind();
            }
            fields.feed = feed;
        })
    }

    /// Sets whether the feed is attached to a rendered video element.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_video_element_attached(
        &self,
        attached: bool,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_video_element_attached", |fields| {
            fields.is_video_element_attached = attached;
        })
    }

    /// Sets kind of the participant's video.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_video_type(
        &self,
        kind: FeedKind,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_video_type", |fields| fields.video_type = kind)
    }

    /// Removes the connection indicator for good.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn remove_connection_indicator(
        &self,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("remove_connection_indicator", |fields| {
            fields.is_connection_indicator_removed = true;
        })
    }

    /// Suspends or resumes recomputations, recomputing on resume.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn set_update_view_disabled(
        &self,
        disabled: bool,
    ) -> Result<(), Traced<ThumbnailError>> {
        self.mutate("set_update_view_disabled", |fields| {
            fields.is_update_view_disabled = disabled;
        })
    }

    /// Recomputes the [`DisplayMode`], e.g. after the feed reported its mute
    /// state change.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn update_view(&self) -> Result<(), Traced<ThumbnailError>> {
        self.0
            .state()
            .update_view(&self.0.ctx())
            .map_err(tracerr::wrap!())
    }

    /// Pins this participant, or clears the pin if it's pinned already.
    ///
    /// # Errors
    ///
    /// With [`ThumbnailError::PrecondVoid`] if the participant ID is not
    /// assigned yet.
    pub fn toggle_pin(&self) -> Result<(), Traced<ThumbnailError>> {
        let state = self.0.state();
        let id = state.ensure_id("toggle_pin").map_err(tracerr::wrap!())?;
        let ctx = self.0.ctx();
        ctx.toggle_pin(&id);
        state.recompute(&ctx);
        Ok(())
    }

    /// Applies the provided mutation to the [`ThumbnailState`] and recomputes
    /// the [`DisplayMode`].
    fn mutate<F>(
        &self,
        op: &'static str,
        f: F,
    ) -> Result<(), Traced<ThumbnailError>>
    where
        F: FnOnce(&mut ThumbnailState),
    {
        let state = self.0.state();
        state.ensure_id(op).map_err(tracerr::wrap!())?;
        f(&mut state.fields.borrow_mut());
        state.recompute(&self.0.ctx());
        Ok(())
    }
}
