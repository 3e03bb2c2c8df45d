//! Enlarged stage view showing a single participant at a time.
//!
//! [`LargeStageController`] owns a fixed pool of mutually exclusive
//! [`StageContainer`]s and serializes all the switches between them through
//! a single-slot queue: an in-flight transition always runs to completion,
//! while a newer request replaces the pending one.

mod container;
mod overlays;
mod queue;

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use derive_more::{Display, From};
use futures::{
    future::LocalBoxFuture, stream::LocalBoxStream, FutureExt as _,
};
use medea_reactive::ObservableCell;
use tracerr::Traced;

use crate::{
    events::{EventBus, StageEvent},
    media::{ConnectionStatus, ConnectionStatusProvider, MediaFeed},
    participant::{ParticipantDirectory, ParticipantId},
    platform::{Executor, TaskHandle},
    utils::Named,
};

use self::{
    container::ContainerPool,
    queue::{PendingSwitchRequest, SwitchQueue},
};

#[doc(inline)]
pub use self::{
    container::{ContainerKind, StageContainer},
    overlays::{ConnectionBanner, OverlayInputs, Overlays},
    queue::{SwitchHandle, SwitchRequest, SwitchResult},
};

/// Misconfiguration of a [`LargeStageController`].
///
/// Is a programming error, never expected at runtime.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum ConfigurationError {
    /// Some container is registered under this [`ContainerKind`] already.
    #[display(fmt = "Container of `{}` kind is registered already", _0)]
    DuplicateContainer(ContainerKind),

    /// No container is registered under this [`ContainerKind`].
    #[display(fmt = "No container of `{}` kind is registered", _0)]
    MissingContainer(ContainerKind),

    /// Container of this [`ContainerKind`] is the active one.
    #[display(fmt = "Active container of `{}` kind cannot be removed", _0)]
    ActiveContainerRemoval(ContainerKind),

    /// [`LargeStageController`] is disposed.
    #[display(fmt = "Stage is disposed")]
    Disposed,
}

impl Named for ConfigurationError {
    fn name(&self) -> &'static str {
        match self {
            Self::DuplicateContainer(_) => "DuplicateContainer",
            Self::MissingContainer(_) => "MissingContainer",
            Self::ActiveContainerRemoval(_) => "ActiveContainerRemoval",
            Self::Disposed => "Disposed",
        }
    }
}

/// Errors of switching the stage.
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
pub enum StageError {
    /// [`LargeStageController`] is misconfigured or disposed.
    #[display(fmt = "{}", _0)]
    Configuration(ConfigurationError),

    /// Request has been replaced by a newer one before it was applied.
    ///
    /// Callers should ignore it, since the newer request will resolve.
    #[display(fmt = "Switch request has been superseded by a newer one")]
    #[from(ignore)]
    Superseded,
}

impl Named for StageError {
    fn name(&self) -> &'static str {
        match self {
            Self::Configuration(e) => e.name(),
            Self::Superseded => "Superseded",
        }
    }
}

/// State of the [`LargeStageController`]'s switching.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum TransitionState {
    /// No switch is running.
    Idle,

    /// Some switch is running.
    Transitioning,
}

/// Immutable state of the stage the view layer projects.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StageSnapshot {
    /// Kind of the visible container.
    pub active: ContainerKind,

    /// Owner of the visible container.
    pub owner: Option<ParticipantId>,

    /// Stage owner whose video has been actually rendered since it took the
    /// stage.
    pub rendered_owner: Option<ParticipantId>,

    /// Display name of the owner.
    pub owner_display_name: Option<String>,

    /// Avatar of the owner.
    pub owner_avatar: Option<String>,

    /// [`TransitionState`] at the moment of taking this snapshot.
    pub transition: TransitionState,

    /// [`Overlays`] drawn over the visible container.
    pub overlays: Overlays,

    /// Width of the stage.
    pub width: u32,

    /// Height of the stage.
    pub height: u32,
}

/// Collaborators of a [`LargeStageController`].
pub struct StageContext {
    /// [`Executor`] the transitions are driven by.
    pub executor: Executor,

    /// ID of the local participant.
    pub local_id: ParticipantId,

    /// Source of participants' [`ConnectionStatus`]es.
    pub connection_statuses: Rc<dyn ConnectionStatusProvider>,

    /// Directory of participants' names and avatars.
    pub directory: Rc<dyn ParticipantDirectory>,

    /// [`EventBus`] to publish [`StageEvent`]s into.
    pub events: Rc<EventBus>,
}

/// Participant along with the feed it's put on the stage with.
type Occupant = (ParticipantId, Option<Rc<dyn MediaFeed>>);

/// Controller of the enlarged stage.
///
/// Exactly one [`StageContainer`] is visible at any observable instant, and
/// the recorded stage owner always matches the rendered container.
pub struct LargeStageController(Rc<Inner>);

struct Inner {
    ctx: StageContext,

    pool: RefCell<ContainerPool>,

    queue: RefCell<SwitchQueue>,

    transition: ObservableCell<TransitionState>,

    /// [`ContainerKind`] the stage ends on once all the queued requests are
    /// applied.
    intent: Cell<ContainerKind>,

    /// Feed of the active container's owner.
    owner_feed: RefCell<Option<Rc<dyn MediaFeed>>>,

    /// Participant of the in-flight switch request.
    applying: RefCell<Option<Occupant>>,

    /// Stage owner whose video has been actually rendered on the stage.
    rendered_owner: RefCell<Option<ParticipantId>>,

    audio_only: Cell<bool>,

    local_interrupted: Cell<bool>,

    size: Cell<(u32, u32)>,

    resolution: Cell<Option<(u32, u32)>>,

    snapshot: ObservableCell<StageSnapshot>,

    driver: RefCell<Option<TaskHandle>>,

    disposed: Cell<bool>,
}

impl LargeStageController {
    /// Creates a new [`LargeStageController`] with the provided
    /// [`ContainerKind::Camera`] container being initially active.
    ///
    /// The provided container is expected to be visible already.
    pub fn new(ctx: StageContext, camera: Rc<dyn StageContainer>) -> Self {
        let snapshot = StageSnapshot {
            active: ContainerKind::Camera,
            owner: None,
            rendered_owner: None,
            owner_display_name: None,
            owner_avatar: None,
            transition: TransitionState::Idle,
            overlays: Overlays::derive(OverlayInputs {
                active: ContainerKind::Camera,
                owner: None,
                owner_is_local: false,
                owner_status: ConnectionStatus::Active,
                audio_only: false,
                local_interrupted: false,
            }),
            width: 0,
            height: 0,
        };
        Self(Rc::new(Inner {
            ctx,
            pool: RefCell::new(ContainerPool::new(camera)),
            queue: RefCell::new(SwitchQueue::default()),
            transition: ObservableCell::new(TransitionState::Idle),
            intent: Cell::new(ContainerKind::Camera),
            owner_feed: RefCell::new(None),
            applying: RefCell::new(None),
            rendered_owner: RefCell::new(None),
            audio_only: Cell::new(false),
            local_interrupted: Cell::new(false),
            size: Cell::new((0, 0)),
            resolution: Cell::new(None),
            snapshot: ObservableCell::new(snapshot),
            driver: RefCell::new(None),
            disposed: Cell::new(false),
        }))
    }

    /// Registers the provided [`StageContainer`] under the provided
    /// [`ContainerKind`], fitting it into the current stage size.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::DuplicateContainer`] if some container is
    /// registered under this [`ContainerKind`] already.
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn register_container(
        &self,
        kind: ContainerKind,
        container: Rc<dyn StageContainer>,
    ) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        self.0
            .pool
            .borrow_mut()
            .register(kind, Rc::clone(&container))
            .map_err(tracerr::wrap!())?;
        let (width, height) = self.0.size.get();
        container.resize(width, height, false);
        Ok(())
    }

    /// Unregisters the [`StageContainer`] of the provided [`ContainerKind`].
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::MissingContainer`] if nothing is registered
    /// under this [`ContainerKind`].
    ///
    /// With [`ConfigurationError::ActiveContainerRemoval`] if this
    /// [`ContainerKind`] is the active one.
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn remove_container(
        &self,
        kind: ContainerKind,
    ) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        self.0
            .pool
            .borrow_mut()
            .remove(kind)
            .map(drop)
            .map_err(tracerr::wrap!())
    }

    /// Requests the feed of the provided participant to be put on the stage.
    ///
    /// If the participant owns the stage already, its feed is swapped in
    /// place, without hiding the container.
    ///
    /// Returned [`SwitchHandle`] resolves with [`StageError::Superseded`] if
    /// a newer request replaces this one before it's applied.
    pub fn update_large_video(
        &self,
        id: ParticipantId,
        feed: Option<Rc<dyn MediaFeed>>,
        kind: ContainerKind,
    ) -> SwitchHandle {
        if let Err(e) = self
            .0
            .ensure_alive()
            .map_err(tracerr::map_from_and_wrap!(=> StageError))
        {
            return queue::resolved(Err(e));
        }
        Inner::enqueue(&self.0, SwitchRequest::Participant { id, feed, kind })
    }

    /// Requests the container of the provided [`ContainerKind`] to be shown.
    ///
    /// A video [`ContainerKind`] is replaced with the
    /// [`ContainerKind::Placeholder`] if the stage owner's video cannot be
    /// rendered. Resolves at once if the stage ends on the resulting
    /// [`ContainerKind`] already.
    pub fn show_container(&self, kind: ContainerKind) -> SwitchHandle {
        if let Err(e) = self
            .0
            .ensure_alive()
            .map_err(tracerr::map_from_and_wrap!(=> StageError))
        {
            return queue::resolved(Err(e));
        }
        let shown = self.0.resolve_shown(self.0.destination().as_ref(), kind);
        if self.0.intent.get() == shown {
            log::debug!("`{}` stage container is requested already", shown);
            return queue::resolved(Ok(()));
        }
        Inner::enqueue(&self.0, SwitchRequest::Container(kind))
    }

    /// Updates the stage size, resizing every registered container regardless
    /// of its visibility.
    ///
    /// `None` keeps the current value of the dimension.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn resize(
        &self,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        let (current_width, current_height) = self.0.size.get();
        let width = width.unwrap_or(current_width);
        let height = height.unwrap_or(current_height);
        self.0.size.set((width, height));
        self.0.resize_containers(false);
        self.0.refresh();
        Ok(())
    }

    /// Records a new resolution of the video on the stage.
    ///
    /// Publishes [`StageEvent::ResolutionChanged`] if the resolution has been
    /// changed, and refits all the containers if its aspect ratio has been
    /// changed.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn on_video_resolution_update(
        &self,
        width: u32,
        height: u32,
    ) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        let prev = self.0.resolution.replace(Some((width, height)));
        if prev == Some((width, height)) {
            return Ok(());
        }
        self.0
            .ctx
            .events
            .publish(StageEvent::ResolutionChanged { width, height });

        let aspect_changed = prev.map_or(true, |(w, h)| {
            u64::from(w) * u64::from(height) != u64::from(width) * u64::from(h)
        });
        if aspect_changed {
            log::debug!(
                "Stage video aspect ratio changed: {}x{}",
                width,
                height,
            );
            self.0.resize_containers(false);
        }
        Ok(())
    }

    /// Notifies the active container that the mouse entered the stage.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn on_hover_in(&self) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        let container = self.0.pool.borrow().active_container();
        if let Some(container) = container {
            container.on_hover_in();
        }
        Ok(())
    }

    /// Notifies the active container that the mouse left the stage.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn on_hover_out(&self) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        let container = self.0.pool.borrow().active_container();
        if let Some(container) = container {
            container.on_hover_out();
        }
        Ok(())
    }

    /// Switches the audio-only mode, which suppresses video on the stage
    /// since the next transition.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn set_audio_only(
        &self,
        audio_only: bool,
    ) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        self.0.audio_only.set(audio_only);
        self.0.refresh();
        Ok(())
    }

    /// Indicates whether the audio-only mode is active.
    #[inline]
    pub fn is_audio_only(&self) -> bool {
        self.0.audio_only.get()
    }

    /// Shows the interrupted local connection message, overriding the remote
    /// connection banners.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn on_video_interrupted(
        &self,
    ) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        self.0.local_interrupted.set(true);
        self.0.refresh();
        Ok(())
    }

    /// Hides the interrupted local connection message.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn on_video_restored(&self) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        self.0.local_interrupted.set(false);
        self.0.refresh();
        Ok(())
    }

    /// Recomputes the [`Overlays`] after the stage owner's connectivity has
    /// been changed.
    ///
    /// Does nothing while a transition is running, since its end recomputes
    /// them anyway.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::Disposed`] if this [`LargeStageController`]
    /// is disposed.
    pub fn refresh_overlays(&self) -> Result<(), Traced<ConfigurationError>> {
        self.0.ensure_alive().map_err(tracerr::wrap!())?;
        self.0.refresh();
        Ok(())
    }

    /// Returns owner of the active container.
    pub fn current_participant(&self) -> Option<ParticipantId> {
        self.0.pool.borrow().active_owner().cloned()
    }

    /// Returns participant the stage ends on once all the requested switches
    /// are done.
    pub fn target_participant(&self) -> Option<ParticipantId> {
        self.0.destination().map(|(id, _)| id)
    }

    /// Returns [`ContainerKind`] of the active container.
    pub fn active_container(&self) -> ContainerKind {
        self.0.pool.borrow().active()
    }

    /// Returns the current [`TransitionState`].
    #[inline]
    pub fn transition_state(&self) -> TransitionState {
        self.0.transition.get()
    }

    /// Returns [`Future`] resolving once no transition is running.
    ///
    /// [`Future`]: std::future::Future
    pub fn when_idle(&self) -> LocalBoxFuture<'static, ()> {
        self.0
            .transition
            .when_eq(TransitionState::Idle)
            .map(drop)
            .boxed_local()
    }

    /// Returns the latest [`StageSnapshot`].
    #[inline]
    pub fn snapshot(&self) -> StageSnapshot {
        self.0.snapshot.get()
    }

    /// Returns [`LocalBoxStream`] of [`StageSnapshot`]s, starting with the
    /// latest one.
    #[inline]
    pub fn on_snapshot(&self) -> LocalBoxStream<'static, StageSnapshot> {
        self.0.snapshot.subscribe()
    }

    /// Tears down all the containers.
    ///
    /// Pending and in-flight requests resolve with
    /// [`ConfigurationError::Disposed`], as does every further call.
    pub fn dispose(&self) {
        if self.0.disposed.replace(true) {
            return;
        }
        log::debug!("Disposing stage");

        let pending = self.0.queue.borrow_mut().take();
        if let Some(pending) = pending {
            pending.resolve(Err(tracerr::new!(StageError::from(
                ConfigurationError::Disposed
            ))));
        }
        drop(self.0.driver.borrow_mut().take());
        self.0.applying.replace(None);
        self.0.pool.borrow_mut().dispose();
        self.0.transition.set(TransitionState::Idle);
    }
}

impl Inner {
    /// Returns [`ConfigurationError::Disposed`] if the stage is disposed.
    fn ensure_alive(&self) -> Result<(), Traced<ConfigurationError>> {
        if self.disposed.get() {
            Err(tracerr::new!(ConfigurationError::Disposed))
        } else {
            Ok(())
        }
    }

    /// Puts the provided [`SwitchRequest`] into the queue, spawning the
    /// transitions driver if none is running.
    fn enqueue(this: &Rc<Self>, request: SwitchRequest) -> SwitchHandle {
        let kind = request.kind();
        let (pending, handle) = PendingSwitchRequest::new(request);
        this.queue.borrow_mut().put(pending);
        this.intent
            .set(this.resolve_shown(this.destination().as_ref(), kind));

        if this.transition.get() == TransitionState::Idle {
            this.transition.set(TransitionState::Transitioning);
            let driver =
                this.ctx.executor.spawn(Self::drive(Rc::downgrade(this)));
            this.driver.replace(Some(driver));
        }
        handle
    }

    /// Applies queued requests one by one until the queue is empty.
    ///
    /// Leaving of the active container starts before the pending request is
    /// taken, so a request arriving meanwhile still supersedes it.
    async fn drive(weak_this: Weak<Self>) {
        while let Some(this) = weak_this.upgrade() {
            let next = this.queue.borrow().peek();
            let request = match next {
                Some(request) => request,
                None => {
                    this.settle();
                    break;
                }
            };
            if this.must_leave(&request) {
                this.leave_active().await;
            }

            let pending = this.queue.borrow_mut().take();
            if let Some(pending) = pending {
                if let SwitchRequest::Participant { id, feed, .. } =
                    &pending.request
                {
                    this.applying.replace(Some((id.clone(), feed.clone())));
                }
                let result = this.apply(&pending.request).await;
                this.applying.replace(None);
                if let Err(e) = &result {
                    log::error!("Failed to switch stage: {}", e);
                }
                pending.resolve(result);
            }
        }
    }

    /// Marks the end of all the queued transitions.
    fn settle(&self) {
        let active = self.pool.borrow().active();
        self.intent.set(active);
        self.transition.set(TransitionState::Idle);
        self.publish_snapshot(false);
        log::debug!("Stage settled on `{}` container", active);
    }

    /// Decides which [`ContainerKind`] the feed of the provided participant
    /// should be shown in.
    fn resolve_kind(
        &self,
        id: &ParticipantId,
        feed: Option<&dyn MediaFeed>,
        kind: ContainerKind,
    ) -> ContainerKind {
        if kind.is_video()
            && (self.audio_only.get() || !self.is_renderable(id, feed))
        {
            ContainerKind::Placeholder
        } else {
            kind
        }
    }

    /// Decides which [`ContainerKind`] is shown for the provided one while the
    /// provided [`Occupant`] owns the stage.
    fn resolve_shown(
        &self,
        occupant: Option<&Occupant>,
        kind: ContainerKind,
    ) -> ContainerKind {
        match occupant {
            Some((id, feed)) => self.resolve_kind(id, feed.as_deref(), kind),
            None => kind,
        }
    }

    /// Returns the owner of the active container along with its feed.
    fn active_occupant(&self) -> Option<Occupant> {
        let owner = self.pool.borrow().active_owner().cloned();
        owner.map(|id| (id, self.owner_feed.borrow().clone()))
    }

    /// Returns the participant the stage ends on once all the queued
    /// requests are applied, along with its feed.
    fn destination(&self) -> Option<Occupant> {
        let pending = self.queue.borrow().peek();
        if let Some(SwitchRequest::Participant { id, feed, .. }) = pending {
            return Some((id, feed));
        }
        let applying = self.applying.borrow().clone();
        applying.or_else(|| self.active_occupant())
    }

    /// Indicates whether the video of the provided participant can be
    /// rendered on the stage.
    ///
    /// Once rendered, the video stays renderable while the participant owns
    /// the stage, regardless of its connectivity.
    fn is_renderable(
        &self,
        id: &ParticipantId,
        feed: Option<&dyn MediaFeed>,
    ) -> bool {
        let has_video = feed.map_or(false, |feed| !feed.is_muted());
        has_video
            && (*id == self.ctx.local_id
                || self.ctx.connection_statuses.status_of(id)
                    == ConnectionStatus::Active
                || self.rendered_owner.borrow().as_ref() == Some(id))
    }

    /// Indicates whether applying the provided [`SwitchRequest`] requires
    /// hiding the active container.
    fn must_leave(&self, request: &SwitchRequest) -> bool {
        let pool = self.pool.borrow();
        if !pool.is_active_visible() {
            return false;
        }
        match request {
            SwitchRequest::Participant { id, feed, kind } => {
                let target = self.resolve_kind(id, feed.as_deref(), *kind);
                pool.contains(target)
                    && !(pool.active_owner() == Some(id)
                        && pool.shares_active(target))
            }
            SwitchRequest::Container(kind) => {
                let owner = pool.active_owner().cloned();
                let occupant =
                    owner.map(|id| (id, self.owner_feed.borrow().clone()));
                let target = self.resolve_shown(occupant.as_ref(), *kind);
                target != pool.active() && pool.contains(target)
            }
        }
    }

    /// Hides the active container, hiding the overlays over it beforehand.
    async fn leave_active(&self) {
        let (kind, container) = {
            let pool = self.pool.borrow();
            (pool.active(), pool.active_container())
        };
        let container = match container {
            Some(container) => container,
            None => return,
        };
        if kind.carries_overlays() {
            self.publish_snapshot(true);
        }
        log::debug!("Hiding `{}` stage container", kind);
        container.hide().await;
        self.pool.borrow_mut().mark_active_hidden();
    }

    /// Shows the active container again if it has been left for a container
    /// which turned out to be missing.
    async fn restore_active(&self) {
        let (visible, container) = {
            let pool = self.pool.borrow();
            (pool.is_active_visible(), pool.active_container())
        };
        if visible {
            return;
        }
        if let Some(container) = container {
            container.show().await;
            let mut pool = self.pool.borrow_mut();
            let (active, owner) = (pool.active(), pool.active_owner().cloned());
            pool.activate(active, owner);
        }
    }

    /// Applies the provided [`SwitchRequest`].
    async fn apply(&self, request: &SwitchRequest) -> SwitchResult {
        match request {
            SwitchRequest::Participant { id, feed, kind } => {
                self.apply_participant(id, feed.clone(), *kind).await
            }
            SwitchRequest::Container(kind) => self.apply_container(*kind).await,
        }
    }

    /// Puts the feed of the provided participant on the stage.
    async fn apply_participant(
        &self,
        id: &ParticipantId,
        feed: Option<Rc<dyn MediaFeed>>,
        kind: ContainerKind,
    ) -> SwitchResult {
        let target = self.resolve_kind(id, feed.as_deref(), kind);
        let container = self
            .pool
            .borrow()
            .get(target)
            .map_err(tracerr::map_from_and_wrap!(=> StageError));
        let container = match container {
            Ok(container) => container,
            Err(e) => {
                self.restore_active().await;
                return Err(e);
            }
        };

        let (same_owner, in_place) = {
            let pool = self.pool.borrow();
            let same_owner = pool.active_owner() == Some(id);
            let in_place = same_owner
                && pool.is_active_visible()
                && pool.shares_active(target);
            (same_owner, in_place)
        };
        let feed_of_owner = feed.clone();
        if in_place {
            log::debug!("Swapping feed of `{}` in place", id);
            container.set_feed(Some(id), feed);
        } else {
            if self.pool.borrow().is_active_visible() {
                self.leave_active().await;
            }
            if !same_owner {
                self.rendered_owner.replace(None);
            }
            container.set_feed(Some(id), feed);
            log::debug!("Showing `{}` stage container for `{}`", target, id);
            container.show().await;
        }

        self.pool.borrow_mut().activate(target, Some(id.clone()));
        self.owner_feed.replace(feed_of_owner);
        if target.is_video() {
            self.rendered_owner.replace(Some(id.clone()));
        }
        self.publish_snapshot(false);
        self.ctx
            .events
            .publish(StageEvent::LargeVideoIdChanged(Some(id.clone())));
        Ok(())
    }

    /// Shows the container of the provided [`ContainerKind`], keeping the
    /// stage owner.
    ///
    /// A video [`ContainerKind`] falls back to the
    /// [`ContainerKind::Placeholder`] if the owner's video cannot be rendered.
    async fn apply_container(&self, requested: ContainerKind) -> SwitchResult {
        let occupant = self.active_occupant();
        let kind = self.resolve_shown(occupant.as_ref(), requested);
        let container = self
            .pool
            .borrow()
            .get(kind)
            .map_err(tracerr::map_from_and_wrap!(=> StageError));
        let container = match container {
            Ok(container) => container,
            Err(e) => {
                self.restore_active().await;
                return Err(e);
            }
        };

        let (active, visible, owner) = {
            let pool = self.pool.borrow();
            (
                pool.active(),
                pool.is_active_visible(),
                pool.active_owner().cloned(),
            )
        };
        if kind == active && visible {
            return Ok(());
        }
        if visible {
            self.leave_active().await;
        }
        if kind.carries_overlays() {
            if let Some((id, feed)) = occupant {
                container.set_feed(Some(&id), feed);
            }
        }
        log::debug!("Showing `{}` stage container", kind);
        container.show().await;

        if kind.is_video() {
            self.rendered_owner.replace(owner.clone());
        }
        self.pool.borrow_mut().activate(kind, owner);
        self.publish_snapshot(false);
        Ok(())
    }

    /// Fits every registered container into the current stage size.
    fn resize_containers(&self, animate: bool) {
        let (width, height) = self.size.get();
        let containers = self.pool.borrow().containers();
        for container in containers {
            container.resize(width, height, animate);
        }
    }

    /// Publishes a fresh [`StageSnapshot`] unless a transition is running.
    fn refresh(&self) {
        if self.transition.get() == TransitionState::Idle {
            self.publish_snapshot(false);
        }
    }

    /// Publishes a fresh [`StageSnapshot`], optionally with all the
    /// [`Overlays`] hidden.
    fn publish_snapshot(&self, hide_overlays: bool) {
        let (active, owner) = {
            let pool = self.pool.borrow();
            (pool.active(), pool.active_owner().cloned())
        };
        let overlays = if hide_overlays {
            Overlays::hidden()
        } else {
            Overlays::derive(OverlayInputs {
                active,
                owner: owner.as_ref(),
                owner_is_local: owner.as_ref() == Some(&self.ctx.local_id),
                owner_status: owner.as_ref().map_or(
                    ConnectionStatus::Active,
                    |id| self.ctx.connection_statuses.status_of(id),
                ),
                audio_only: self.audio_only.get(),
                local_interrupted: self.local_interrupted.get(),
            })
        };
        let (width, height) = self.size.get();
        let directory = &self.ctx.directory;
        self.snapshot.set(StageSnapshot {
            active,
            rendered_owner: self.rendered_owner.borrow().clone(),
            owner_display_name: owner
                .as_ref()
                .and_then(|id| directory.display_name_of(id)),
            owner_avatar: owner.as_ref().and_then(|id| directory.avatar_of(id)),
            owner,
            transition: self.transition.get(),
            overlays,
            width,
            height,
        });
    }
}
