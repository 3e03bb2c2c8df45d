//! Conference session wiring the stage and the thumbnails together.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use derive_more::Display;
use futures::StreamExt as _;
use medea_reactive::ObservableCell;
use tracerr::Traced;

use crate::{
    conf::{self, Conf},
    events::{EventBus, InputEvent, InputEventHandler, StageEvent},
    media::{
        ConnectionStatus, ConnectionStatusProvider, MediaFeed, MediaKind,
    },
    participant::{ParticipantDirectory, ParticipantId},
    platform::{Executor, TaskHandle},
    stage::{
        ContainerKind, LargeStageController, StageContainer, StageContext,
        StageError,
    },
    thumbnail::{ThumbnailPresenter, ThumbnailVariant},
    utils::{ErrorReport, Named},
};

/// Arrangement of the conference view.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Layout {
    /// Stage with a horizontal strip of thumbnails below it.
    #[display(fmt = "horizontal filmstrip")]
    HorizontalFilmstrip,

    /// Stage with a vertical strip of thumbnails aside it.
    #[display(fmt = "vertical filmstrip")]
    VerticalFilmstrip,

    /// Grid of thumbnails without any enlarged stage.
    #[display(fmt = "tile view")]
    TileView,
}

/// Conference-wide state shared by all the [`ThumbnailPresenter`]s of a
/// session.
pub struct SessionContext {
    /// ID of the local participant.
    pub local_id: ParticipantId,

    /// Participant pinned to the stage, if any.
    pub pinned: ObservableCell<Option<ParticipantId>>,

    /// Participant owning the stage.
    pub stage_owner: ObservableCell<Option<ParticipantId>>,

    /// Stage owner whose video has been actually rendered on the stage.
    pub rendered_on_stage: ObservableCell<Option<ParticipantId>>,

    /// Current [`Layout`].
    pub layout: ObservableCell<Layout>,

    /// Whether the audio-only mode is active.
    pub audio_only: ObservableCell<bool>,

    /// Thumbnails settings.
    pub conf: conf::Thumbnail,

    /// Directory of participants' names and avatars.
    pub directory: Rc<dyn ParticipantDirectory>,
}

impl SessionContext {
    /// Creates a new [`SessionContext`] in the initial state described by the
    /// provided [`Conf`].
    pub fn new(
        local_id: ParticipantId,
        conf: &Conf,
        directory: Rc<dyn ParticipantDirectory>,
    ) -> Self {
        let layout = if conf.stage.start_in_tile_view {
            Layout::TileView
        } else {
            Layout::HorizontalFilmstrip
        };
        Self {
            local_id,
            pinned: ObservableCell::new(None),
            stage_owner: ObservableCell::new(None),
            rendered_on_stage: ObservableCell::new(None),
            layout: ObservableCell::new(layout),
            audio_only: ObservableCell::new(conf.stage.start_audio_only),
            conf: conf.thumbnail.clone(),
            directory,
        }
    }

    /// Pins the provided participant, or clears the pin if it's pinned
    /// already.
    ///
    /// Returns the new pin target.
    pub fn toggle_pin(&self, id: &ParticipantId) -> Option<ParticipantId> {
        let pinned = if self.pinned.borrow().as_ref() == Some(id) {
            None
        } else {
            Some(id.clone())
        };
        log::debug!("Pin target: {:?}", pinned);
        self.pinned.set(pinned.clone());
        pinned
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("local_id", &self.local_id)
            .field("pinned", &*self.pinned.borrow())
            .field("stage_owner", &*self.stage_owner.borrow())
            .field("rendered_on_stage", &*self.rendered_on_stage.borrow())
            .field("layout", &self.layout.get())
            .field("audio_only", &self.audio_only.get())
            .finish()
    }
}

/// Single conference session.
///
/// Owns the [`LargeStageController`], a [`ThumbnailPresenter`] per
/// participant and the [`SessionContext`] they share. Nothing outlives it.
#[derive(Clone)]
pub struct Conference(Rc<Inner>);

struct Inner {
    session: Rc<SessionContext>,

    events: Rc<EventBus>,

    stage: LargeStageController,

    statuses: Rc<dyn ConnectionStatusProvider>,

    executor: Executor,

    presenters: RefCell<HashMap<ParticipantId, Rc<ThumbnailPresenter>>>,

    dominant_speaker: RefCell<Option<ParticipantId>>,

    /// Task awaiting the latest stage switch.
    switch: RefCell<Option<TaskHandle>>,

    tasks: RefCell<Vec<TaskHandle>>,
}

impl Conference {
    /// Creates a new [`Conference`] with the thumbnail of the local
    /// participant and the provided [`ContainerKind::Camera`] stage
    /// container.
    ///
    /// Nothing is put on the stage until [`Conference::start`] is called, so
    /// the rest of the stage containers may be registered before.
    pub fn new(
        conf: &Conf,
        local_id: ParticipantId,
        statuses: Rc<dyn ConnectionStatusProvider>,
        directory: Rc<dyn ParticipantDirectory>,
        executor: Executor,
        camera: Rc<dyn StageContainer>,
    ) -> Self {
        let session = Rc::new(SessionContext::new(
            local_id.clone(),
            conf,
            Rc::clone(&directory),
        ));
        let events = Rc::new(EventBus::new());
        let stage = LargeStageController::new(
            StageContext {
                executor: executor.clone(),
                local_id: local_id.clone(),
                connection_statuses: Rc::clone(&statuses),
                directory,
                events: Rc::clone(&events),
            },
            camera,
        );
        report(stage.set_audio_only(session.audio_only.get()));

        let local = ThumbnailPresenter::new(
            Some(local_id.clone()),
            ThumbnailVariant::local(),
            Rc::clone(&session),
            executor.clone(),
        );
        let mut presenters = HashMap::new();
        presenters.insert(local_id, Rc::new(local));

        let inner = Rc::new(Inner {
            session,
            events,
            stage,
            statuses,
            executor,
            presenters: RefCell::new(presenters),
            dominant_speaker: RefCell::new(None),
            switch: RefCell::new(None),
            tasks: RefCell::new(Vec::new()),
        });
        Inner::spawn_listeners(&inner);
        Self(inner)
    }

    /// Puts the selected participant on the stage.
    pub fn start(&self) {
        self.0.select_stage(true);
    }

    /// Returns the [`LargeStageController`] of this [`Conference`].
    #[inline]
    pub fn stage(&self) -> &LargeStageController {
        &self.0.stage
    }

    /// Returns the [`SessionContext`] of this [`Conference`].
    #[inline]
    pub fn session(&self) -> Rc<SessionContext> {
        Rc::clone(&self.0.session)
    }

    /// Returns the [`EventBus`] the [`StageEvent`]s are published into.
    #[inline]
    pub fn events(&self) -> Rc<EventBus> {
        Rc::clone(&self.0.events)
    }

    /// Returns [`ThumbnailPresenter`] of the provided participant.
    pub fn presenter(
        &self,
        id: &ParticipantId,
    ) -> Option<Rc<ThumbnailPresenter>> {
        self.0.presenters.borrow().get(id).cloned()
    }

    /// Adds a thumbnail of the provided [`ThumbnailVariant`] for a joined
    /// participant.
    ///
    /// Returns the existing [`ThumbnailPresenter`] if the participant is
    /// known already.
    pub fn add_participant(
        &self,
        id: ParticipantId,
        variant: ThumbnailVariant,
    ) -> Rc<ThumbnailPresenter> {
        if let Some(presenter) = self.presenter(&id) {
            log::warn!("Participant {} is added already", id);
            return presenter;
        }
        let presenter = Rc::new(ThumbnailPresenter::new(
            Some(id.clone()),
            variant,
            Rc::clone(&self.0.session),
            self.0.executor.clone(),
        ));
        let status = self.0.statuses.status_of(&id);
        report(presenter.set_connection_status(status));
        self.0
            .presenters
            .borrow_mut()
            .insert(id, Rc::clone(&presenter));
        presenter
    }

    /// Removes the thumbnail of a left participant.
    ///
    /// Clears the pin and re-selects the stage owner if the participant was
    /// pinned or owned the stage.
    pub fn remove_participant(&self, id: &ParticipantId) {
        if *id == self.0.session.local_id {
            log::warn!("Local participant cannot be removed");
            return;
        }
        if self.0.presenters.borrow_mut().remove(id).is_none() {
            return;
        }
        let was_dominant =
            self.0.dominant_speaker.borrow().as_ref() == Some(id);
        if was_dominant {
            self.0.dominant_speaker.replace(None);
        }
        if self.0.session.pinned.borrow().as_ref() == Some(id) {
            // Pin watcher re-selects the stage.
            self.0.session.pinned.set(None);
        } else if self.0.stage.target_participant().as_ref() == Some(id) {
            self.0.select_stage(true);
        }
    }

    /// Reacts on the provided [`InputEvent`].
    #[inline]
    pub fn dispatch(&self, event: InputEvent) {
        event.dispatch_with(&*self.0);
    }

    /// Switches the [`Layout`].
    pub fn set_layout(&self, layout: Layout) {
        log::debug!("Switching to {} layout", layout);
        self.0.session.layout.set(layout);
    }

    /// Switches the audio-only mode, re-rendering the stage.
    pub fn set_audio_only(&self, audio_only: bool) {
        self.0.session.audio_only.set(audio_only);
        report(self.0.stage.set_audio_only(audio_only));
        self.0.select_stage(true);
    }

    /// Notifies that the local participant's connection is interrupted.
    pub fn on_local_connection_interrupted(&self) {
        report(self.0.stage.on_video_interrupted());
    }

    /// Notifies that the local participant's connection is restored.
    pub fn on_local_connection_restored(&self) {
        report(self.0.stage.on_video_restored());
    }

    /// Tears down the stage, the thumbnails and all the background tasks.
    pub fn dispose(&self) {
        log::debug!("Disposing conference");
        self.0.tasks.borrow_mut().clear();
        drop(self.0.switch.borrow_mut().take());
        self.0.stage.dispose();
        self.0.presenters.borrow_mut().clear();
    }
}

impl Inner {
    /// Spawns the tasks following the stage owner, its rendered video and
    /// the pin target.
    fn spawn_listeners(this: &Rc<Self>) {
        let mut large_video_ids = this
            .events
            .subscribe()
            .filter_map(|event| async move {
                match event {
                    StageEvent::LargeVideoIdChanged(id) => Some(id),
                    StageEvent::ResolutionChanged { .. } => None,
                }
            })
            .boxed_local();
        let session = Rc::clone(&this.session);
        let owner_listener = this.executor.spawn(async move {
            while let Some(id) = large_video_ids.next().await {
                session.stage_owner.set(id);
            }
        });

        let mut rendered =
            this.stage.on_snapshot().map(|snapshot| snapshot.rendered_owner);
        let session = Rc::clone(&this.session);
        let rendered_listener = this.executor.spawn(async move {
            while let Some(id) = rendered.next().await {
                session.rendered_on_stage.set(id);
            }
        });

        let mut pins = this.session.pinned.subscribe().skip(1);
        let weak: Weak<Self> = Rc::downgrade(this);
        let pin_listener = this.executor.spawn(async move {
            while pins.next().await.is_some() {
                match weak.upgrade() {
                    Some(this) => this.select_stage(false),
                    None => break,
                }
            }
        });

        this.tasks
            .borrow_mut()
            .extend(vec![owner_listener, rendered_listener, pin_listener]);
    }

    /// Selects the participant to own the stage: the pinned one, else the
    /// dominant speaker, else the local participant.
    fn selected(&self) -> ParticipantId {
        let known =
            |id: &ParticipantId| self.presenters.borrow().contains_key(id);
        self.session
            .pinned
            .get()
            .filter(known)
            .or_else(|| self.dominant_speaker.borrow().clone().filter(known))
            .unwrap_or_else(|| self.session.local_id.clone())
    }

    /// Puts the selected participant on the stage.
    ///
    /// Unless `force`d, does nothing if it's on the stage already.
    fn select_stage(&self, force: bool) {
        let id = self.selected();
        if !force && self.stage.target_participant().as_ref() == Some(&id) {
            return;
        }
        self.put_on_stage(id);
    }

    /// Re-renders the stage if it's owned by the provided participant.
    fn refresh_stage_of(&self, id: &ParticipantId) {
        if self.stage.target_participant().as_ref() == Some(id) {
            self.put_on_stage(id.clone());
        }
    }

    fn put_on_stage(&self, id: ParticipantId) {
        let presenter = match self.presenters.borrow().get(&id) {
            Some(presenter) => Rc::clone(presenter),
            None => {
                log::warn!("Cannot put unknown participant {} on stage", id);
                return;
            }
        };
        let kind = if presenter.variant().is_shared_content() {
            ContainerKind::SpecialContent
        } else {
            ContainerKind::from(presenter.state().video_type)
        };
        let video_muted = presenter.state().is_video_muted;
        let feed = if video_muted { None } else { presenter.feed() };

        log::debug!("Putting {} on stage in `{}` container", id, kind);
        let switch = self.stage.update_large_video(id.clone(), feed, kind);
        let task = self.executor.spawn(async move {
            if let Err(e) = switch.await {
                let (err, _) = e.into_parts();
                if err != StageError::Superseded {
                    log::debug!("Putting {} on stage failed: {}", id, err);
                }
            }
        });
        self.switch.replace(Some(task));
    }

    fn presenter_of(
        &self,
        id: &ParticipantId,
    ) -> Option<Rc<ThumbnailPresenter>> {
        let presenter = self.presenters.borrow().get(id).cloned();
        if presenter.is_none() {
            log::warn!("Event for unknown participant {} is ignored", id);
        }
        presenter
    }
}

impl InputEventHandler for Inner {
    type Output = ();

    fn on_muted(
        &self,
        participant: ParticipantId,
        kind: MediaKind,
        muted: bool,
    ) {
        if let Some(presenter) = self.presenter_of(&participant) {
            report(presenter.set_muted(kind, muted));
            if kind == MediaKind::Video {
                self.refresh_stage_of(&participant);
            }
        }
    }

    fn on_hovered(&self, participant: ParticipantId, hovered: bool) {
        if let Some(presenter) = self.presenter_of(&participant) {
            report(presenter.set_hover(hovered));
        }
    }

    fn on_popover_hovered(&self, participant: ParticipantId, hovered: bool) {
        if let Some(presenter) = self.presenter_of(&participant) {
            report(presenter.set_popover_hover(hovered));
        }
    }

    fn on_connection_status_changed(
        &self,
        participant: ParticipantId,
        status: ConnectionStatus,
    ) {
        if let Some(presenter) = self.presenter_of(&participant) {
            report(presenter.set_connection_status(status));
            if self.stage.current_participant().as_ref() == Some(&participant)
            {
                report(self.stage.refresh_overlays());
            }
            self.refresh_stage_of(&participant);
        }
    }

    fn on_dominant_speaker_changed(&self, participant: ParticipantId) {
        let prev = self.dominant_speaker.replace(Some(participant.clone()));
        if prev.as_ref() == Some(&participant) {
            return;
        }
        let prev =
            prev.and_then(|id| self.presenters.borrow().get(&id).cloned());
        if let Some(prev) = prev {
            report(prev.set_dominant_speaker(false));
        }
        if let Some(presenter) = self.presenter_of(&participant) {
            report(presenter.set_dominant_speaker(true));
        }
        self.select_stage(false);
    }

    fn on_raised_hand(&self, participant: ParticipantId, raised: bool) {
        if let Some(presenter) = self.presenter_of(&participant) {
            report(presenter.set_raised_hand(raised));
        }
    }

    fn on_moderator_changed(
        &self,
        participant: ParticipantId,
        moderator: bool,
    ) {
        if let Some(presenter) = self.presenter_of(&participant) {
            report(presenter.set_moderator(moderator));
        }
    }

    fn on_feed_changed(
        &self,
        participant: ParticipantId,
        feed: Option<Rc<dyn MediaFeed>>,
    ) {
        if let Some(presenter) = self.presenter_of(&participant) {
            report(presenter.set_feed(feed));
            self.refresh_stage_of(&participant);
        }
    }

    fn on_pin_toggled(&self, participant: ParticipantId) {
        if let Some(presenter) = self.presenter_of(&participant) {
            report(presenter.toggle_pin());
        }
    }

    fn on_thumbnail_clicked(&self, participant: ParticipantId) {
        log::debug!("Thumbnail of {} is clicked", participant);
        self.on_pin_toggled(participant);
    }
}

/// Prints the error of the provided [`Result`], if any.
fn report<E>(result: Result<(), Traced<E>>)
where
    E: Named + fmt::Display,
{
    if let Err(e) = result {
        ErrorReport::from(e).print();
    }
}
