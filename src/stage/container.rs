//! Presentation surfaces the stage switches between.

use std::{collections::HashMap, rc::Rc};

use async_trait::async_trait;
use derive_more::Display;
use tracerr::Traced;

use crate::{
    media::{FeedKind, MediaFeed},
    participant::ParticipantId,
};

use super::ConfigurationError;

/// Kind of a [`StageContainer`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ContainerKind {
    /// Participant's camera feed.
    Camera,

    /// Participant's screen sharing feed.
    Screen,

    /// Avatar shown instead of a feed which cannot be rendered.
    Placeholder,

    /// Special content like a shared document or a shared video.
    SpecialContent,
}

impl ContainerKind {
    /// Indicates whether this kind renders a participant's video feed.
    #[inline]
    #[must_use]
    pub fn is_video(self) -> bool {
        matches!(self, Self::Camera | Self::Screen)
    }

    /// Indicates whether this kind represents a participant on the stage, so
    /// the watermark and connection overlays are shown over it.
    #[inline]
    #[must_use]
    pub fn carries_overlays(self) -> bool {
        self.is_video() || self == Self::Placeholder
    }
}

impl From<FeedKind> for ContainerKind {
    #[inline]
    fn from(kind: FeedKind) -> Self {
        match kind {
            FeedKind::Camera => Self::Camera,
            FeedKind::Screen => Self::Screen,
        }
    }
}

/// Visual slot of the stage, implemented by the view layer.
///
/// [`StageContainer::show`] and [`StageContainer::hide`] may be animated, so
/// the stage awaits them before going further.
#[async_trait(?Send)]
pub trait StageContainer {
    /// Starts displaying this container, resolving once it's fully shown.
    async fn show(&self);

    /// Hides this container, resolving once it's fully hidden.
    async fn hide(&self);

    /// Binds the feed of the provided participant to this container.
    ///
    /// `None` feed means that the participant has nothing to render.
    fn set_feed(
        &self,
        owner: Option<&ParticipantId>,
        feed: Option<Rc<dyn MediaFeed>>,
    );

    /// Fits this container into the provided stage size.
    fn resize(&self, width: u32, height: u32, animate: bool);

    /// Called when the mouse enters the stage while this container is shown.
    fn on_hover_in(&self) {}

    /// Called when the mouse leaves the stage while this container is shown.
    fn on_hover_out(&self) {}

    /// Releases all the resources of this container.
    fn dispose(&self) {}
}

/// Registration of a [`StageContainer`] under some [`ContainerKind`].
struct Slot {
    container: Rc<dyn StageContainer>,
    visible: bool,
    owner: Option<ParticipantId>,
}

impl Slot {
    fn new(container: Rc<dyn StageContainer>) -> Self {
        Self {
            container,
            visible: false,
            owner: None,
        }
    }
}

/// Fixed set of mutually exclusive [`StageContainer`]s with exactly one of
/// them being active.
pub(super) struct ContainerPool {
    slots: HashMap<ContainerKind, Slot>,
    active: ContainerKind,
}

impl ContainerPool {
    /// Creates a new [`ContainerPool`] with the provided
    /// [`ContainerKind::Camera`] container being active and already visible.
    pub(super) fn new(camera: Rc<dyn StageContainer>) -> Self {
        let mut slot = Slot::new(camera);
        slot.visible = true;
        let mut slots = HashMap::new();
        slots.insert(ContainerKind::Camera, slot);
        Self {
            slots,
            active: ContainerKind::Camera,
        }
    }

    /// Registers the provided [`StageContainer`] under the provided
    /// [`ContainerKind`].
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::DuplicateContainer`] if some container is
    /// registered under this [`ContainerKind`] already.
    pub(super) fn register(
        &mut self,
        kind: ContainerKind,
        container: Rc<dyn StageContainer>,
    ) -> Result<(), Traced<ConfigurationError>> {
        if self.slots.contains_key(&kind) {
            return Err(tracerr::new!(ConfigurationError::DuplicateContainer(
                kind
            )));
        }
        self.slots.insert(kind, Slot::new(container));
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
    pub(super) fn remove(
        &mut self,
        kind: ContainerKind,
    ) -> Result<Rc<dyn StageContainer>, Traced<ConfigurationError>> {
        if kind == self.active {
            return Err(tracerr::new!(
                ConfigurationError::ActiveContainerRemoval(kind)
            ));
        }
        self.slots
            .remove(&kind)
            .map(|slot| slot.container)
            .ok_or_else(|| {
                tracerr::new!(ConfigurationError::MissingContainer(kind))
            })
    }

    /// Returns the [`StageContainer`] registered under the provided
    /// [`ContainerKind`].
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::MissingContainer`] if nothing is registered
    /// under this [`ContainerKind`].
    pub(super) fn get(
        &self,
        kind: ContainerKind,
    ) -> Result<Rc<dyn StageContainer>, Traced<ConfigurationError>> {
        self.slots
            .get(&kind)
            .map(|slot| Rc::clone(&slot.container))
            .ok_or_else(|| {
                tracerr::new!(ConfigurationError::MissingContainer(kind))
            })
    }

    /// Indicates whether some [`StageContainer`] is registered under the
    /// provided [`ContainerKind`].
    #[inline]
    pub(super) fn contains(&self, kind: ContainerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Returns [`ContainerKind`] of the active [`StageContainer`].
    #[inline]
    pub(super) fn active(&self) -> ContainerKind {
        self.active
    }

    /// Returns the active [`StageContainer`].
    pub(super) fn active_container(&self) -> Option<Rc<dyn StageContainer>> {
        self.slots
            .get(&self.active)
            .map(|slot| Rc::clone(&slot.container))
    }

    /// Indicates whether the active [`StageContainer`] is visible.
    pub(super) fn is_active_visible(&self) -> bool {
        self.slots.get(&self.active).map_or(false, |slot| slot.visible)
    }

    /// Returns the owner of the active [`StageContainer`].
    pub(super) fn active_owner(&self) -> Option<&ParticipantId> {
        self.slots
            .get(&self.active)
            .and_then(|slot| slot.owner.as_ref())
    }

    /// Indicates whether the [`StageContainer`] registered under the provided
    /// [`ContainerKind`] is the very same object as the active one.
    pub(super) fn shares_active(&self, kind: ContainerKind) -> bool {
        if kind == self.active {
            return true;
        }
        match (self.slots.get(&kind), self.slots.get(&self.active)) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a.container, &b.container),
            _ => false,
        }
    }

    /// Records that the active [`StageContainer`] finished hiding.
    pub(super) fn mark_active_hidden(&mut self) {
        if let Some(slot) = self.slots.get_mut(&self.active) {
            slot.visible = false;
        }
    }

    /// Makes the provided [`ContainerKind`] the active one, recording that its
    /// [`StageContainer`] is visible and owned by the provided participant.
    pub(super) fn activate(
        &mut self,
        kind: ContainerKind,
        owner: Option<ParticipantId>,
    ) {
        if kind != self.active {
            if let Some(prev) = self.slots.get_mut(&self.active) {
                prev.visible = false;
            }
        }
        if let Some(slot) = self.slots.get_mut(&kind) {
            slot.visible = true;
            slot.owner = owner;
        }
        self.active = kind;
    }

    /// Returns all the registered [`StageContainer`]s, each object once, even
    /// if it's registered under several [`ContainerKind`]s.
    pub(super) fn containers(&self) -> Vec<Rc<dyn StageContainer>> {
        let mut out: Vec<Rc<dyn StageContainer>> = Vec::new();
        for slot in self.slots.values() {
            if !out.iter().any(|c| Rc::ptr_eq(c, &slot.container)) {
                out.push(Rc::clone(&slot.container));
            }
        }
        out
    }

    /// Disposes and unregisters all the [`StageContainer`]s.
    pub(super) fn dispose(&mut self) {
        for container in self.containers() {
            container.dispose();
        }
        self.slots.clear();
    }
}
