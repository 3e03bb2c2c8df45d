//! Kinds of thumbnails, chosen at construction.

use medea_macro::enum_delegate;

use crate::participant::{ParticipantDirectory, ParticipantId};

/// Properties of a rendered display name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisplayNameProps {
    /// ID of the element the name is rendered into.
    pub element_id: String,

    /// Name to render, if it's known.
    pub name: Option<String>,

    /// Whether the user may edit the name.
    pub editable: bool,
}

/// Behaviour which differs between thumbnail kinds.
pub trait ThumbnailKind {
    /// Returns ID of the container rendering the thumbnail of the provided
    /// participant.
    fn container_id(&self, id: &ParticipantId) -> String;

    /// Returns [`DisplayNameProps`] of the provided participant.
    fn display_name(
        &self,
        id: &ParticipantId,
        directory: &dyn ParticipantDirectory,
    ) -> DisplayNameProps;

    /// Indicates whether device availability icons are shown.
    fn device_icons(&self) -> bool;

    /// Returns source of the avatar of the provided participant.
    fn avatar(
        &self,
        id: &ParticipantId,
        directory: &dyn ParticipantDirectory,
    ) -> Option<String>;

    /// Indicates whether the thumbnail is of the local participant.
    fn is_local(&self) -> bool;

    /// Indicates whether the video is treated as muted since construction.
    fn starts_video_muted(&self) -> bool;
}

/// Thumbnail of a participant's camera.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Camera {
    /// Whether it's the local participant.
    pub is_local: bool,
}

impl ThumbnailKind for Camera {
    fn container_id(&self, id: &ParticipantId) -> String {
        if self.is_local {
            "localVideoContainer".to_owned()
        } else {
            format!("participant_{}", id)
        }
    }

    fn display_name(
        &self,
        id: &ParticipantId,
        directory: &dyn ParticipantDirectory,
    ) -> DisplayNameProps {
        let element_id = if self.is_local {
            "localDisplayName".to_owned()
        } else {
            format!("{}_name", self.container_id(id))
        };
        DisplayNameProps {
            element_id,
            name: directory.display_name_of(id),
            editable: self.is_local,
        }
    }

    #[inline]
    fn device_icons(&self) -> bool {
        true
    }

    #[inline]
    fn avatar(
        &self,
        id: &ParticipantId,
        directory: &dyn ParticipantDirectory,
    ) -> Option<String> {
        directory.avatar_of(id)
    }

    #[inline]
    fn is_local(&self) -> bool {
        self.is_local
    }

    #[inline]
    fn starts_video_muted(&self) -> bool {
        false
    }
}

/// Thumbnail of a shared video, identified by the ID of the video.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SharedContent;

impl SharedContent {
    /// ID of the container rendering a shared video thumbnail.
    pub const CONTAINER_ID: &'static str = "sharedVideoContainer";
}

impl ThumbnailKind for SharedContent {
    #[inline]
    fn container_id(&self, _: &ParticipantId) -> String {
        Self::CONTAINER_ID.to_owned()
    }

    fn display_name(
        &self,
        id: &ParticipantId,
        directory: &dyn ParticipantDirectory,
    ) -> DisplayNameProps {
        DisplayNameProps {
            element_id: format!("{}_name", Self::CONTAINER_ID),
            name: directory.display_name_of(id),
            editable: false,
        }
    }

    #[inline]
    fn device_icons(&self) -> bool {
        false
    }

    fn avatar(
        &self,
        id: &ParticipantId,
        _: &dyn ParticipantDirectory,
    ) -> Option<String> {
        Some(format!("https://img.youtube.com/vi/{}/0.jpg", id))
    }

    #[inline]
    fn is_local(&self) -> bool {
        false
    }

    #[inline]
    fn starts_video_muted(&self) -> bool {
        true
    }
}

/// Tagged kind of a thumbnail.
#[enum_delegate(pub fn container_id(&self, id: &ParticipantId) -> String)]
#[enum_delegate(
    pub fn display_name(
        &self,
        id: &ParticipantId,
        directory: &dyn ParticipantDirectory,
    ) -> DisplayNameProps
)]
#[enum_delegate(pub fn device_icons(&self) -> bool)]
#[enum_delegate(
    pub fn avatar(
        &self,
        id: &ParticipantId,
        directory: &dyn ParticipantDirectory,
    ) -> Option<String>
)]
#[enum_delegate(pub fn is_local(&self) -> bool)]
#[enum_delegate(pub fn starts_video_muted(&self) -> bool)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThumbnailVariant {
    /// Participant's camera.
    Camera(Camera),

    /// Shared video.
    SharedContent(SharedContent),
}

impl ThumbnailVariant {
    /// Returns [`ThumbnailVariant`] of the local participant's camera.
    #[inline]
    #[must_use]
    pub fn local() -> Self {
        Self::Camera(Camera { is_local: true })
    }

    /// Returns [`ThumbnailVariant`] of a remote participant's camera.
    #[inline]
    #[must_use]
    pub fn remote() -> Self {
        Self::Camera(Camera { is_local: false })
    }

    /// Indicates whether this is a [`ThumbnailVariant::SharedContent`].
    #[inline]
    #[must_use]
    pub fn is_shared_content(&self) -> bool {
        matches!(self, Self::SharedContent(_))
    }
}
