//! Identity of conference participants.

use derive_more::{Display, From};

/// ID of a conference participant.
#[derive(Clone, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
#[from(forward)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Returns this [`ParticipantId`] as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Directory resolving human-facing properties of conference participants.
#[cfg_attr(any(test, feature = "mockable"), mockall::automock)]
pub trait ParticipantDirectory {
    /// Returns the display name of the participant with the provided
    /// [`ParticipantId`], if it's known.
    fn display_name_of(&self, id: &ParticipantId) -> Option<String>;

    /// Returns an avatar URL of the participant with the provided
    /// [`ParticipantId`], if it has one.
    fn avatar_of(&self, id: &ParticipantId) -> Option<String>;
}
