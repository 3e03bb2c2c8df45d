//! Stage display manager of a multi-party video call client.
//!
//! Decides which participant occupies the single enlarged stage and what
//! every participant's thumbnail renders, emitting immutable snapshots for an
//! external view layer to project.

// TODO: Remove `clippy::must_use_candidate` once the issue below is resolved:
//       https://github.com/rust-lang/rust-clippy/issues/4779
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod conf;
pub mod conference;
pub mod events;
pub mod media;
pub mod participant;
pub mod platform;
pub mod stage;
pub mod thumbnail;
pub mod utils;

#[doc(inline)]
pub use self::{
    conf::Conf,
    conference::{Conference, Layout, SessionContext},
    events::{EventBus, InputEvent, InputEventHandler, StageEvent},
    participant::ParticipantId,
    platform::{Executor, TaskHandle},
    stage::{
        ContainerKind, LargeStageController, StageContainer, StageError,
        StageSnapshot,
    },
    thumbnail::{DisplayMode, ThumbnailPresenter, ThumbnailVariant},
};
