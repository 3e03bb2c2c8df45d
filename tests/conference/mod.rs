use std::rc::Rc;

use futures::executor::LocalPool;
use medea_stage::{
    conf::Conf,
    media::{ConnectionStatus, MediaKind},
    stage::{ConnectionBanner, ContainerKind},
    thumbnail::TooltipPosition,
    Conference, DisplayMode, Executor, InputEvent, Layout, ThumbnailVariant,
};

use crate::{feed, id, FakeContainer, Feed, Journal, Statuses};

struct Fixture {
    pool: LocalPool,
    statuses: Rc<Statuses>,
    conference: Conference,
}

impl Fixture {
    /// Starts a conference with the local participant `me` having a playing
    /// camera feed and remote `bob` and `carol` without feeds yet.
    fn start(conf: &Conf) -> Self {
        let mut pool = LocalPool::new();
        let journal = Journal::new();
        let statuses = Rc::new(Statuses::default());
        let conference = Conference::new(
            conf,
            id("me"),
            Rc::clone(&statuses) as _,
            Rc::new(crate::Directory),
            Executor::new(pool.spawner()),
            FakeContainer::visible("video", &journal),
        );
        conference
            .stage()
            .register_container(
                ContainerKind::Placeholder,
                FakeContainer::new("placeholder", &journal),
            )
            .unwrap();
        conference.add_participant(id("bob"), ThumbnailVariant::remote());
        conference.add_participant(id("carol"), ThumbnailVariant::remote());
        conference.dispatch(InputEvent::FeedChanged {
            participant: id("me"),
            feed: feed(&Feed::camera()),
        });
        conference.start();
        pool.run_until_stalled();

        Self {
            pool,
            statuses,
            conference,
        }
    }

    fn dispatch(&mut self, event: InputEvent) {
        self.conference.dispatch(event);
        self.pool.run_until_stalled();
    }

    fn set_status(&mut self, participant: &str, status: ConnectionStatus) {
        self.statuses.set(participant, status);
        self.dispatch(InputEvent::ConnectionStatusChanged {
            participant: id(participant),
            status,
        });
    }

    fn give_feed(&mut self, participant: &str) {
        self.dispatch(InputEvent::FeedChanged {
            participant: id(participant),
            feed: feed(&Feed::camera()),
        });
    }

    fn stage_owner(&self) -> Option<String> {
        self.conference
            .session()
            .stage_owner
            .get()
            .map(|id| id.to_string())
    }

    fn mode_of(&self, participant: &str) -> DisplayMode {
        self.conference
            .presenter(&id(participant))
            .unwrap()
            .display_mode()
    }
}

#[test]
fn local_participant_owns_stage_by_default() {
    let f = Fixture::start(&Conf::default());

    assert_eq!(f.stage_owner().as_deref(), Some("me"));
    assert_eq!(f.conference.stage().current_participant(), Some(id("me")));
    assert_eq!(f.conference.stage().active_container(), ContainerKind::Camera);
    assert_eq!(f.mode_of("me"), DisplayMode::NameOverVideo);
    assert_eq!(f.mode_of("bob"), DisplayMode::AvatarOnly);
}

#[test]
fn dominant_speaker_takes_stage() {
    let mut f = Fixture::start(&Conf::default());
    f.give_feed("bob");

    f.dispatch(InputEvent::DominantSpeakerChanged {
        participant: id("bob"),
    });

    assert_eq!(f.stage_owner().as_deref(), Some("bob"));
    let bob = f.conference.presenter(&id("bob")).unwrap().snapshot();
    assert!(bob.is_on_stage);
    assert!(bob.was_ever_rendered_on_stage);
    assert!(bob.indicators.dominant_speaker);
    assert_eq!(bob.display_mode, DisplayMode::NameOverVideo);
    assert!(!f.conference.presenter(&id("me")).unwrap().snapshot().is_on_stage);
}

#[test]
fn pin_overrides_dominant_speaker() {
    let mut f = Fixture::start(&Conf::default());
    f.give_feed("bob");
    f.give_feed("carol");

    f.dispatch(InputEvent::PinToggled {
        participant: id("carol"),
    });
    assert_eq!(f.stage_owner().as_deref(), Some("carol"));
    assert!(f.conference.presenter(&id("carol")).unwrap().is_pinned());

    f.dispatch(InputEvent::DominantSpeakerChanged {
        participant: id("bob"),
    });
    assert_eq!(f.stage_owner().as_deref(), Some("carol"));

    f.dispatch(InputEvent::ThumbnailClicked {
        participant: id("carol"),
    });
    assert_eq!(f.conference.session().pinned.get(), None);
    assert_eq!(f.stage_owner().as_deref(), Some("bob"));
}

#[test]
fn leaving_pinned_participant_clears_pin() {
    let mut f = Fixture::start(&Conf::default());
    f.give_feed("carol");
    f.dispatch(InputEvent::PinToggled {
        participant: id("carol"),
    });
    assert_eq!(f.stage_owner().as_deref(), Some("carol"));

    f.conference.remove_participant(&id("carol"));
    f.pool.run_until_stalled();

    assert_eq!(f.conference.session().pinned.get(), None);
    assert!(f.conference.presenter(&id("carol")).is_none());
    assert_eq!(f.stage_owner().as_deref(), Some("me"));
}

#[test]
fn muting_stage_owner_video_shows_placeholder() {
    let mut f = Fixture::start(&Conf::default());

    f.dispatch(InputEvent::Muted {
        participant: id("me"),
        kind: MediaKind::Video,
        muted: true,
    });

    let stage = f.conference.stage();
    assert_eq!(stage.active_container(), ContainerKind::Placeholder);
    assert_eq!(stage.current_participant(), Some(id("me")));
    assert_eq!(f.mode_of("me"), DisplayMode::AvatarWithName);
}

#[test]
fn stage_owner_connection_status_is_bannered() {
    let mut f = Fixture::start(&Conf::default());
    f.give_feed("bob");
    f.dispatch(InputEvent::PinToggled {
        participant: id("bob"),
    });

    f.statuses.set("bob", ConnectionStatus::Interrupted);
    f.dispatch(InputEvent::ConnectionStatusChanged {
        participant: id("bob"),
        status: ConnectionStatus::Interrupted,
    });

    let snapshot = f.conference.stage().snapshot();
    assert_eq!(snapshot.active, ContainerKind::Camera);
    assert_eq!(snapshot.overlays.banner, Some(ConnectionBanner::Interrupted));
    let bob = f.conference.presenter(&id("bob")).unwrap().snapshot();
    let connection = bob.indicators.connection.unwrap();
    assert_eq!(connection.status, ConnectionStatus::Interrupted);
}

#[test]
fn thumbnail_follows_video_actually_rendered_on_stage() {
    let mut f = Fixture::start(&Conf::default());
    f.set_status("bob", ConnectionStatus::Interrupted);
    f.give_feed("bob");
    f.dispatch(InputEvent::PinToggled {
        participant: id("bob"),
    });

    assert_eq!(
        f.conference.stage().active_container(),
        ContainerKind::Placeholder,
    );
    let bob = f.conference.presenter(&id("bob")).unwrap();
    assert!(bob.snapshot().is_on_stage);
    assert!(!bob.snapshot().was_ever_rendered_on_stage);

    f.set_status("bob", ConnectionStatus::Active);
    assert_eq!(f.conference.stage().active_container(), ContainerKind::Camera);
    assert!(bob.snapshot().was_ever_rendered_on_stage);

    f.set_status("bob", ConnectionStatus::Interrupted);
    assert_eq!(f.conference.stage().active_container(), ContainerKind::Camera);
    assert!(bob.snapshot().was_ever_rendered_on_stage);
}

#[test]
fn tile_view_turns_stage_owner_into_regular_tile() {
    let mut f = Fixture::start(&Conf::default());
    let me = f.conference.presenter(&id("me")).unwrap();
    me.set_video_element_attached(true).unwrap();

    f.conference.set_layout(Layout::TileView);
    f.pool.run_until_stalled();

    assert_eq!(me.display_mode(), DisplayMode::Video);
    assert_eq!(
        me.snapshot().indicators.tooltip_position,
        TooltipPosition::Right,
    );

    f.dispatch(InputEvent::Hovered {
        participant: id("me"),
        hovered: true,
    });
    assert_eq!(me.display_mode(), DisplayMode::VideoWithName);
}

#[test]
fn audio_only_mode_hides_all_video() {
    let mut f = Fixture::start(&Conf::default());

    f.conference.set_audio_only(true);
    f.pool.run_until_stalled();

    assert_eq!(
        f.conference.stage().active_container(),
        ContainerKind::Placeholder,
    );
    assert_eq!(f.mode_of("me"), DisplayMode::AvatarWithName);
}

#[test]
fn starts_in_configured_mode() {
    let mut conf = Conf::default();
    conf.stage.start_audio_only = true;
    conf.stage.start_in_tile_view = true;

    let f = Fixture::start(&conf);

    assert!(f.conference.stage().is_audio_only());
    assert_eq!(f.conference.session().layout.get(), Layout::TileView);
    assert_eq!(
        f.conference.stage().active_container(),
        ContainerKind::Placeholder,
    );
}

#[test]
fn events_of_unknown_participants_are_ignored() {
    let mut f = Fixture::start(&Conf::default());

    f.dispatch(InputEvent::RaisedHand {
        participant: id("nobody"),
        raised: true,
    });
    f.dispatch(InputEvent::PinToggled {
        participant: id("nobody"),
    });

    assert_eq!(f.conference.session().pinned.get(), None);
    assert_eq!(f.stage_owner().as_deref(), Some("me"));
}

#[test]
fn dispose_tears_everything_down() {
    let mut f = Fixture::start(&Conf::default());

    f.conference.dispose();
    f.pool.run_until_stalled();

    assert!(f.conference.presenter(&id("me")).is_none());
    assert!(f.conference.stage().resize(Some(1), None).is_err());
}
