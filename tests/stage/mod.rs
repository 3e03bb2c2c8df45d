use std::rc::Rc;

use futures::{executor::LocalPool, stream::LocalBoxStream, FutureExt as _};
use medea_stage::{
    events::{EventBus, StageEvent},
    media::ConnectionStatus,
    platform::Executor,
    stage::{
        ConfigurationError, ConnectionBanner, ContainerKind,
        LargeStageController, Overlays, StageContext, StageError,
        TransitionState,
    },
};

use crate::{drain, feed, id, FakeContainer, Feed, Journal, Statuses};

struct Fixture {
    pool: LocalPool,
    journal: Rc<Journal>,
    statuses: Rc<Statuses>,
    events: LocalBoxStream<'static, StageEvent>,
    stage: LargeStageController,
    video: Rc<FakeContainer>,
    placeholder: Rc<FakeContainer>,
    special: Rc<FakeContainer>,
}

impl Fixture {
    /// Creates a stage with one video container serving both camera and
    /// screen feeds, a placeholder and a special content containers.
    fn new(journal: Rc<Journal>) -> Self {
        let pool = LocalPool::new();
        let statuses = Rc::new(Statuses::default());
        let bus = Rc::new(EventBus::new());
        let events = bus.subscribe();

        let video = FakeContainer::visible("video", &journal);
        let stage = LargeStageController::new(
            StageContext {
                executor: Executor::new(pool.spawner()),
                local_id: id("me"),
                connection_statuses: Rc::clone(&statuses) as _,
                directory: Rc::new(crate::Directory),
                events: bus,
            },
            Rc::clone(&video) as _,
        );
        let placeholder = FakeContainer::new("placeholder", &journal);
        let special = FakeContainer::new("special", &journal);
        stage
            .register_container(ContainerKind::Screen, Rc::clone(&video) as _)
            .unwrap();
        stage
            .register_container(
                ContainerKind::Placeholder,
                Rc::clone(&placeholder) as _,
            )
            .unwrap();
        stage
            .register_container(
                ContainerKind::SpecialContent,
                Rc::clone(&special) as _,
            )
            .unwrap();

        Self {
            pool,
            journal,
            statuses,
            events,
            stage,
            video,
            placeholder,
            special,
        }
    }

    /// Puts `alice` with a playing camera feed on the stage and forgets
    /// everything recorded so far.
    fn with_alice(journal: Rc<Journal>) -> (Self, Rc<Feed>) {
        let mut f = Self::new(journal);
        let alice = Feed::camera();
        let mut switch = f.stage.update_large_video(
            id("alice"),
            feed(&alice),
            ContainerKind::Camera,
        );
        while f.journal.release() || (&mut switch).now_or_never().is_none() {
            f.pool.run_until_stalled();
        }
        f.journal.take();
        drain(&mut f.events);
        (f, alice)
    }
}

#[test]
fn newer_request_supersedes_pending_one() {
    let mut f = Fixture::new(Journal::new());

    let alice = f.stage.update_large_video(
        id("alice"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    let bob = f.stage.update_large_video(
        id("bob"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();

    let err = alice.now_or_never().unwrap().unwrap_err();
    assert_eq!(err.into_inner(), StageError::Superseded);
    assert!(bob.now_or_never().unwrap().is_ok());
    assert_eq!(
        drain(&mut f.events),
        vec![StageEvent::LargeVideoIdChanged(Some(id("bob")))],
    );
    assert_eq!(f.stage.current_participant(), Some(id("bob")));
    assert_eq!(
        f.journal.take(),
        vec![
            "video:hide",
            "video:hidden",
            "video:feed=bob",
            "video:show",
            "video:shown",
        ],
    );
    assert_eq!(f.stage.transition_state(), TransitionState::Idle);
}

#[test]
fn request_arriving_during_hide_supersedes_it() {
    let mut f = Fixture::new(Journal::gated());

    let alice = f.stage.update_large_video(
        id("alice"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();
    assert_eq!(f.journal.take(), vec!["video:hide"]);
    assert_eq!(f.stage.transition_state(), TransitionState::Transitioning);

    let bob = f.stage.update_large_video(
        id("bob"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    let carol = f.stage.update_large_video(
        id("carol"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    assert_eq!(f.stage.target_participant(), Some(id("carol")));

    assert!(f.journal.release());
    f.pool.run_until_stalled();
    assert!(f.journal.release());
    f.pool.run_until_stalled();

    let superseded = |handle: medea_stage::stage::SwitchHandle| {
        handle.now_or_never().unwrap().unwrap_err().into_inner()
    };
    assert_eq!(superseded(alice), StageError::Superseded);
    assert_eq!(superseded(bob), StageError::Superseded);
    assert!(carol.now_or_never().unwrap().is_ok());
    assert_eq!(
        f.journal.take(),
        vec!["video:hidden", "video:feed=carol", "video:show", "video:shown"],
    );
    assert_eq!(f.stage.current_participant(), Some(id("carol")));
}

#[test]
fn in_flight_transition_runs_to_completion() {
    let mut f = Fixture::new(Journal::gated());

    let mut alice = f.stage.update_large_video(
        id("alice"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();
    f.journal.release();
    f.pool.run_until_stalled();
    assert_eq!(
        f.journal.take(),
        vec!["video:hide", "video:hidden", "video:feed=alice", "video:show"],
    );

    let bob = f.stage.update_large_video(
        id("bob"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();
    assert!(f.journal.take().is_empty());
    assert_eq!(f.stage.current_participant(), None);

    f.journal.release();
    f.pool.run_until_stalled();
    assert!((&mut alice).now_or_never().unwrap().is_ok());
    assert_eq!(f.stage.current_participant(), Some(id("alice")));
    assert_eq!(f.journal.take(), vec!["video:shown", "video:hide"]);

    while f.journal.release() {
        f.pool.run_until_stalled();
    }
    assert!(bob.now_or_never().unwrap().is_ok());
    assert_eq!(
        drain(&mut f.events),
        vec![
            StageEvent::LargeVideoIdChanged(Some(id("alice"))),
            StageEvent::LargeVideoIdChanged(Some(id("bob"))),
        ],
    );
    assert_eq!(f.stage.current_participant(), Some(id("bob")));
}

#[test]
fn same_participant_feed_is_swapped_in_place() {
    let (mut f, _) = Fixture::with_alice(Journal::new());

    let switch = f.stage.update_large_video(
        id("alice"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();

    assert!(switch.now_or_never().unwrap().is_ok());
    assert_eq!(f.journal.take(), vec!["video:feed=alice"]);
    assert_eq!(f.stage.active_container(), ContainerKind::Camera);

    let screen = f.stage.update_large_video(
        id("alice"),
        feed(&Feed::screen()),
        ContainerKind::Screen,
    );
    f.pool.run_until_stalled();

    assert!(screen.now_or_never().unwrap().is_ok());
    assert_eq!(f.journal.take(), vec!["video:feed=alice"]);
    assert_eq!(f.stage.active_container(), ContainerKind::Screen);
}

#[test]
fn muted_feed_is_replaced_with_placeholder() {
    let mut f = Fixture::new(Journal::new());
    let muted = Feed::camera();
    muted.set_muted(true);

    let switch = f.stage.update_large_video(
        id("alice"),
        feed(&muted),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();

    assert!(switch.now_or_never().unwrap().is_ok());
    assert_eq!(
        f.journal.take(),
        vec![
            "video:hide",
            "video:hidden",
            "placeholder:feed=alice",
            "placeholder:show",
            "placeholder:shown",
        ],
    );
    let snapshot = f.stage.snapshot();
    assert_eq!(snapshot.active, ContainerKind::Placeholder);
    assert_eq!(snapshot.owner, Some(id("alice")));
    assert_eq!(snapshot.owner_display_name.as_deref(), Some("alice name"));
    assert_eq!(snapshot.overlays.presence_label, Some(id("alice")));
}

#[test]
fn interrupted_participant_never_rendered_gets_placeholder() {
    let mut f = Fixture::new(Journal::new());
    f.statuses.set("bob", ConnectionStatus::Interrupted);

    let _ = f.stage.update_large_video(
        id("bob"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();

    let snapshot = f.stage.snapshot();
    assert_eq!(snapshot.active, ContainerKind::Placeholder);
    assert_eq!(snapshot.overlays.banner, Some(ConnectionBanner::Interrupted));
    assert!(!snapshot.overlays.problem_filter);
}

#[test]
fn rendered_video_survives_connection_blip() {
    let (mut f, alice) = Fixture::with_alice(Journal::new());

    f.statuses.set("alice", ConnectionStatus::Interrupted);
    f.stage.refresh_overlays().unwrap();
    let switch = f.stage.update_large_video(
        id("alice"),
        feed(&alice),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();

    assert!(switch.now_or_never().unwrap().is_ok());
    assert_eq!(f.journal.take(), vec!["video:feed=alice"]);
    let snapshot = f.stage.snapshot();
    assert_eq!(snapshot.active, ContainerKind::Camera);
    assert_eq!(snapshot.overlays.banner, Some(ConnectionBanner::Interrupted));
    assert!(snapshot.overlays.problem_filter);
    assert_eq!(snapshot.overlays.presence_label, None);
}

#[test]
fn sticky_flag_is_reset_on_owner_change() {
    let (mut f, alice) = Fixture::with_alice(Journal::new());

    let _ = f.stage.update_large_video(
        id("bob"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();
    f.statuses.set("alice", ConnectionStatus::Interrupted);
    let _ = f.stage.update_large_video(
        id("alice"),
        feed(&alice),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();

    assert_eq!(f.stage.active_container(), ContainerKind::Placeholder);
    assert_eq!(f.stage.current_participant(), Some(id("alice")));
}

#[test]
fn audio_only_mode_suppresses_video() {
    let (mut f, alice) = Fixture::with_alice(Journal::new());

    f.stage.set_audio_only(true).unwrap();
    assert!(f.stage.is_audio_only());
    assert_eq!(f.stage.snapshot().overlays.banner, None);
    let _ = f.stage.update_large_video(
        id("alice"),
        feed(&alice),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();

    assert_eq!(f.stage.active_container(), ContainerKind::Placeholder);
}

#[test]
fn repeated_show_container_shows_once() {
    let mut f = Fixture::new(Journal::new());

    let first = f.stage.show_container(ContainerKind::SpecialContent);
    let mut second = f.stage.show_container(ContainerKind::SpecialContent);
    assert!((&mut second).now_or_never().unwrap().is_ok());
    f.pool.run_until_stalled();

    assert!(first.now_or_never().unwrap().is_ok());
    assert_eq!(
        f.journal.take(),
        vec!["video:hide", "video:hidden", "special:show", "special:shown"],
    );
    assert_eq!(f.stage.active_container(), ContainerKind::SpecialContent);

    let again = f.stage.show_container(ContainerKind::SpecialContent);
    assert!(again.now_or_never().unwrap().is_ok());
    f.pool.run_until_stalled();
    assert!(f.journal.take().is_empty());
}

#[test]
fn shown_video_container_follows_placeholder_rule() {
    let mut f = Fixture::new(Journal::new());
    let alice = Feed::camera();
    alice.set_muted(true);
    let _ = f.stage.update_large_video(
        id("alice"),
        feed(&alice),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();
    assert_eq!(f.stage.active_container(), ContainerKind::Placeholder);
    f.journal.take();

    let camera = f.stage.show_container(ContainerKind::Camera);
    assert!(camera.now_or_never().unwrap().is_ok());
    f.pool.run_until_stalled();
    assert!(f.journal.take().is_empty());
    assert_eq!(f.stage.active_container(), ContainerKind::Placeholder);

    let _ = f.stage.show_container(ContainerKind::SpecialContent);
    f.pool.run_until_stalled();
    f.journal.take();
    let camera = f.stage.show_container(ContainerKind::Camera);
    f.pool.run_until_stalled();

    assert!(camera.now_or_never().unwrap().is_ok());
    assert_eq!(
        f.journal.take(),
        vec![
            "special:hide",
            "special:hidden",
            "placeholder:feed=alice",
            "placeholder:show",
            "placeholder:shown",
        ],
    );
    assert_eq!(f.stage.active_container(), ContainerKind::Placeholder);

    alice.set_muted(false);
    let camera = f.stage.show_container(ContainerKind::Camera);
    f.pool.run_until_stalled();

    assert!(camera.now_or_never().unwrap().is_ok());
    assert_eq!(
        f.journal.take(),
        vec![
            "placeholder:hide",
            "placeholder:hidden",
            "video:feed=alice",
            "video:show",
            "video:shown",
        ],
    );
    let snapshot = f.stage.snapshot();
    assert_eq!(snapshot.active, ContainerKind::Camera);
    assert_eq!(snapshot.owner, Some(id("alice")));
    assert_eq!(snapshot.rendered_owner, Some(id("alice")));
}

#[test]
fn show_container_during_participant_switch_ends_on_its_outcome() {
    let (mut f, _) = Fixture::with_alice(Journal::gated());
    let muted = Feed::camera();
    muted.set_muted(true);

    let bob = f.stage.update_large_video(
        id("bob"),
        feed(&muted),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();
    assert!(f.journal.release());
    f.pool.run_until_stalled();
    assert_eq!(
        f.journal.take(),
        vec![
            "video:hide",
            "video:hidden",
            "placeholder:feed=bob",
            "placeholder:show",
        ],
    );
    assert_eq!(f.stage.target_participant(), Some(id("bob")));

    let early = f.stage.show_container(ContainerKind::Camera);
    assert!(early.now_or_never().unwrap().is_ok());

    let special = f.stage.show_container(ContainerKind::SpecialContent);
    let camera = f.stage.show_container(ContainerKind::Camera);
    f.pool.run_until_stalled();
    assert_eq!(
        special.now_or_never().unwrap().unwrap_err().into_inner(),
        StageError::Superseded,
    );

    while f.journal.release() {
        f.pool.run_until_stalled();
    }
    assert!(bob.now_or_never().unwrap().is_ok());
    assert!(camera.now_or_never().unwrap().is_ok());
    assert_eq!(f.journal.take(), vec!["placeholder:shown"]);
    let snapshot = f.stage.snapshot();
    assert_eq!(snapshot.active, ContainerKind::Placeholder);
    assert_eq!(snapshot.owner, Some(id("bob")));
    assert_eq!(snapshot.rendered_owner, None);
    assert_eq!(snapshot.transition, TransitionState::Idle);
}

#[test]
fn overlays_are_hidden_before_leaving_video() {
    let (mut f, _) = Fixture::with_alice(Journal::gated());
    assert!(f.stage.snapshot().overlays.watermark);

    let _ = f.stage.show_container(ContainerKind::SpecialContent);
    f.pool.run_until_stalled();

    assert_eq!(f.journal.take(), vec!["video:hide"]);
    let snapshot = f.stage.snapshot();
    assert_eq!(snapshot.active, ContainerKind::Camera);
    assert_eq!(snapshot.overlays, Overlays::hidden());

    while f.journal.release() {
        f.pool.run_until_stalled();
    }
    let snapshot = f.stage.snapshot();
    assert_eq!(snapshot.active, ContainerKind::SpecialContent);
    assert_eq!(snapshot.owner, Some(id("alice")));
    assert_eq!(snapshot.overlays, Overlays::hidden());
    assert_eq!(snapshot.transition, TransitionState::Idle);
    assert!(drain(&mut f.events).is_empty());
}

#[test]
fn local_interruption_overrides_remote_banner() {
    let (f, _) = Fixture::with_alice(Journal::new());
    f.statuses.set("alice", ConnectionStatus::Inactive);
    f.stage.refresh_overlays().unwrap();
    assert_eq!(
        f.stage.snapshot().overlays.banner,
        Some(ConnectionBanner::LowBandwidth),
    );

    f.stage.on_video_interrupted().unwrap();
    let overlays = f.stage.snapshot().overlays;
    assert_eq!(overlays.banner, None);
    assert!(overlays.local_connection_message);
    assert!(overlays.local_problem_filter);

    f.stage.on_video_restored().unwrap();
    assert!(!f.stage.snapshot().overlays.local_connection_message);
}

#[test]
fn missing_container_restores_active_one() {
    let (mut f, _) = Fixture::with_alice(Journal::new());
    f.stage
        .remove_container(ContainerKind::SpecialContent)
        .unwrap();

    let switch = f.stage.show_container(ContainerKind::SpecialContent);
    f.pool.run_until_stalled();

    let err = switch.now_or_never().unwrap().unwrap_err();
    assert_eq!(
        err.into_inner(),
        StageError::Configuration(ConfigurationError::MissingContainer(
            ContainerKind::SpecialContent
        )),
    );
    assert!(f.journal.take().is_empty());
    assert_eq!(f.stage.active_container(), ContainerKind::Camera);
    assert_eq!(f.stage.current_participant(), Some(id("alice")));
}

#[test]
fn registry_misconfiguration_is_reported() {
    let f = Fixture::new(Journal::new());

    let duplicate = f
        .stage
        .register_container(
            ContainerKind::Placeholder,
            Rc::clone(&f.video) as _,
        )
        .unwrap_err();
    assert_eq!(
        duplicate.into_inner(),
        ConfigurationError::DuplicateContainer(ContainerKind::Placeholder),
    );

    let active = f.stage.remove_container(ContainerKind::Camera).unwrap_err();
    assert_eq!(
        active.into_inner(),
        ConfigurationError::ActiveContainerRemoval(ContainerKind::Camera),
    );
}

#[test]
fn resize_reaches_every_container() {
    let f = Fixture::new(Journal::new());

    f.stage.resize(Some(1280), Some(720)).unwrap();
    f.stage.resize(None, Some(600)).unwrap();

    assert_eq!(f.video.size.get(), (1280, 600));
    assert_eq!(f.placeholder.size.get(), (1280, 600));
    assert_eq!(f.special.size.get(), (1280, 600));
    assert_eq!(f.stage.snapshot().width, 1280);

    f.stage
        .remove_container(ContainerKind::SpecialContent)
        .unwrap();
    let late = FakeContainer::new("late", &f.journal);
    f.stage
        .register_container(
            ContainerKind::SpecialContent,
            Rc::clone(&late) as _,
        )
        .unwrap();
    assert_eq!(late.size.get(), (1280, 600));
}

#[test]
fn resolution_changes_are_published_once() {
    let mut f = Fixture::new(Journal::new());

    f.stage.on_video_resolution_update(1280, 720).unwrap();
    f.stage.on_video_resolution_update(1280, 720).unwrap();
    f.stage.on_video_resolution_update(640, 360).unwrap();

    assert_eq!(
        drain(&mut f.events),
        vec![
            StageEvent::ResolutionChanged {
                width: 1280,
                height: 720,
            },
            StageEvent::ResolutionChanged {
                width: 640,
                height: 360,
            },
        ],
    );
}

#[test]
fn hover_is_delegated_to_active_container() {
    let f = Fixture::new(Journal::new());

    f.stage.on_hover_in().unwrap();
    f.stage.on_hover_out().unwrap();

    assert_eq!(f.journal.take(), vec!["video:hover-in"]);
}

#[test]
fn dispose_makes_stage_inert() {
    let mut f = Fixture::new(Journal::gated());

    let pending = f.stage.update_large_video(
        id("alice"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    f.pool.run_until_stalled();
    assert_eq!(f.journal.waiting(), 1);

    f.stage.dispose();
    f.pool.run_until_stalled();

    let disposed = StageError::Configuration(ConfigurationError::Disposed);
    assert_eq!(
        pending.now_or_never().unwrap().unwrap_err().into_inner(),
        disposed,
    );
    assert_eq!(f.video.disposed.get(), 1);
    assert_eq!(f.placeholder.disposed.get(), 1);
    assert_eq!(f.special.disposed.get(), 1);
    assert_eq!(f.stage.transition_state(), TransitionState::Idle);

    let later = f.stage.update_large_video(
        id("bob"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );
    assert_eq!(
        later.now_or_never().unwrap().unwrap_err().into_inner(),
        disposed,
    );
    assert_eq!(
        f.stage.resize(Some(1), Some(1)).unwrap_err().into_inner(),
        ConfigurationError::Disposed,
    );
    assert!(f.stage.on_hover_in().is_err());
}

#[test]
fn when_idle_resolves_after_last_transition() {
    let mut f = Fixture::new(Journal::new());
    let _ = f.stage.update_large_video(
        id("alice"),
        feed(&Feed::camera()),
        ContainerKind::Camera,
    );

    let idle = f.stage.when_idle();
    f.pool.run_until(idle);

    assert_eq!(f.stage.transition_state(), TransitionState::Idle);
    assert_eq!(f.stage.current_participant(), Some(id("alice")));
}
