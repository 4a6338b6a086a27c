#![allow(clippy::unwrap_used, clippy::cast_precision_loss)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use tagplay_core::wire::{RegistrationResponse, RentalWindow, StartRentalResponse};
use tagplay_core::{PlaybackRequest, Screen};

use super::*;
use crate::backend::BackendError;

const HOUR: Duration = Duration::from_secs(3600);
const NOW_MS: i64 = 1_760_000_000_000;
const HOUR_MS: i64 = 3_600_000;

fn fixed_clock() -> i64 {
    NOW_MS
}

#[derive(Clone, Default)]
struct Calls {
    register: Arc<AtomicUsize>,
    start: Arc<AtomicUsize>,
    tags: Arc<Mutex<Vec<String>>>,
}

impl Calls {
    fn register_count(&self) -> usize {
        self.register.load(Ordering::SeqCst)
    }

    fn start_count(&self) -> usize {
        self.start.load(Ordering::SeqCst)
    }
}

/// Scripted backend. `None` replies fail with HTTP 500.
struct FakeBackend {
    calls: Calls,
    registration: Option<RegistrationResponse>,
    start: Option<StartRentalResponse>,
    delay: Duration,
}

impl FakeBackend {
    fn new(registration: Option<RegistrationResponse>) -> Self {
        Self {
            calls: Calls::default(),
            registration,
            start: Some(StartRentalResponse {
                success: true,
                message: None,
                hours_remaining: Some(24.0),
            }),
            delay: Duration::ZERO,
        }
    }

    async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl RentalBackend for FakeBackend {
    async fn register(&self, tag_id: &str) -> Result<RegistrationResponse, BackendError> {
        self.calls.register.fetch_add(1, Ordering::SeqCst);
        self.calls.tags.lock().unwrap().push(tag_id.to_string());
        self.wait().await;
        self.registration
            .clone()
            .ok_or(BackendError::Status { status: 500 })
    }

    async fn start_rental(&self, tag_id: &str) -> Result<StartRentalResponse, BackendError> {
        self.calls.start.fetch_add(1, Ordering::SeqCst);
        self.calls.tags.lock().unwrap().push(tag_id.to_string());
        self.wait().await;
        self.start.clone().ok_or(BackendError::Status { status: 500 })
    }
}

fn authorized() -> RegistrationResponse {
    RegistrationResponse {
        success: true,
        message: None,
        data: None,
    }
}

fn authorized_with_window(hours_ago: i64) -> RegistrationResponse {
    RegistrationResponse {
        success: true,
        message: None,
        data: Some(RentalWindow {
            start_time: Some((NOW_MS - hours_ago * HOUR_MS) as f64),
            duration_hours: Some(24.0),
        }),
    }
}

fn config() -> ControllerConfig {
    ControllerConfig {
        tick_period: HOUR,
        playback: PlaybackRequest::new("https://cdn.test/feature.m3u8").unwrap(),
        player: None,
        clock: fixed_clock,
    }
}

fn controller(
    backend: FakeBackend,
    tag: Option<&str>,
) -> (
    SessionController<FakeBackend>,
    mpsc::Receiver<ControllerEvent>,
    Calls,
) {
    let calls = backend.calls.clone();
    let (ctrl, rx) = SessionController::new(backend, tag.map(str::to_string), config());
    (ctrl, rx, calls)
}

/// Deliver the next event to the controller.
async fn pump(ctrl: &mut SessionController<FakeBackend>, rx: &mut mpsc::Receiver<ControllerEvent>) {
    let event = rx.recv().await.unwrap();
    ctrl.handle_event(event);
}

#[tokio::test(start_paused = true)]
async fn missing_tag_never_calls_backend() {
    let (mut ctrl, _rx, calls) = controller(FakeBackend::new(Some(authorized())), None);
    ctrl.mount();
    tokio::time::sleep(HOUR * 2).await;

    assert_eq!(ctrl.screen(), Screen::Authorizing);
    assert_eq!(calls.register_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn mount_registers_once() {
    let (mut ctrl, mut rx, calls) =
        controller(FakeBackend::new(Some(authorized())), Some("TAG-1"));
    ctrl.mount();
    ctrl.mount();
    assert_eq!(ctrl.screen(), Screen::Loading);

    pump(&mut ctrl, &mut rx).await;
    ctrl.mount();

    assert_eq!(ctrl.screen(), Screen::Idle);
    assert_eq!(calls.register_count(), 1);
    assert_eq!(*calls.tags.lock().unwrap(), vec!["TAG-1".to_string()]);
    assert!(!ctrl.countdown_running());
}

#[tokio::test(start_paused = true)]
async fn registration_failure_shows_error() {
    let (mut ctrl, mut rx, _calls) = controller(FakeBackend::new(None), Some("TAG-1"));
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;

    assert!(matches!(ctrl.screen(), Screen::Error { .. }));
}

#[tokio::test(start_paused = true)]
async fn open_window_resumes_with_countdown() {
    let (mut ctrl, mut rx, _calls) =
        controller(FakeBackend::new(Some(authorized_with_window(23))), Some("TAG-1"));
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;

    assert_eq!(
        ctrl.screen(),
        Screen::Active {
            hours_remaining: 1,
            video_visible: false
        }
    );
    assert!(ctrl.countdown_running());

    pump(&mut ctrl, &mut rx).await;
    assert_eq!(ctrl.screen(), Screen::Ended);
    assert!(!ctrl.countdown_running());
}

#[tokio::test(start_paused = true)]
async fn start_rental_then_full_countdown() {
    let (mut ctrl, mut rx, calls) =
        controller(FakeBackend::new(Some(authorized())), Some("TAG-1"));
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;

    ctrl.dispatch(UserAction::StartRental);
    assert_eq!(ctrl.screen(), Screen::Loading);
    pump(&mut ctrl, &mut rx).await;
    assert_eq!(calls.start_count(), 1);
    assert_eq!(
        ctrl.screen(),
        Screen::Active {
            hours_remaining: 24,
            video_visible: false
        }
    );

    ctrl.dispatch(UserAction::Play);
    assert!(ctrl.screen().is_video_visible());

    for remaining in (1..24).rev() {
        pump(&mut ctrl, &mut rx).await;
        assert_eq!(
            ctrl.screen(),
            Screen::Active {
                hours_remaining: remaining,
                video_visible: true
            }
        );
    }
    pump(&mut ctrl, &mut rx).await;

    assert_eq!(ctrl.screen(), Screen::Ended);
    assert!(!ctrl.session().video_visible());
    assert!(!ctrl.countdown_running());
}

#[tokio::test(start_paused = true)]
async fn rent_again_makes_no_call() {
    let (mut ctrl, mut rx, calls) =
        controller(FakeBackend::new(Some(authorized_with_window(23))), Some("TAG-1"));
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;
    pump(&mut ctrl, &mut rx).await;
    assert_eq!(ctrl.screen(), Screen::Ended);

    ctrl.dispatch(UserAction::RentAgain);

    assert_eq!(ctrl.screen(), Screen::Idle);
    assert_eq!(ctrl.session().hours_remaining(), 24);
    assert_eq!(calls.register_count(), 1);
    assert_eq!(calls.start_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn start_without_tag_reports_error_without_call() {
    let (mut ctrl, _rx, calls) = controller(FakeBackend::new(Some(authorized())), None);
    ctrl.mount();
    ctrl.dispatch(UserAction::StartRental);

    assert_eq!(
        ctrl.screen(),
        Screen::Error {
            message: "No rental ID found".into()
        }
    );
    assert_eq!(calls.start_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn close_video_keeps_counting() {
    let (mut ctrl, mut rx, _calls) =
        controller(FakeBackend::new(Some(authorized_with_window(20))), Some("TAG-1"));
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;
    ctrl.dispatch(UserAction::Play);
    ctrl.dispatch(UserAction::CloseVideo);

    pump(&mut ctrl, &mut rx).await;
    assert_eq!(
        ctrl.screen(),
        Screen::Active {
            hours_remaining: 3,
            video_visible: false
        }
    );
}

#[tokio::test(start_paused = true)]
async fn reload_discards_stale_responses() {
    let mut backend = FakeBackend::new(Some(authorized_with_window(10)));
    backend.delay = Duration::from_secs(5);
    let (mut ctrl, mut rx, calls) = controller(backend, Some("TAG-1"));
    ctrl.mount();
    ctrl.dispatch(UserAction::Reload);

    ctrl.handle_event(ControllerEvent::Registered {
        view: 0,
        outcome: Ok(authorized_with_window(23)),
    });
    assert_eq!(ctrl.screen(), Screen::Loading);

    // One reply per view; only the current one lands.
    pump(&mut ctrl, &mut rx).await;
    pump(&mut ctrl, &mut rx).await;
    assert_eq!(calls.register_count(), 2);
    assert_eq!(
        ctrl.screen(),
        Screen::Active {
            hours_remaining: 14,
            video_visible: false
        }
    );
}

#[tokio::test(start_paused = true)]
async fn reload_releases_countdown() {
    let (mut ctrl, mut rx, _calls) =
        controller(FakeBackend::new(Some(authorized_with_window(10))), Some("TAG-1"));
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;
    assert!(ctrl.countdown_running());

    ctrl.dispatch(UserAction::Reload);
    assert!(!ctrl.countdown_running());
    assert_eq!(ctrl.screen(), Screen::Loading);
}

#[tokio::test(start_paused = true)]
async fn tick_from_released_countdown_is_ignored() {
    let (mut ctrl, mut rx, _calls) =
        controller(FakeBackend::new(Some(authorized_with_window(10))), Some("TAG-1"));
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;

    ctrl.handle_event(ControllerEvent::Tick {
        view: 0,
        generation: 999,
    });
    assert_eq!(ctrl.session().hours_remaining(), 14);
}

#[tokio::test(start_paused = true)]
async fn player_exit_without_surface_is_ignored() {
    let (mut ctrl, mut rx, _calls) =
        controller(FakeBackend::new(Some(authorized_with_window(10))), Some("TAG-1"));
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;
    ctrl.dispatch(UserAction::Play);

    ctrl.handle_event(ControllerEvent::PlayerExited {
        view: 0,
        generation: 1,
        exit: PlayerExit::Failed("boom".into()),
    });
    assert!(ctrl.screen().is_video_visible());
}

#[tokio::test(start_paused = true)]
async fn unlaunchable_player_reports_playback_error() {
    let backend = FakeBackend::new(Some(authorized_with_window(10)));
    let mut cfg = config();
    cfg.player = Some(PlayerConfig {
        program: "tagplay-test-no-such-player".into(),
        extra_args: Vec::new(),
    });
    let (mut ctrl, mut rx) = SessionController::new(backend, Some("TAG-1".into()), cfg);
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;

    ctrl.dispatch(UserAction::Play);

    assert_eq!(
        ctrl.screen(),
        Screen::Error {
            message: "Failed to play video. Please try again.".into()
        }
    );
    assert!(!ctrl.surface_mounted());
    assert!(ctrl.countdown_running());
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_mid_call_is_safe() {
    let mut backend = FakeBackend::new(Some(authorized()));
    backend.delay = Duration::from_secs(5);
    let (mut ctrl, rx, calls) = controller(backend, Some("TAG-1"));
    ctrl.mount();
    drop(ctrl);
    drop(rx);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(calls.register_count(), 1);
}

fn with_player(
    program: &str,
) -> (
    SessionController<FakeBackend>,
    mpsc::Receiver<ControllerEvent>,
) {
    let mut cfg = config();
    cfg.player = Some(PlayerConfig {
        program: program.into(),
        extra_args: Vec::new(),
    });
    SessionController::new(
        FakeBackend::new(Some(authorized_with_window(10))),
        Some("TAG-1".into()),
        cfg,
    )
}

// Real time: a paused clock would jump to the next countdown tick while the
// child process runs.
#[cfg(unix)]
#[tokio::test]
async fn failing_player_reports_playback_error() {
    let (mut ctrl, mut rx) = with_player("false");
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;

    ctrl.dispatch(UserAction::Play);
    assert!(ctrl.surface_mounted());
    pump(&mut ctrl, &mut rx).await;

    assert_eq!(
        ctrl.screen(),
        Screen::Error {
            message: "Failed to play video. Please try again.".into()
        }
    );
    assert!(!ctrl.surface_mounted());
    assert!(ctrl.countdown_running());
    assert_eq!(ctrl.session().hours_remaining(), 14);
}

#[cfg(unix)]
#[tokio::test]
async fn clean_player_exit_closes_video() {
    let (mut ctrl, mut rx) = with_player("true");
    ctrl.mount();
    pump(&mut ctrl, &mut rx).await;

    ctrl.dispatch(UserAction::Play);
    assert!(ctrl.surface_mounted());
    pump(&mut ctrl, &mut rx).await;

    assert_eq!(
        ctrl.screen(),
        Screen::Active {
            hours_remaining: 14,
            video_visible: false
        }
    );
    assert!(!ctrl.surface_mounted());
    assert!(ctrl.countdown_running());
}
