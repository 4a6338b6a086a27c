//! Session controller.
//!
//! Owns the [`Session`] for one page view and everything with a lifetime tied
//! to it: in-flight network calls, the countdown timer, and the playback
//! surface. All mutation happens on the caller's task through [`mount`],
//! [`dispatch`] and [`handle_event`]; network calls, ticks and player exits
//! come back as [`ControllerEvent`]s on the receiver returned by [`new`].
//!
//! [`mount`]: SessionController::mount
//! [`dispatch`]: SessionController::dispatch
//! [`handle_event`]: SessionController::handle_event
//! [`new`]: SessionController::new

mod events;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tagplay_core::{PlaybackRequest, Screen, Session, TickOutcome};

use crate::backend::RentalBackend;
use crate::countdown::Countdown;
use crate::player::{PlayerConfig, PlayerExit, PlaybackSurface};

pub use events::{ControllerEvent, UserAction};

const EVENT_BUFFER: usize = 32;

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Length of one simulated rental hour.
    pub tick_period: Duration,
    pub playback: PlaybackRequest,
    /// External player; `None` keeps playback inside the terminal panel.
    pub player: Option<PlayerConfig>,
    /// Wall clock in epoch milliseconds.
    pub clock: fn() -> i64,
}

/// Current wall clock in epoch milliseconds.
pub fn system_now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

pub struct SessionController<B: RentalBackend> {
    backend: Arc<B>,
    config: ControllerConfig,
    tag_id: Option<String>,
    session: Session,
    view: u64,
    countdown: Option<Countdown>,
    countdown_generation: u64,
    surface: Option<PlaybackSurface>,
    surface_generation: u64,
    events: mpsc::Sender<ControllerEvent>,
}

impl<B: RentalBackend> SessionController<B> {
    /// Create a controller and the receiver its events arrive on.
    pub fn new(
        backend: B,
        tag_id: Option<String>,
        config: ControllerConfig,
    ) -> (Self, mpsc::Receiver<ControllerEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let session = Session::new(tag_id.clone());
        let controller = Self {
            backend: Arc::new(backend),
            config,
            tag_id,
            session,
            view: 0,
            countdown: None,
            countdown_generation: 0,
            surface: None,
            surface_generation: 0,
            events: tx,
        };
        (controller, rx)
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub fn screen(&self) -> Screen {
        self.session.screen()
    }

    pub const fn playback(&self) -> &PlaybackRequest {
        &self.config.playback
    }

    pub fn countdown_running(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_running)
    }

    pub const fn surface_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Run the one-shot registration. Calling it again is harmless.
    pub fn mount(&mut self) {
        if let Some(tag) = self.session.begin_registration() {
            self.spawn_registration(tag);
        } else if self.session.tag_id().is_none() {
            info!("No tag in entry URL; waiting for authorization indefinitely");
        }
        self.reconcile();
    }

    pub fn dispatch(&mut self, action: UserAction) {
        debug!(?action, screen = self.session.screen().name(), "User action");
        match action {
            UserAction::StartRental => {
                if let Some(tag) = self.session.begin_start_rental() {
                    self.spawn_start_rental(tag);
                }
            }
            UserAction::Play => {
                self.session.play();
            }
            UserAction::CloseVideo => {
                self.session.close_video();
            }
            UserAction::RentAgain => {
                self.session.rent_again();
            }
            UserAction::Reload => {
                self.reload();
                return;
            }
        }
        self.reconcile();
    }

    pub fn handle_event(&mut self, event: ControllerEvent) {
        if event.view() != self.view {
            debug!(
                event_view = event.view(),
                view = self.view,
                "Discarding event from a previous view"
            );
            return;
        }

        match event {
            ControllerEvent::Registered { outcome, .. } => {
                self.session
                    .complete_registration(outcome, (self.config.clock)());
            }
            ControllerEvent::RentalStarted { outcome, .. } => {
                self.session.complete_start_rental(outcome);
            }
            ControllerEvent::Tick { generation, .. } => {
                if self.countdown.is_none() || generation != self.countdown_generation {
                    debug!(generation, "Discarding tick from a released countdown");
                    return;
                }
                if self.session.tick() == TickOutcome::Expired {
                    info!("Rental expired");
                }
            }
            ControllerEvent::PlayerExited {
                generation, exit, ..
            } => {
                if self.surface.is_none() || generation != self.surface_generation {
                    debug!(generation, "Discarding exit of an unmounted player");
                    return;
                }
                self.surface = None;
                match exit {
                    PlayerExit::Closed => {
                        self.session.close_video();
                    }
                    PlayerExit::Failed(_) => {
                        self.session.playback_failed();
                    }
                }
            }
        }
        self.reconcile();
    }

    /// Fresh page view: release everything, start over with a new session.
    fn reload(&mut self) {
        self.release_countdown();
        self.unmount_surface();
        self.view += 1;
        self.session = Session::new(self.tag_id.clone());
        info!(view = self.view, "Reloading session");
        self.mount();
    }

    /// Acquire or release the countdown and the playback surface so they
    /// match the session: the countdown runs iff the rental is active, the
    /// player runs iff the video is visible.
    fn reconcile(&mut self) {
        match (self.session.rental_active(), self.countdown.is_some()) {
            (true, false) => {
                self.countdown_generation += 1;
                let view = self.view;
                let generation = self.countdown_generation;
                self.countdown = Some(Countdown::start(
                    self.config.tick_period,
                    self.events.clone(),
                    move || ControllerEvent::Tick { view, generation },
                ));
            }
            (false, true) => self.release_countdown(),
            _ => {}
        }

        let Some(player) = &self.config.player else {
            return;
        };
        match (self.session.video_visible(), self.surface.is_some()) {
            (true, false) => {
                self.surface_generation += 1;
                let view = self.view;
                let generation = self.surface_generation;
                let mounted = PlaybackSurface::mount(
                    player,
                    &self.config.playback,
                    self.events.clone(),
                    move |exit| ControllerEvent::PlayerExited {
                        view,
                        generation,
                        exit,
                    },
                );
                match mounted {
                    Ok(surface) => self.surface = Some(surface),
                    Err(e) => {
                        warn!(error = %e, "Could not mount playback surface");
                        self.session.playback_failed();
                    }
                }
            }
            (false, true) => self.unmount_surface(),
            _ => {}
        }
    }

    fn release_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            debug!("Releasing countdown");
            countdown.stop();
        }
    }

    fn unmount_surface(&mut self) {
        if let Some(surface) = self.surface.take() {
            debug!("Unmounting playback surface");
            surface.unmount();
        }
    }

    fn spawn_registration(&self, tag: String) {
        let backend = Arc::clone(&self.backend);
        let tx = self.events.clone();
        let view = self.view;
        tokio::spawn(async move {
            let outcome = backend.register(&tag).await;
            if tx
                .send(ControllerEvent::Registered { view, outcome })
                .await
                .is_err()
            {
                debug!("Controller gone; dropping registration response");
            }
        });
    }

    fn spawn_start_rental(&self, tag: String) {
        let backend = Arc::clone(&self.backend);
        let tx = self.events.clone();
        let view = self.view;
        tokio::spawn(async move {
            let outcome = backend.start_rental(&tag).await;
            if tx
                .send(ControllerEvent::RentalStarted { view, outcome })
                .await
                .is_err()
            {
                debug!("Controller gone; dropping start-rental response");
            }
        });
    }
}
