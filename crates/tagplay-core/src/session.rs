//! Rental session record and its transitions.
//!
//! A [`Session`] lives for one page view. It is created with every flag
//! cleared and is mutated only through the methods below. Each method is
//! total and synchronous; when it is called from a state that does not allow
//! it, it leaves the record untouched and reports that it was ignored.
//!
//! The methods never perform I/O. The `begin_*` methods return the tag to
//! send when a network call should be issued, and the matching `complete_*`
//! method applies its outcome.

use std::fmt::Display;

use tracing::{debug, info, warn};

use crate::screen::Screen;
use crate::wire::{RegistrationResponse, StartRentalResponse};

/// Length of a fresh rental window, and the fallback for missing durations.
pub const DEFAULT_RENTAL_HOURS: u32 = 24;

const MS_PER_HOUR: f64 = 3_600_000.0;

pub const MISSING_TAG_MESSAGE: &str = "No rental ID found";
pub const REGISTRATION_FAILED_MESSAGE: &str = "Failed to check rental status. Please try again.";
pub const REGISTRATION_REJECTED_MESSAGE: &str = "Rental registration was rejected.";
pub const START_FAILED_MESSAGE: &str = "Failed to start rental. Please try again.";
pub const PLAYBACK_FAILED_MESSAGE: &str = "Failed to play video. Please try again.";

/// Network call currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingCall {
    Registration,
    StartRental,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No active rental; nothing changed.
    Ignored,
    /// One hour was deducted and the window is still open.
    Counted { hours_remaining: u32 },
    /// The window closed on this tick.
    Expired,
}

/// In-memory rental session for one page view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    tag_id: Option<String>,
    authorized: bool,
    auth_checked: bool,
    rental_active: bool,
    rental_ended: bool,
    hours_remaining: u32,
    error: Option<String>,
    pending: Option<PendingCall>,
    video_visible: bool,
}

impl Session {
    /// Create the record for a page view. Blank tags count as absent.
    pub fn new(tag_id: Option<String>) -> Self {
        let tag_id = tag_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self {
            tag_id,
            authorized: false,
            auth_checked: false,
            rental_active: false,
            rental_ended: false,
            hours_remaining: DEFAULT_RENTAL_HOURS,
            error: None,
            pending: None,
            video_visible: false,
        }
    }

    pub fn tag_id(&self) -> Option<&str> {
        self.tag_id.as_deref()
    }

    pub const fn authorized(&self) -> bool {
        self.authorized
    }

    pub const fn auth_checked(&self) -> bool {
        self.auth_checked
    }

    pub const fn rental_active(&self) -> bool {
        self.rental_active
    }

    pub const fn rental_ended(&self) -> bool {
        self.rental_ended
    }

    pub const fn hours_remaining(&self) -> u32 {
        self.hours_remaining
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while a network call is in flight.
    pub const fn loading(&self) -> bool {
        self.pending.is_some()
    }

    pub const fn video_visible(&self) -> bool {
        self.video_visible
    }

    /// Derive the screen, in priority order Loading, Error, Authorizing,
    /// then the rental lifecycle.
    pub fn screen(&self) -> Screen {
        if self.loading() {
            Screen::Loading
        } else if let Some(message) = &self.error {
            Screen::Error {
                message: message.clone(),
            }
        } else if !self.authorized {
            Screen::Authorizing
        } else if self.rental_active {
            Screen::Active {
                hours_remaining: self.hours_remaining,
                video_visible: self.video_visible,
            }
        } else if self.rental_ended {
            Screen::Ended
        } else {
            Screen::Idle
        }
    }

    /// One-shot registration guard.
    ///
    /// Returns the tag to register when a tag is present, registration has
    /// never completed, the session is not yet authorized, and no
    /// registration is in flight. Safe to call on every render.
    pub fn begin_registration(&mut self) -> Option<String> {
        if self.auth_checked || self.authorized || self.pending.is_some() {
            return None;
        }
        let tag = self.tag_id.clone()?;
        self.pending = Some(PendingCall::Registration);
        info!(tag_id = %tag, "Checking rental registration");
        Some(tag)
    }

    /// Apply the outcome of the registration call.
    ///
    /// `now_ms` is the current wall clock in epoch milliseconds, used to place
    /// a previously started rental in its window.
    pub fn complete_registration<E: Display>(
        &mut self,
        outcome: Result<RegistrationResponse, E>,
        now_ms: i64,
    ) -> bool {
        if self.pending != Some(PendingCall::Registration) {
            warn!("Registration result arrived with no registration in flight; ignoring");
            return false;
        }
        self.pending = None;
        self.auth_checked = true;

        match outcome {
            Ok(resp) if resp.success => {
                self.authorized = true;
                let live = resp.data.as_ref().and_then(|window| {
                    window
                        .start_time
                        .and_then(|start| remaining_hours(start, window.duration_hours, now_ms))
                });
                if let Some(hours) = live {
                    info!(hours_remaining = hours, "Resuming active rental");
                    self.enter_active(hours);
                } else {
                    info!("Authorized with no open rental window");
                    self.rental_active = false;
                    self.rental_ended = false;
                }
            }
            Ok(resp) => {
                let message = resp
                    .message
                    .unwrap_or_else(|| REGISTRATION_REJECTED_MESSAGE.to_string());
                warn!(%message, "Registration rejected");
                self.error = Some(message);
            }
            Err(e) => {
                warn!(error = %e, "Registration call failed");
                self.error = Some(REGISTRATION_FAILED_MESSAGE.to_string());
            }
        }
        true
    }

    /// Start Rental action.
    ///
    /// A missing tag is reported immediately as an error and no call is
    /// requested. Otherwise the action is only honoured from Idle.
    pub fn begin_start_rental(&mut self) -> Option<String> {
        let Some(tag) = self.tag_id.clone() else {
            warn!("Start rental requested without a tag");
            self.error = Some(MISSING_TAG_MESSAGE.to_string());
            return None;
        };
        if self.screen() != Screen::Idle {
            warn!(screen = self.screen().name(), "Start rental ignored");
            return None;
        }
        self.pending = Some(PendingCall::StartRental);
        info!(tag_id = %tag, "Starting rental");
        Some(tag)
    }

    /// Apply the outcome of the start-rental call.
    pub fn complete_start_rental<E: Display>(
        &mut self,
        outcome: Result<StartRentalResponse, E>,
    ) -> bool {
        if self.pending != Some(PendingCall::StartRental) {
            warn!("Start-rental result arrived with no call in flight; ignoring");
            return false;
        }
        self.pending = None;

        match outcome {
            Ok(resp) if resp.success => {
                let hours = resp
                    .hours_remaining
                    .map_or(DEFAULT_RENTAL_HOURS, whole_hours);
                info!(hours_remaining = hours, "Rental started");
                self.enter_active(hours);
                self.error = None;
            }
            Ok(resp) => {
                let message = resp
                    .message
                    .unwrap_or_else(|| START_FAILED_MESSAGE.to_string());
                warn!(%message, "Start rental rejected");
                self.error = Some(message);
            }
            Err(e) => {
                warn!(error = %e, "Start-rental call failed");
                self.error = Some(START_FAILED_MESSAGE.to_string());
            }
        }
        true
    }

    /// Play action: mount the playback surface. Only valid while Active
    /// with the video not yet mounted.
    pub fn play(&mut self) -> bool {
        if !matches!(
            self.screen(),
            Screen::Active {
                video_visible: false,
                ..
            }
        ) {
            warn!(screen = self.screen().name(), "Play ignored");
            return false;
        }
        info!("Mounting playback surface");
        self.video_visible = true;
        true
    }

    /// Close-video action. The rental keeps counting down.
    pub fn close_video(&mut self) -> bool {
        if !self.video_visible {
            return false;
        }
        info!("Unmounting playback surface");
        self.video_visible = false;
        true
    }

    /// One simulated hour has passed.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.rental_active {
            return TickOutcome::Ignored;
        }
        self.hours_remaining = self.hours_remaining.saturating_sub(1);
        if self.hours_remaining == 0 {
            info!("Rental window elapsed; evicting playback");
            self.rental_active = false;
            self.video_visible = false;
            self.rental_ended = true;
            TickOutcome::Expired
        } else {
            debug!(hours_remaining = self.hours_remaining, "Countdown tick");
            TickOutcome::Counted {
                hours_remaining: self.hours_remaining,
            }
        }
    }

    /// Rent Again action: back to Idle with a fresh default window. Does not
    /// re-run registration.
    pub fn rent_again(&mut self) -> bool {
        if self.screen() != Screen::Ended {
            warn!(screen = self.screen().name(), "Rent again ignored");
            return false;
        }
        info!("Resetting for a new rental");
        self.rental_active = false;
        self.video_visible = false;
        self.rental_ended = false;
        self.hours_remaining = DEFAULT_RENTAL_HOURS;
        self.error = None;
        true
    }

    /// The playback surface reported a failure. The error replaces the
    /// surface; the rental window is left as it is.
    pub fn playback_failed(&mut self) -> bool {
        if !self.video_visible {
            return false;
        }
        warn!("Playback surface failed");
        self.video_visible = false;
        self.error = Some(PLAYBACK_FAILED_MESSAGE.to_string());
        true
    }

    const fn enter_active(&mut self, hours: u32) {
        self.rental_active = true;
        self.rental_ended = false;
        self.hours_remaining = hours;
    }
}

/// Whole hours left in a window that started at `start_time_ms` and lasts
/// `duration_hours` (24 when absent or not positive), or `None` once the
/// window has closed.
///
/// A start time in the future (clock skew between backend and client)
/// counts as zero elapsed, so a window never reports more than its
/// duration.
pub fn remaining_hours(start_time_ms: f64, duration_hours: Option<f64>, now_ms: i64) -> Option<u32> {
    let duration = duration_hours
        .filter(|d| *d > 0.0)
        .unwrap_or_else(|| f64::from(DEFAULT_RENTAL_HOURS));
    #[allow(clippy::cast_precision_loss)]
    let elapsed = ((now_ms as f64 - start_time_ms) / MS_PER_HOUR).max(0.0);
    (elapsed < duration).then(|| whole_hours(duration - elapsed))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_hours(hours: f64) -> u32 {
    if hours.is_nan() {
        return 0;
    }
    hours.floor().clamp(0.0, f64::from(u32::MAX)) as u32
}
