//! Headless (non-interactive) mode.
//!
//! Mounts a session, lets registration settle, optionally starts the rental,
//! and reports the screen the session ends up on.

use std::io::Write;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use tagplay_core::Screen;

use crate::backend::RentalBackend;
use crate::controller::{ControllerEvent, SessionController, UserAction};

/// Headless mode configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessConfig {
    /// Start a rental if the tag turns out to be idle.
    pub start: bool,
    /// Print the screen as JSON instead of a text line.
    pub json: bool,
    /// Upper bound on waiting for each backend call.
    pub settle_timeout: Duration,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            start: false,
            json: false,
            settle_timeout: Duration::from_secs(60),
        }
    }
}

/// Errors from headless mode.
#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error("Timed out after {0:?} waiting for the backend")]
    Timeout(Duration),

    #[error("Event channel closed")]
    ChannelClosed,

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode screen: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run headless mode and return the final screen.
pub async fn run<B: RentalBackend>(
    controller: &mut SessionController<B>,
    events: &mut mpsc::Receiver<ControllerEvent>,
    config: &HeadlessConfig,
) -> Result<Screen, HeadlessError> {
    controller.mount();
    settle(controller, events, config.settle_timeout).await?;

    if config.start && controller.screen() == Screen::Idle {
        info!("Tag is idle; starting rental");
        controller.dispatch(UserAction::StartRental);
        settle(controller, events, config.settle_timeout).await?;
    }

    Ok(controller.screen())
}

/// Feed events to the controller until no backend call is in flight.
async fn settle<B: RentalBackend>(
    controller: &mut SessionController<B>,
    events: &mut mpsc::Receiver<ControllerEvent>,
    timeout: Duration,
) -> Result<(), HeadlessError> {
    let deadline = tokio::time::Instant::now() + timeout;
    while controller.session().loading() {
        let event = tokio::time::timeout_at(deadline, events.recv())
            .await
            .map_err(|_| HeadlessError::Timeout(timeout))?
            .ok_or(HeadlessError::ChannelClosed)?;
        controller.handle_event(event);
    }
    Ok(())
}

/// Write `screen` to `out` as one line of text or JSON.
pub fn write_screen(out: &mut impl Write, screen: &Screen, json: bool) -> Result<(), HeadlessError> {
    if json {
        serde_json::to_writer(&mut *out, screen)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{screen}")?;
    }
    Ok(())
}
