//! Countdown timer handle.
//!
//! A running [`Countdown`] owns a tokio task that delivers one tick message
//! per period. The task stops when the handle is stopped or dropped, so the
//! timer can never outlive the state that acquired it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to a running countdown task.
#[derive(Debug)]
pub struct Countdown {
    cancel: CancellationToken,
}

impl Countdown {
    /// Spawn the countdown task.
    ///
    /// The first tick fires one full `period` after the call. Each tick sends
    /// `make_tick()` into `sink`; the task exits on its own once the
    /// receiving side is gone.
    pub fn start<T, F>(period: Duration, sink: mpsc::Sender<T>, make_tick: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut timer = tokio::time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = timer.tick() => {}
                }
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    sent = sink.send(make_tick()) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Countdown task finished");
        });

        debug!(?period, "Countdown started");
        Self { cancel }
    }

    /// Stop delivering ticks. Equivalent to dropping the handle.
    pub fn stop(self) {}

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
