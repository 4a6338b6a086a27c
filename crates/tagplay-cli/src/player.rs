//! Playback surface backed by an external media player process.
//!
//! Mounting spawns the player for the rented stream; unmounting (or
//! dropping the surface) kills it. When the player exits on its own the
//! surface reports how it ended.

use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tagplay_core::PlaybackRequest;

/// Player errors.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Failed to launch player {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// How the player process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerExit {
    /// The viewer closed the player window.
    Closed,
    /// The player gave up on the stream.
    Failed(String),
}

/// External player command. Arguments follow mpv's option syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub program: String,
    /// Extra arguments placed before the stream URL.
    pub extra_args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "mpv".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl PlayerConfig {
    /// Command-line arguments for playing `request`.
    pub fn args_for(&self, request: &PlaybackRequest) -> Vec<String> {
        let mut args = vec![
            format!("--pause={}", yes_no(!request.autoplay)),
            format!("--mute={}", yes_no(request.muted)),
        ];
        if request.force_hls {
            args.push("--demuxer-lavf-format=hls".to_string());
        }
        args.push(format!("--cookies={}", yes_no(request.sends_credentials())));
        args.extend(self.extra_args.iter().cloned());
        args.push(request.stream_url.clone());
        args
    }
}

const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// A mounted playback surface.
#[derive(Debug)]
pub struct PlaybackSurface {
    cancel: CancellationToken,
}

impl PlaybackSurface {
    /// Spawn the player and watch it.
    ///
    /// If the process exits before the surface is unmounted, `on_exit` builds
    /// the message sent into `sink`. Unmounting sends nothing.
    pub fn mount<T, F>(
        config: &PlayerConfig,
        request: &PlaybackRequest,
        sink: mpsc::Sender<T>,
        on_exit: F,
    ) -> Result<Self, PlayerError>
    where
        T: Send + 'static,
        F: FnOnce(PlayerExit) -> T + Send + 'static,
    {
        let mut child = Command::new(&config.program)
            .args(config.args_for(request))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlayerError::Spawn {
                program: config.program.clone(),
                source,
            })?;
        info!(program = %config.program, pid = ?child.id(), "Player started");

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            let status = tokio::select! {
                biased;
                () = token.cancelled() => None,
                status = child.wait() => Some(status),
            };
            let Some(status) = status else {
                // Dropping the child kills it.
                debug!("Player unmounted");
                return;
            };
            let exit = match status {
                Ok(s) if s.success() => PlayerExit::Closed,
                Ok(s) => PlayerExit::Failed(format!("player exited with {s}")),
                Err(e) => PlayerExit::Failed(e.to_string()),
            };
            if let PlayerExit::Failed(reason) = &exit {
                warn!(%reason, "Player failed");
            }
            if sink.send(on_exit(exit)).await.is_err() {
                debug!("Receiver gone; dropping player exit");
            }
        });

        Ok(Self { cancel })
    }

    /// Kill the player. Equivalent to dropping the surface.
    pub fn unmount(self) {}
}

impl Drop for PlaybackSurface {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
