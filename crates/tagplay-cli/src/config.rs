//! Command-line configuration.
//!
//! Every option can also come from a `TAGPLAY_*` environment variable.
//! Nothing is read from or written to disk.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use tagplay_core::PlaybackRequest;
use tagplay_core::tracing_init::LogFormat;

use crate::backend::BackendConfig;
use crate::controller::{ControllerConfig, system_now_ms};
use crate::entry::{DEFAULT_TAG_PARAM, tag_from_entry};
use crate::headless::HeadlessConfig;
use crate::player::PlayerConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Core(#[from] tagplay_core::Error),
}

#[derive(Parser, Debug, Clone)]
#[command(name = "tagplay")]
#[command(version, about = "Play NFC-tag video rentals in the terminal", long_about = None)]
pub struct ClientArgs {
    /// Entry URL scanned from the tag, e.g. "https://play.example/?nfctagid=ABC"
    #[arg(env = "TAGPLAY_ENTRY_URL", conflicts_with = "tag_id")]
    pub entry: Option<String>,

    /// Tag id, bypassing the entry URL
    #[arg(long, env = "TAGPLAY_TAG_ID")]
    pub tag_id: Option<String>,

    /// Query parameter carrying the tag id
    #[arg(long, env = "TAGPLAY_TAG_PARAM", default_value = DEFAULT_TAG_PARAM)]
    pub tag_param: String,

    /// Registration endpoint
    #[arg(long, env = "TAGPLAY_REGISTER_URL")]
    pub register_url: String,

    /// Start-rental endpoint
    #[arg(long, env = "TAGPLAY_START_URL")]
    pub start_url: String,

    /// HLS stream of the rented title
    #[arg(long, env = "TAGPLAY_STREAM_URL")]
    pub stream_url: String,

    /// Seconds per rental hour (lower it for demos)
    #[arg(long, env = "TAGPLAY_HOUR_SECS", default_value_t = 3600)]
    pub hour_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "TAGPLAY_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// External media player
    #[arg(long, env = "TAGPLAY_PLAYER", default_value = "mpv")]
    pub player: String,

    /// Extra player argument (repeatable)
    #[arg(long = "player-arg", allow_hyphen_values = true)]
    pub player_args: Vec<String>,

    /// Keep playback inside the terminal panel
    #[arg(long, env = "TAGPLAY_NO_PLAYER", conflicts_with = "player_args")]
    pub no_player: bool,

    /// Run without the terminal UI and print the final screen
    #[arg(long)]
    pub headless: bool,

    /// Headless only: start a rental when the tag is idle
    #[arg(long, requires = "headless")]
    pub start: bool,

    /// Headless only: print the screen as JSON
    #[arg(long, requires = "headless")]
    pub json: bool,

    /// Emit logs as JSON
    #[arg(long, env = "TAGPLAY_LOG_JSON")]
    pub log_json: bool,
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub tag_id: Option<String>,
    pub backend: BackendConfig,
    pub controller: ControllerConfig,
    /// `Some` when running headless.
    pub headless: Option<HeadlessConfig>,
    pub log_format: LogFormat,
}

impl ClientArgs {
    pub fn into_config(self) -> Result<ClientConfig, ConfigError> {
        if self.hour_secs == 0 {
            return Err(ConfigError::Invalid("--hour-secs must be positive".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "--timeout-secs must be positive".into(),
            ));
        }
        if self.tag_param.trim().is_empty() {
            return Err(ConfigError::Invalid("--tag-param must not be empty".into()));
        }

        let tag_id = match (&self.tag_id, &self.entry) {
            (Some(tag), _) => Some(tag.trim().to_string()).filter(|t| !t.is_empty()),
            (None, Some(entry)) => tag_from_entry(entry, self.tag_param.trim()),
            (None, None) => None,
        };

        let player = if self.no_player || self.player.trim().is_empty() {
            None
        } else {
            Some(PlayerConfig {
                program: self.player.trim().to_string(),
                extra_args: self.player_args,
            })
        };

        let headless = self.headless.then_some(HeadlessConfig {
            start: self.start,
            json: self.json,
            ..HeadlessConfig::default()
        });

        Ok(ClientConfig {
            tag_id,
            backend: BackendConfig {
                register_url: self.register_url,
                start_url: self.start_url,
                timeout: Duration::from_secs(self.timeout_secs),
            },
            controller: ControllerConfig {
                tick_period: Duration::from_secs(self.hour_secs),
                playback: PlaybackRequest::new(self.stream_url)?,
                player,
                clock: system_now_ms,
            },
            headless,
            log_format: if self.log_json {
                LogFormat::Json
            } else {
                LogFormat::Human
            },
        })
    }
}
