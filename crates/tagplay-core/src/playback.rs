//! What the playback surface must do with the rented stream.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Credential mode for fetching stream segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOrigin {
    /// No cookies or credentials are sent with segment requests.
    #[default]
    Anonymous,
    UseCredentials,
}

/// A request to mount the playback surface for one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackRequest {
    pub stream_url: String,
    /// Start playing as soon as the surface is mounted.
    pub autoplay: bool,
    /// Start with audio muted so autoplay is permitted.
    pub muted: bool,
    /// Treat the stream as HLS whatever its extension says.
    pub force_hls: bool,
    pub cross_origin: CrossOrigin,
}

impl PlaybackRequest {
    /// Build a request with the required surface behaviour: autoplay,
    /// muted, forced adaptive streaming, anonymous cross-origin.
    pub fn new(stream_url: impl Into<String>) -> Result<Self> {
        let stream_url = stream_url.into().trim().to_string();
        if stream_url.is_empty() {
            return Err(Error::Config("stream URL is empty".into()));
        }
        Ok(Self {
            stream_url,
            autoplay: true,
            muted: true,
            force_hls: true,
            cross_origin: CrossOrigin::Anonymous,
        })
    }

    pub fn sends_credentials(&self) -> bool {
        self.cross_origin == CrossOrigin::UseCredentials
    }
}
