//! Rental backend client.
//!
//! Two JSON POST endpoints: registration (is this tag authorized, and is a
//! rental already running?) and start-rental. Uses reqwest with rustls.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, warn};

use tagplay_core::wire::{RegistrationResponse, RentalRequest, StartRentalResponse};

/// Backend client errors.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status}")]
    Status { status: u16 },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// The two calls the session controller makes.
pub trait RentalBackend: Send + Sync + 'static {
    fn register(
        &self,
        tag_id: &str,
    ) -> impl Future<Output = Result<RegistrationResponse, BackendError>> + Send;

    fn start_rental(
        &self,
        tag_id: &str,
    ) -> impl Future<Output = Result<StartRentalResponse, BackendError>> + Send;
}

/// Endpoint configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub register_url: String,
    pub start_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// HTTP implementation of [`RentalBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    register_url: Url,
    start_url: Url,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let register_url = parse_endpoint("registration", &config.register_url)?;
        let start_url = parse_endpoint("start-rental", &config.start_url)?;

        // reqwest is built with rustls-no-provider. `Err` only means a
        // provider was installed already.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            register_url,
            start_url,
        })
    }

    pub const fn register_url(&self) -> &Url {
        &self.register_url
    }

    pub const fn start_url(&self) -> &Url {
        &self.start_url
    }

    async fn post(&self, url: &Url, tag_id: &str) -> Result<reqwest::Response, BackendError> {
        debug!(%url, "POST");
        let resp = self
            .http
            .post(url.clone())
            .json(&RentalRequest::new(tag_id))
            .send()
            .await?;
        Ok(resp)
    }

    fn check_status(resp: &reqwest::Response) -> Result<(), BackendError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl RentalBackend for HttpBackend {
    async fn register(&self, tag_id: &str) -> Result<RegistrationResponse, BackendError> {
        let resp = self.post(&self.register_url, tag_id).await?;
        // A rejection may come with a 4xx status and a JSON message; the body
        // decides, not the status.
        let status = resp.status();
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            debug!(status = status.as_u16(), "Registration body did not decode");
            BackendError::Decode(e)
        })
    }

    async fn start_rental(&self, tag_id: &str) -> Result<StartRentalResponse, BackendError> {
        let resp = self.post(&self.start_url, tag_id).await?;
        Self::check_status(&resp)?;
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn parse_endpoint(name: &str, raw: &str) -> Result<Url, BackendError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| BackendError::Config(format!("{name} URL {raw:?}: {e}")))?;
    match url.scheme() {
        "https" => {}
        "http" => warn!(%url, "{name} endpoint is not using HTTPS"),
        other => {
            return Err(BackendError::Config(format!(
                "{name} URL must be http(s), got {other}"
            )));
        }
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(register: &str, start: &str) -> BackendConfig {
        BackendConfig {
            register_url: register.into(),
            start_url: start.into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn valid_config_creates_client() {
        let backend = HttpBackend::new(&config(
            "https://api.example/register",
            "https://api.example/start",
        ))
        .unwrap();
        assert_eq!(backend.register_url().as_str(), "https://api.example/register");
        assert_eq!(backend.start_url().as_str(), "https://api.example/start");
    }

    #[test]
    fn unparsable_url_is_config_error() {
        let err = HttpBackend::new(&config("not a url", "https://api.example/start")).unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let err =
            HttpBackend::new(&config("https://api.example/r", "ftp://api.example/s")).unwrap_err();
        assert!(matches!(err, BackendError::Config(ref m) if m.contains("ftp")));
    }

    #[test]
    fn plain_http_is_allowed() {
        assert!(HttpBackend::new(&config("http://127.0.0.1:9/r", "http://127.0.0.1:9/s")).is_ok());
    }

    #[test]
    fn status_error_reports_code() {
        let err = BackendError::Status { status: 503 };
        assert_eq!(err.to_string(), "Backend returned HTTP 503");
    }
}
