//! tagplay CLI
//!
//! Terminal player for NFC-tag video rentals.
//! Provides both TUI (ratatui) and headless modes.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use tagplay_cli::backend::HttpBackend;
use tagplay_cli::config::ClientArgs;
use tagplay_cli::controller::SessionController;
use tagplay_cli::{headless, tui};
use tagplay_core::Screen;
use tagplay_core::tracing_init::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = ClientArgs::parse().into_config()?;

    // The TUI owns the terminal, so only warnings reach stderr there.
    let default_filter = if config.headless.is_some() {
        "tagplay=info"
    } else {
        "tagplay=warn"
    };
    init_tracing(default_filter, config.log_format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        tag_id = ?config.tag_id,
        "Starting tagplay"
    );

    let backend = HttpBackend::new(&config.backend)?;
    info!(
        register_url = %backend.register_url(),
        start_url = %backend.start_url(),
        "Rental backend configured"
    );
    let player_name = config.controller.player.as_ref().map(|p| p.program.clone());
    let (mut controller, mut events) =
        SessionController::new(backend, config.tag_id, config.controller);

    if let Some(headless_config) = config.headless {
        let screen = headless::run(&mut controller, &mut events, &headless_config).await?;
        headless::write_screen(&mut io::stdout().lock(), &screen, headless_config.json)?;
        return Ok(if matches!(screen, Screen::Error { .. }) {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    tui::run(controller, events, player_name).await?;
    Ok(ExitCode::SUCCESS)
}
