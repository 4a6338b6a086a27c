//! Two-thread TUI orchestration.
//!
//! Terminal I/O runs on a dedicated OS thread; the session controller and
//! everything it spawns stay on the tokio runtime. Communication via
//! `tokio::sync::mpsc` channels.

mod input;

pub use input::{KeyOutcome, action_for_key};

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::RentalBackend;
use crate::controller::{ControllerEvent, SessionController};
use crate::ui::{self, View};

/// Terminal events forwarded from the UI reader thread.
pub enum TermEvent {
    Key(crossterm::event::KeyEvent),
    Resize(u16, u16),
}

/// Run the interactive TUI until the viewer quits.
///
/// Mounts the session, enters raw mode, spawns a dedicated terminal reader
/// thread, and runs the main `select!` loop. Dropping the controller on the
/// way out stops the countdown and kills the player.
pub async fn run<B: RentalBackend>(
    mut controller: SessionController<B>,
    mut events: mpsc::Receiver<ControllerEvent>,
    player_name: Option<String>,
) -> io::Result<()> {
    // 1. Registration starts before raw mode so its request is already in
    //    flight when the first frame draws.
    controller.mount();

    // 2. Enter raw mode, create terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 3. Channels + cancellation token
    let cancel = CancellationToken::new();
    let (term_tx, mut term_rx) = mpsc::channel::<TermEvent>(64);

    // 4. Spawn dedicated OS thread for crossterm::event::read()
    let cancel_clone = cancel.clone();
    let ui_thread = std::thread::spawn(move || {
        while !cancel_clone.is_cancelled() {
            // Poll with 50ms timeout so we can check cancellation
            if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                let forwarded = match event::read() {
                    // Windows emits Press + Release per keystroke
                    Ok(Event::Key(key))
                        if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                    {
                        term_tx.blocking_send(TermEvent::Key(key))
                    }
                    Ok(Event::Resize(w, h)) => term_tx.blocking_send(TermEvent::Resize(w, h)),
                    _ => Ok(()),
                };
                if forwarded.is_err() {
                    break;
                }
            }
        }
    });

    let result = run_loop(
        &mut terminal,
        &mut controller,
        &mut events,
        &mut term_rx,
        player_name.as_deref(),
    )
    .await;

    // 5. Shutdown: stop the reader thread, release session resources
    cancel.cancel();
    let _ = ui_thread.join(); // fast: <50ms due to poll timeout
    drop(controller);

    // 6. Restore terminal
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    result
}

async fn run_loop<B: RentalBackend>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut SessionController<B>,
    events: &mut mpsc::Receiver<ControllerEvent>,
    term_rx: &mut mpsc::Receiver<TermEvent>,
    player_name: Option<&str>,
) -> io::Result<()> {
    let mut redraw = tokio::time::interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            _ = redraw.tick() => {
                let screen = controller.screen();
                let view = View {
                    screen: &screen,
                    tag_id: controller.session().tag_id(),
                    stream_url: &controller.playback().stream_url,
                    player: player_name,
                };
                terminal.draw(|f| ui::draw(f, &view))?;
            }
            Some(term_event) = term_rx.recv() => {
                match term_event {
                    TermEvent::Key(key) => match action_for_key(&controller.screen(), key) {
                        KeyOutcome::Action(action) => controller.dispatch(action),
                        KeyOutcome::Quit => {
                            info!("Quit requested");
                            return Ok(());
                        }
                        KeyOutcome::Ignored => {}
                    },
                    TermEvent::Resize(w, h) => debug!(w, h, "Terminal resized"),
                }
            }
            Some(event) = events.recv() => controller.handle_event(event),
        }
    }
}
